//! Firefox process launching and profile management.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Driver`] | Spawns Firefox and opens a BiDi session |
//! | [`DriverBuilder`] | Fluent configuration builder |
//! | [`FirefoxOptions`] | Browser launch options |
//! | [`Profile`] | Persistent profile directory |

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder pattern for driver configuration.
pub mod builder;

/// Core driver implementation.
pub mod core;

/// Firefox command-line options.
pub mod options;

/// Firefox profile management.
pub mod profile;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::DriverBuilder;
pub use self::core::Driver;
pub use options::FirefoxOptions;
pub use profile::{Profile, UserPrefs};

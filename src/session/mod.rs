//! Session persistence and verification.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`SessionStore`] | Record, metadata and profile files |
//! | [`SessionRecord`] | Saved cookie table |
//! | [`AuthVerifier`] | Decides whether a record is usable |
//! | [`AuthMetadata`] | Informational side record |
//! | [`ProfileLock`] | Exclusive profile lock |
//! | [`BrowserSession`] | Firefox on the locked profile |
//! | [`LoginAssistant`] | Human-in-the-loop sign-in |

// ============================================================================
// Submodules
// ============================================================================

/// Session verification rules.
pub mod auth;

/// Running browser bound to the profile.
pub mod browser_session;

/// Exclusive profile lock.
pub mod lock;

/// Interactive sign-in.
pub mod login;

/// Authentication metadata side file.
pub mod metadata;

/// Cookie table model.
pub mod record;

/// File-backed storage.
pub mod store;

// ============================================================================
// Re-exports
// ============================================================================

pub use auth::{AuthReason, AuthVerdict, AuthVerifier, IDENTITY_COOKIES};
pub use browser_session::BrowserSession;
pub use lock::ProfileLock;
pub use login::{LoginAssistant, LoginOutcome};
pub use metadata::AuthMetadata;
pub use record::{SameSite, SessionCookie, SessionRecord};
pub use store::{ClearReport, SessionStore};

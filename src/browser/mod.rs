//! Browser entities module.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Window`] | Firefox process + BiDi connection |
//! | [`Tab`] | Top-level browsing context |
//! | [`Element`] | DOM node reference |
//!
//! # Example
//!
//! ```no_run
//! use gemini_image_driver::driver::{Driver, FirefoxOptions, Profile};
//!
//! # async fn example() -> gemini_image_driver::Result<()> {
//! let driver = Driver::builder().build()?;
//! let window = driver
//!     .launch(Profile::from_path("./browser_profile")?, &FirefoxOptions::new())
//!     .await?;
//! let tab = window.tab();
//!
//! tab.goto("https://gemini.google.com/app").await?;
//! let editors = tab.query_all("div[contenteditable=\"true\"]", None).await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// DOM element interaction.
pub mod element;

/// Browser tab automation.
pub mod tab;

/// Browser window management.
pub mod window;

// ============================================================================
// Re-exports
// ============================================================================

pub use element::{BoundingBox, Element};
pub use tab::Tab;
pub use window::Window;

pub(crate) use window::ProcessGuard;

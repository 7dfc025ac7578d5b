//! Browser tab automation.
//!
//! A [`Tab`] wraps one top-level browsing context of a [`crate::browser::Window`].
//!
//! # Module Structure
//!
//! | Module | Description |
//! |--------|-------------|
//! | `core` | Tab struct and command dispatch |
//! | `navigation` | URL navigation, current URL |
//! | `script` | JavaScript evaluation |
//! | `elements` | Element search, page text |
//! | `storage` | Cookies |
//! | `screenshot` | Element screenshots |
//! | `input` | Key presses |
//! | `fetch` | In-page downloads |
//!
//! # Example
//!
//! ```ignore
//! let tab = window.tab();
//!
//! tab.goto("https://gemini.google.com/app").await?;
//! let inputs = tab.query_all("div[contenteditable=\"true\"]", None).await?;
//! let cookies = tab.get_all_cookies().await?;
//! ```

// ============================================================================
// Submodules
// ============================================================================

mod core;
mod elements;
mod fetch;
mod input;
mod navigation;
mod screenshot;
mod script;
mod storage;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::Tab;

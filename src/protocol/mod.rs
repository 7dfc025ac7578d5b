//! WebDriver BiDi message types.
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Request` | Local → Remote | Command request |
//! | `Response` | Remote → Local | Command response (`success` / `error`) |
//! | `Event` | Remote → Local | Browser notification |
//!
//! Commands follow the `module.methodName` naming of the BiDi spec
//! (`browsingContext.navigate`, `script.callFunction`, ...).
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `command` | Command definitions by module |
//! | `event` | Event messages |
//! | `remote` | `RemoteValue` / `LocalValue` conversions |
//! | `request` | Request and Response types |

// ============================================================================
// Submodules
// ============================================================================

/// Command definitions organized by module.
pub mod command;

/// Event message types.
pub mod event;

/// Script value conversions.
pub mod remote;

/// Request and Response message types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use command::{
    BrowserCommand, BrowsingContextCommand, BytesValue, ClipRectangle, Command, Cookie,
    InputCommand, KEY_ENTER, PartialCookie, ReadinessState, ScreenshotOrigin, ScriptCommand,
    SessionCommand, SharedReference, StorageCommand, Target,
};
pub use event::Event;
pub use request::{Request, Response, ResponseType};

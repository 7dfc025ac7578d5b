//! Gemini image generation through a real Firefox session.
//!
//! The service has no public image API, so this crate drives its web UI:
//! a persistent, human-authenticated Firefox profile is launched over
//! WebDriver BiDi, the prompt is typed into the chat composer, and the
//! generated image is pulled out of the page.
//!
//! # Architecture
//!
//! ```text
//! GenerationOrchestrator
//!   ├── SessionStore / AuthVerifier     saved cookies, usable or not
//!   ├── BrowserSession                  locked profile + Firefox + cookie restore
//!   │     └── Window / Tab / Element    BiDi over a WebSocket
//!   ├── ElementResolver                 ordered selector candidates per target
//!   └── ArtifactExtractor               data URL → in-page fetch → screenshot
//! ```
//!
//! The resolver, the state machine and the extractor only see the
//! [`page::Page`] trait, so they run the same against a live tab and the
//! test fake.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use gemini_image_driver::Config;
//! use gemini_image_driver::generation::{
//!     GenerationOrchestrator, GenerationRequest, GenerationResult,
//! };
//!
//! # async fn example() -> gemini_image_driver::Result<()> {
//! let config = Config::builder().from_env().build()?;
//! let request = GenerationRequest::new("a red fox in the snow", Duration::from_secs(180), false)?;
//!
//! match GenerationOrchestrator::new(config).run(&request).await {
//!     GenerationResult::Success(artifact) => {
//!         std::fs::write(format!("fox.{}", artifact.extension()), artifact.bytes())?;
//!     }
//!     GenerationResult::Failure(failure) => eprintln!("{failure}"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`generation`] | Request, state machine, result |
//! | [`session`] | Session record, verifier, store, lock, browser session, sign-in |
//! | [`resolver`] | Logical targets and their candidate chains |
//! | [`artifact`] | Three-tier image extraction |
//! | [`page`] | `Page` / `PageElement` traits |
//! | [`browser`] | [`Window`], [`Tab`], [`Element`] |
//! | [`driver`] | Firefox launch, options, profile |
//! | [`config`] | [`Config`] and its builder |
//! | [`templating`] | Prompt composition from a reference image |
//! | [`envelope`] | JSON result envelope |
//! | [`error`] | [`enum@Error`] and [`Result`] |
//! | [`protocol`] | BiDi message types (internal) |
//! | [`transport`] | WebSocket connection (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Image extraction from the resolved output element.
pub mod artifact;

/// Browser entities: Window, Tab, Element.
pub mod browser;

/// Paths, URLs and timings.
pub mod config;

/// Firefox launch and profile management.
pub mod driver;

/// Outbound JSON result.
pub mod envelope;

/// Error types and result aliases.
pub mod error;

/// Generation request, state machine and result.
pub mod generation;

/// Type-safe identifiers for protocol entities.
pub mod identifiers;

/// Page abstraction the engine is written against.
pub mod page;

/// WebDriver BiDi message types.
///
/// Internal module defining command/response/event structures.
pub mod protocol;

/// UI element resolution with fallback candidates.
pub mod resolver;

/// Session persistence, verification and browser sessions.
pub mod session;

/// Prompt templating.
pub mod templating;

/// WebSocket transport layer.
///
/// Internal module handling the BiDi connection.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Browser types
pub use browser::{Element, Tab, Window};

// Configuration
pub use config::{Config, ConfigBuilder};

// Driver types
pub use driver::{Driver, DriverBuilder, FirefoxOptions, Profile};

// Error types
pub use error::{Error, Result};

// Generation
pub use generation::{FailureKind, GenerationOrchestrator, GenerationRequest, GenerationResult};

// Identifier types
pub use identifiers::{ContextId, ElementId, RequestId, SessionId};

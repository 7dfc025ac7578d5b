//! Image generation.
//!
//! | Type | Role |
//! |------|------|
//! | [`GenerationRequest`] | Validated input |
//! | [`GenerationOrchestrator`] | Session checks, browser lifecycle, state machine |
//! | [`GenerationState`] | Steps of one run |
//! | [`GenerationResult`] | `Success(Artifact)` or `Failure { kind, message }` |

mod orchestrator;
mod refusal;
mod request;
mod state;

pub use orchestrator::{GenerationOrchestrator, IMAGE_DIRECTIVE, drive};
pub use refusal::{REFUSAL_PHRASES, RESPONSE_CONTAINERS, find_refusal};
pub use request::{FailureKind, GenerationFailure, GenerationRequest, GenerationResult};
pub use state::GenerationState;

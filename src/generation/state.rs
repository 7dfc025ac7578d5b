//! Generation states.

use std::fmt;

use crate::artifact::Artifact;
use crate::resolver::ResolvedElement;

use super::request::GenerationFailure;

/// One step of a generation run.
///
/// `Done` and `Failed` are terminal; every other state has exactly one
/// transition, performed by the orchestrator.
pub enum GenerationState<E> {
    /// Nothing done yet.
    Start,
    /// Load the application and make sure a fresh chat is open.
    NavigateHome,
    /// Bail out if the page landed on sign-in.
    CheckAuth,
    /// Switch the composer to image generation.
    ActivateImageMode,
    /// Find the composer. `prompt` is the text that will be submitted.
    LocateInput {
        /// Final prompt text.
        prompt: String,
    },
    /// Type and send the prompt.
    SubmitPrompt {
        /// Final prompt text.
        prompt: String,
        /// The composer.
        input: ResolvedElement<E>,
    },
    /// Wait for an image or a refusal.
    Poll {
        /// Text that was submitted, removed before refusal matching.
        submitted: String,
    },
    /// The output image appeared.
    ImageFound(ResolvedElement<E>),
    /// Pull the bytes out of the image.
    Extract(ResolvedElement<E>),
    /// Finished with an image.
    Done(Artifact),
    /// Finished without one.
    Failed(GenerationFailure),
}

impl<E> GenerationState<E> {
    /// Short name for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::NavigateHome => "navigate_home",
            Self::CheckAuth => "check_auth",
            Self::ActivateImageMode => "activate_image_mode",
            Self::LocateInput { .. } => "locate_input",
            Self::SubmitPrompt { .. } => "submit_prompt",
            Self::Poll { .. } => "poll",
            Self::ImageFound(_) => "image_found",
            Self::Extract(_) => "extract",
            Self::Done(_) => "done",
            Self::Failed(_) => "failed",
        }
    }

    /// Whether no further transition exists.
    #[inline]
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done(_) | Self::Failed(_))
    }
}

impl<E> fmt::Debug for GenerationState<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed(failure) => f.debug_tuple("Failed").field(failure).finish(),
            Self::Done(artifact) => f.debug_tuple("Done").field(artifact).finish(),
            other => f.write_str(other.name()),
        }
    }
}

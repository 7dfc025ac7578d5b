//! Outbound result envelope.
//!
//! One JSON object per run, printed on stdout:
//!
//! ```json
//! {"success": true, "path": "/out/3f2a9c1b7d4e.png", "filename": "3f2a9c1b7d4e.png",
//!  "prompt": "a red fox", "tier": "remote_fetch", "format": "png"}
//!
//! {"success": false, "error": "Not signed in ...", "kind": "unauthenticated",
//!  "auth_required": true}
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::artifact::{Artifact, ExtractionTier};
use crate::generation::{FailureKind, GenerationFailure};

/// Result printed for the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Envelope {
    /// Image written.
    Success {
        /// Always `true`.
        success: bool,
        /// Where the image was written.
        path: PathBuf,
        /// File name of `path`.
        filename: String,
        /// Prompt that was submitted.
        prompt: String,
        /// How the bytes were obtained.
        tier: ExtractionTier,
        /// File extension of the sniffed format.
        format: &'static str,
    },
    /// No image.
    Failure {
        /// Always `false`.
        success: bool,
        /// Human readable explanation.
        error: String,
        /// Failure category, absent for usage errors.
        #[serde(skip_serializing_if = "Option::is_none")]
        kind: Option<FailureKind>,
        /// Whether `auth setup` is the fix.
        auth_required: bool,
    },
}

impl Envelope {
    /// Envelope for an image written to `path`.
    #[must_use]
    pub fn success(path: &Path, prompt: &str, artifact: &Artifact) -> Self {
        Self::Success {
            success: true,
            path: path.to_path_buf(),
            filename: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default(),
            prompt: prompt.to_string(),
            tier: artifact.tier(),
            format: artifact.extension(),
        }
    }

    /// Envelope for a generation failure.
    #[must_use]
    pub fn failure(failure: &GenerationFailure) -> Self {
        Self::Failure {
            success: false,
            error: failure.message.clone(),
            kind: Some(failure.kind),
            auth_required: failure.kind.is_auth_required(),
        }
    }

    /// Envelope for an error outside generation, such as bad arguments or an
    /// unwritable output file.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self::Failure {
            success: false,
            error: message.into(),
            kind: None,
            auth_required: false,
        }
    }

    /// Whether this reports success.
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Process exit code: 0 on success, 1 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.is_success() { 0 } else { 1 }
    }
}

//! Logical targets and their candidate chains.
//!
//! Each chain runs from the most UI-version-specific matcher to the most
//! generic one. A markup change usually breaks the head of a chain and
//! leaves its tail working.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::browser::BoundingBox;
use crate::page::Matcher;

// ============================================================================
// Constants
// ============================================================================

/// Controls narrower than this are ghost nodes.
pub const MIN_CONTROL_WIDTH: f64 = 50.0;

/// Generated images are larger than this in both dimensions.
pub const MIN_ARTIFACT_SIZE: f64 = 200.0;

/// Host marker every generated image `src` carries.
pub const ARTIFACT_HOST_MARKER: &str = "googleusercontent";

// ============================================================================
// LogicalTarget
// ============================================================================

/// A UI role, independent of the markup that currently implements it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalTarget {
    /// Chip that switches the conversation into image generation.
    ImageModeSwitch,
    /// Prompt editor.
    PromptInput,
    /// Send button.
    SendControl,
    /// The generated image.
    GeneratedImage,
    /// Signed-in account badge.
    AccountIdentity,
}

impl LogicalTarget {
    /// Ordered candidates for this target.
    #[must_use]
    pub fn candidates(self) -> &'static [Candidate] {
        match self {
            Self::ImageModeSwitch => IMAGE_MODE_SWITCH,
            Self::PromptInput => PROMPT_INPUT,
            Self::SendControl => SEND_CONTROL,
            Self::GeneratedImage => GENERATED_IMAGE,
            Self::AccountIdentity => ACCOUNT_IDENTITY,
        }
    }
}

impl fmt::Display for LogicalTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ImageModeSwitch => "image mode switch",
            Self::PromptInput => "prompt input",
            Self::SendControl => "send control",
            Self::GeneratedImage => "generated image",
            Self::AccountIdentity => "account identity",
        })
    }
}

// ============================================================================
// Acceptance
// ============================================================================

/// What a visible match must additionally satisfy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Acceptance {
    /// Visible is enough.
    Visible,
    /// Clickable control: box wider than `min_width`.
    Interactive {
        /// Exclusive lower bound on width.
        min_width: f64,
    },
    /// Output image: large box and a `src` from the expected host.
    Artifact {
        /// Exclusive lower bound on width.
        min_width: f64,
        /// Exclusive lower bound on height.
        min_height: f64,
        /// Substring the `src` must contain.
        src_marker: &'static str,
    },
}

impl Acceptance {
    /// Rule for interactive controls.
    pub const INTERACTIVE: Self = Self::Interactive {
        min_width: MIN_CONTROL_WIDTH,
    };

    /// Rule for the generated image.
    pub const ARTIFACT: Self = Self::Artifact {
        min_width: MIN_ARTIFACT_SIZE,
        min_height: MIN_ARTIFACT_SIZE,
        src_marker: ARTIFACT_HOST_MARKER,
    };

    /// Whether the rule needs the layout box.
    #[inline]
    #[must_use]
    pub fn needs_box(&self) -> bool {
        !matches!(self, Self::Visible)
    }

    /// Whether the rule needs the `src` attribute.
    #[inline]
    #[must_use]
    pub fn needs_src(&self) -> bool {
        matches!(self, Self::Artifact { .. })
    }

    /// Geometry part of the rule.
    #[must_use]
    pub fn fits_box(&self, bbox: Option<&BoundingBox>) -> bool {
        match self {
            Self::Visible => true,
            Self::Interactive { min_width } => bbox.is_some_and(|b| b.width > *min_width),
            Self::Artifact {
                min_width,
                min_height,
                ..
            } => bbox.is_some_and(|b| b.width > *min_width && b.height > *min_height),
        }
    }

    /// Source part of the rule.
    #[must_use]
    pub fn fits_src(&self, src: Option<&str>) -> bool {
        match self {
            Self::Artifact { src_marker, .. } => src.is_some_and(|s| s.contains(src_marker)),
            _ => true,
        }
    }

    /// The whole rule over already-known properties.
    #[must_use]
    pub fn admits(&self, visible: bool, bbox: Option<&BoundingBox>, src: Option<&str>) -> bool {
        visible && self.fits_box(bbox) && self.fits_src(src)
    }
}

// ============================================================================
// Candidate
// ============================================================================

/// One matcher plus the rule its matches must pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// How to find nodes.
    pub matcher: Matcher,
    /// What a node must satisfy.
    pub rule: Acceptance,
}

impl Candidate {
    const fn css(css: &'static str, rule: Acceptance) -> Self {
        Self {
            matcher: Matcher::Css(css),
            rule,
        }
    }

    const fn text(css: &'static str, text: &'static str, rule: Acceptance) -> Self {
        Self {
            matcher: Matcher::CssWithText { css, text },
            rule,
        }
    }
}

// ============================================================================
// Chains
// ============================================================================

const IMAGE_MODE_SWITCH: &[Candidate] = &[
    Candidate::text("button", "🍌 画像の作成", Acceptance::INTERACTIVE),
    Candidate::text("button", "画像の作成、ボタン", Acceptance::INTERACTIVE),
    Candidate::text("button", "画像の作成", Acceptance::INTERACTIVE),
    Candidate::text("button", "Create image", Acceptance::INTERACTIVE),
    Candidate::text("button[role=\"button\"]", "画像", Acceptance::INTERACTIVE),
    Candidate::text("[role=\"button\"]", "画像の作成", Acceptance::INTERACTIVE),
];

const PROMPT_INPUT: &[Candidate] = &[
    Candidate::css("div[contenteditable=\"true\"]", Acceptance::Visible),
    Candidate::css("textarea[placeholder*=\"プロンプト\"]", Acceptance::Visible),
    Candidate::css("textarea[placeholder*=\"画像\"]", Acceptance::Visible),
    Candidate::css("textarea[aria-label*=\"prompt\" i]", Acceptance::Visible),
    Candidate::css("rich-textarea textarea", Acceptance::Visible),
    Candidate::css("textarea", Acceptance::Visible),
];

// Icon-only send buttons are narrower than MIN_CONTROL_WIDTH, so visibility
// is the only rule here.
const SEND_CONTROL: &[Candidate] = &[
    Candidate::css("button[aria-label*=\"送信\"]", Acceptance::Visible),
    Candidate::css("button[aria-label*=\"Send\"]", Acceptance::Visible),
    Candidate::text("button", "生成", Acceptance::Visible),
    Candidate::text("button", "Generate", Acceptance::Visible),
    Candidate::css("button[mattooltip*=\"Send\"]", Acceptance::Visible),
    Candidate::css("button.send-button", Acceptance::Visible),
];

const GENERATED_IMAGE: &[Candidate] = &[
    Candidate::css("img[src*=\"lh3.googleusercontent\"]", Acceptance::ARTIFACT),
    Candidate::css("img[src*=\"googleusercontent\"]", Acceptance::ARTIFACT),
    Candidate::css("div[class*=\"response\"] img", Acceptance::ARTIFACT),
    Candidate::css("model-response img", Acceptance::ARTIFACT),
];

const ACCOUNT_IDENTITY: &[Candidate] = &[
    Candidate::css("[data-identifier-type=\"EMAIL\"]", Acceptance::Visible),
    Candidate::css("div[aria-label*=\"Account\"]", Acceptance::Visible),
    Candidate::css("button[aria-label*=\"Google Account\"]", Acceptance::Visible),
];

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn sized(width: f64, height: f64) -> BoundingBox {
        BoundingBox {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    #[test]
    fn test_every_target_has_candidates() {
        for target in [
            LogicalTarget::ImageModeSwitch,
            LogicalTarget::PromptInput,
            LogicalTarget::SendControl,
            LogicalTarget::GeneratedImage,
            LogicalTarget::AccountIdentity,
        ] {
            assert!(!target.candidates().is_empty(), "{target}");
        }
    }

    #[test]
    fn test_chains_use_their_target_rule() {
        assert!(
            LogicalTarget::ImageModeSwitch
                .candidates()
                .iter()
                .all(|c| c.rule == Acceptance::INTERACTIVE)
        );
        assert!(
            LogicalTarget::GeneratedImage
                .candidates()
                .iter()
                .all(|c| c.rule == Acceptance::ARTIFACT)
        );
    }

    #[test]
    fn test_most_specific_first() {
        let first = LogicalTarget::PromptInput.candidates()[0];
        assert_eq!(first.matcher, Matcher::Css("div[contenteditable=\"true\"]"));
        let last = LogicalTarget::PromptInput.candidates().last().copied();
        assert_eq!(last.map(|c| c.matcher), Some(Matcher::Css("textarea")));
    }

    #[test]
    fn test_boundaries_are_exclusive() {
        let control = Acceptance::INTERACTIVE;
        assert!(!control.admits(true, Some(&sized(50.0, 30.0)), None));
        assert!(control.admits(true, Some(&sized(50.5, 30.0)), None));

        let artifact = Acceptance::ARTIFACT;
        let src = Some("https://lh3.googleusercontent.com/abc");
        assert!(!artifact.admits(true, Some(&sized(200.0, 512.0)), src));
        assert!(!artifact.admits(true, Some(&sized(512.0, 200.0)), src));
        assert!(artifact.admits(true, Some(&sized(201.0, 201.0)), src));
    }

    #[test]
    fn test_artifact_needs_host_marker() {
        let big = sized(512.0, 512.0);
        assert!(!Acceptance::ARTIFACT.admits(true, Some(&big), Some("https://example.com/a.png")));
        assert!(!Acceptance::ARTIFACT.admits(true, Some(&big), None));
    }

    fn any_rule() -> impl Strategy<Value = Acceptance> {
        prop_oneof![
            Just(Acceptance::Visible),
            Just(Acceptance::INTERACTIVE),
            Just(Acceptance::ARTIFACT),
        ]
    }

    proptest! {
        #[test]
        fn prop_invisible_never_admitted(
            rule in any_rule(),
            width in 0.0f64..2000.0,
            height in 0.0f64..2000.0,
        ) {
            let src = Some("https://lh3.googleusercontent.com/x");
            prop_assert!(!rule.admits(false, Some(&sized(width, height)), src));
        }

        #[test]
        fn prop_narrow_controls_rejected(width in 0.0f64..=50.0, height in 0.0f64..500.0) {
            prop_assert!(!Acceptance::INTERACTIVE.admits(true, Some(&sized(width, height)), None));
        }

        #[test]
        fn prop_small_artifacts_rejected(
            small in 0.0f64..=200.0,
            other in 0.0f64..4000.0,
            swap in any::<bool>(),
        ) {
            let bbox = if swap { sized(other, small) } else { sized(small, other) };
            let src = Some("https://lh3.googleusercontent.com/x");
            prop_assert!(!Acceptance::ARTIFACT.admits(true, Some(&bbox), src));
        }
    }
}

//! Element resolution with ordered fallbacks.
//!
//! [`ElementResolver::resolve`] walks the candidate chain of a
//! [`LogicalTarget`] in order. For each candidate it queries every match and
//! returns the first node that passes the candidate's [`Acceptance`] rule.
//! Properties are read lazily: visibility first, then the layout box, then
//! `src`, and only when the rule needs them.
//!
//! A failed query (invalid selector, navigation in progress) skips the
//! candidate. A node that goes stale while being inspected is skipped.
//!
//! # Example
//!
//! ```ignore
//! let resolver = ElementResolver::new(&tab);
//! if let Some(input) = resolver.resolve(LogicalTarget::PromptInput).await {
//!     input.element().fill("a red fox").await?;
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, trace};

use crate::error::Result;
use crate::page::{Matcher, Page, PageElement};

// ============================================================================
// Submodules
// ============================================================================

/// Logical targets, acceptance rules and candidate chains.
pub mod target;

// ============================================================================
// Re-exports
// ============================================================================

pub use target::{Acceptance, Candidate, LogicalTarget};

// ============================================================================
// ResolvedElement
// ============================================================================

/// A node that satisfied a target's rule.
///
/// Valid until the next navigation.
#[derive(Debug, Clone)]
pub struct ResolvedElement<E> {
    element: E,
    target: LogicalTarget,
    matcher: Matcher,
}

impl<E> ResolvedElement<E> {
    /// The live node.
    #[inline]
    #[must_use]
    pub fn element(&self) -> &E {
        &self.element
    }

    /// The target it resolves.
    #[inline]
    #[must_use]
    pub fn target(&self) -> LogicalTarget {
        self.target
    }

    /// The candidate matcher that found it.
    #[inline]
    #[must_use]
    pub fn matcher(&self) -> Matcher {
        self.matcher
    }

    /// Unwraps the node.
    #[inline]
    #[must_use]
    pub fn into_element(self) -> E {
        self.element
    }
}

// ============================================================================
// ElementResolver
// ============================================================================

/// Resolves logical targets on one page.
#[derive(Debug)]
pub struct ElementResolver<'a, P> {
    page: &'a P,
}

impl<'a, P: Page> ElementResolver<'a, P> {
    /// Creates a resolver for `page`.
    #[inline]
    #[must_use]
    pub fn new(page: &'a P) -> Self {
        Self { page }
    }

    /// Returns the first node in `target`'s chain that passes its rule.
    pub async fn resolve(&self, target: LogicalTarget) -> Option<ResolvedElement<P::Element>> {
        for candidate in target.candidates() {
            let matches = match self.page.query_all(&candidate.matcher).await {
                Ok(matches) => matches,
                Err(e) => {
                    debug!(%target, matcher = %candidate.matcher, error = %e, "Candidate query failed");
                    continue;
                }
            };

            trace!(%target, matcher = %candidate.matcher, count = matches.len(), "Candidate matches");

            for element in matches {
                match accepts(&candidate.rule, &element).await {
                    Ok(true) => {
                        debug!(%target, matcher = %candidate.matcher, "Resolved target");
                        return Some(ResolvedElement {
                            element,
                            target,
                            matcher: candidate.matcher,
                        });
                    }
                    Ok(false) => {}
                    Err(e) => {
                        trace!(%target, error = %e, "Skipping element");
                    }
                }
            }
        }

        debug!(%target, "Target not found");
        None
    }
}

/// Checks `rule` against a live node, reading only what the rule needs.
async fn accepts<E: PageElement>(rule: &Acceptance, element: &E) -> Result<bool> {
    if !element.is_visible().await? {
        return Ok(false);
    }

    if rule.needs_box() {
        let bbox = element.bounding_box().await?;
        if !rule.fits_box(bbox.as_ref()) {
            return Ok(false);
        }
    }

    if rule.needs_src() {
        let src = element.attribute("src").await?;
        return Ok(rule.fits_src(src.as_deref()));
    }

    Ok(true)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::fake::{Call, FakeElement, FakePage};

    const CONTENTEDITABLE: Matcher = Matcher::Css("div[contenteditable=\"true\"]");
    const TEXTAREA: Matcher = Matcher::Css("textarea");
    const LH3: Matcher = Matcher::Css("img[src*=\"lh3.googleusercontent\"]");
    const MODEL_IMG: Matcher = Matcher::Css("model-response img");
    const CREATE_IMAGE: Matcher = Matcher::CssWithText {
        css: "button",
        text: "画像の作成",
    };

    #[tokio::test]
    async fn test_first_candidate_wins() {
        let page = FakePage::new()
            .with_element(CONTENTEDITABLE, FakeElement::visible("editor"))
            .with_element(TEXTAREA, FakeElement::visible("fallback"));

        let resolved = ElementResolver::new(&page)
            .resolve(LogicalTarget::PromptInput)
            .await
            .expect("resolved");

        assert_eq!(resolved.element().name(), "editor");
        assert_eq!(resolved.matcher(), CONTENTEDITABLE);
        assert_eq!(resolved.target(), LogicalTarget::PromptInput);
    }

    #[tokio::test]
    async fn test_falls_through_to_generic_candidate() {
        let page = FakePage::new()
            .with_element(CONTENTEDITABLE, FakeElement::visible("ghost").hidden())
            .with_element(TEXTAREA, FakeElement::visible("plain"));

        let resolved = ElementResolver::new(&page)
            .resolve(LogicalTarget::PromptInput)
            .await
            .expect("resolved");

        assert_eq!(resolved.into_element().name(), "plain");
    }

    #[tokio::test]
    async fn test_query_error_skips_candidate() {
        let page = FakePage::new()
            .with_failing_query(CONTENTEDITABLE)
            .with_element(TEXTAREA, FakeElement::visible("plain"));

        let resolved = ElementResolver::new(&page)
            .resolve(LogicalTarget::PromptInput)
            .await;

        assert_eq!(resolved.map(|r| r.into_element().name().to_string()), Some("plain".into()));
    }

    #[tokio::test]
    async fn test_picks_first_acceptable_match() {
        let page = FakePage::new()
            .with_element(CREATE_IMAGE, FakeElement::visible("label").with_size(30.0, 20.0))
            .with_element(CREATE_IMAGE, FakeElement::visible("stale").stale())
            .with_element(CREATE_IMAGE, FakeElement::visible("chip").with_size(140.0, 36.0));

        let resolved = ElementResolver::new(&page)
            .resolve(LogicalTarget::ImageModeSwitch)
            .await
            .expect("resolved");

        assert_eq!(resolved.element().name(), "chip");
    }

    #[tokio::test]
    async fn test_ghost_controls_not_found() {
        let page = FakePage::new()
            .with_element(CREATE_IMAGE, FakeElement::visible("narrow").with_size(50.0, 36.0))
            .with_element(CREATE_IMAGE, FakeElement::visible("unrendered").without_box());

        let resolved = ElementResolver::new(&page)
            .resolve(LogicalTarget::ImageModeSwitch)
            .await;

        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_artifact_rejects_thumbnails_and_foreign_hosts() {
        let page = FakePage::new()
            .with_element(
                LH3,
                FakeElement::image("avatar", "https://lh3.googleusercontent.com/a/avatar")
                    .with_size(32.0, 32.0),
            )
            .with_element(
                MODEL_IMG,
                FakeElement::image("decor", "https://www.gstatic.com/decor.png"),
            );

        let resolved = ElementResolver::new(&page)
            .resolve(LogicalTarget::GeneratedImage)
            .await;

        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn test_artifact_found() {
        let page = FakePage::new().with_element(
            MODEL_IMG,
            FakeElement::image("output", "https://lh3.googleusercontent.com/gen/123"),
        );

        let resolved = ElementResolver::new(&page)
            .resolve(LogicalTarget::GeneratedImage)
            .await
            .expect("resolved");

        assert_eq!(resolved.element().name(), "output");
        assert_eq!(resolved.matcher(), MODEL_IMG);
    }

    #[tokio::test]
    async fn test_resolve_has_no_side_effects() {
        let page = FakePage::new()
            .with_element(CREATE_IMAGE, FakeElement::visible("chip").with_size(140.0, 36.0));

        let _ = ElementResolver::new(&page)
            .resolve(LogicalTarget::ImageModeSwitch)
            .await;

        assert!(page.calls().iter().all(|c| !matches!(c, Call::Click(_))));
    }
}

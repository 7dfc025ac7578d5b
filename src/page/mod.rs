//! The page seam.
//!
//! The resolver, the orchestrator and the artifact extractor never talk to
//! the browser directly. They are generic over [`Page`] and [`PageElement`],
//! which [`Tab`] and [`Element`] implement on top of WebDriver BiDi.
//!
//! | Trait | Implemented by |
//! |-------|----------------|
//! | [`Page`] | [`Tab`] |
//! | [`PageElement`] | [`Element`] |

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use async_trait::async_trait;

use crate::browser::{BoundingBox, Element, Tab};
use crate::error::Result;
use crate::protocol::{Cookie, PartialCookie};

// ============================================================================
// Submodules
// ============================================================================

#[cfg(test)]
pub(crate) mod fake;

// ============================================================================
// Matcher
// ============================================================================

/// One concrete way to locate nodes in the current markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Matcher {
    /// Plain CSS selector.
    Css(&'static str),

    /// CSS selector narrowed to nodes whose rendered text contains `text`
    /// (case-insensitive).
    CssWithText {
        /// CSS selector.
        css: &'static str,
        /// Text the node must contain.
        text: &'static str,
    },
}

impl Matcher {
    /// Returns the CSS part.
    #[inline]
    #[must_use]
    pub const fn css(&self) -> &'static str {
        match self {
            Self::Css(css) | Self::CssWithText { css, .. } => css,
        }
    }

    /// Returns the text filter, if any.
    #[inline]
    #[must_use]
    pub const fn text(&self) -> Option<&'static str> {
        match self {
            Self::Css(_) => None,
            Self::CssWithText { text, .. } => Some(text),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(css) => f.write_str(css),
            Self::CssWithText { css, text } => write!(f, "{css}:has-text(\"{text}\")"),
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// A live DOM node.
#[async_trait]
pub trait PageElement: Send + Sync {
    /// Rendered with a non-empty box and not hidden by CSS.
    async fn is_visible(&self) -> Result<bool>;

    /// Layout box, `None` when not rendered.
    async fn bounding_box(&self) -> Result<Option<BoundingBox>>;

    /// Attribute value.
    async fn attribute(&self, name: &str) -> Result<Option<String>>;

    /// Rendered text.
    async fn text(&self) -> Result<String>;

    /// Clicks the node.
    async fn click(&self) -> Result<()>;

    /// Replaces the node's editable content.
    async fn fill(&self, text: &str) -> Result<()>;

    /// Presses Enter with the node focused.
    async fn press_enter(&self) -> Result<()>;

    /// Captures the node's pixels as PNG.
    async fn screenshot_png(&self) -> Result<Vec<u8>>;
}

/// A single page of the target application.
#[async_trait]
pub trait Page: Send + Sync {
    /// Node handle type.
    type Element: PageElement;

    /// Navigates and waits for the DOM to be ready.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Current location.
    async fn current_url(&self) -> Result<String>;

    /// All nodes matching `matcher`, in document order.
    async fn query_all(&self, matcher: &Matcher) -> Result<Vec<Self::Element>>;

    /// Downloads `url` with the page's credentials.
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>>;

    /// Every cookie of the browser.
    async fn cookies(&self) -> Result<Vec<Cookie>>;

    /// Writes one cookie into the browser.
    async fn set_cookie(&self, cookie: PartialCookie) -> Result<()>;
}

// ============================================================================
// BiDi Implementations
// ============================================================================

#[async_trait]
impl PageElement for Element {
    async fn is_visible(&self) -> Result<bool> {
        Element::is_visible(self).await
    }

    async fn bounding_box(&self) -> Result<Option<BoundingBox>> {
        Element::bounding_box(self).await
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.get_attribute(name).await
    }

    async fn text(&self) -> Result<String> {
        self.get_text().await
    }

    async fn click(&self) -> Result<()> {
        Element::click(self).await
    }

    async fn fill(&self, text: &str) -> Result<()> {
        Element::fill(self, text).await
    }

    async fn press_enter(&self) -> Result<()> {
        Element::press_enter(self).await
    }

    async fn screenshot_png(&self) -> Result<Vec<u8>> {
        Element::screenshot_png(self).await
    }
}

#[async_trait]
impl Page for Tab {
    type Element = Element;

    async fn goto(&self, url: &str) -> Result<()> {
        Tab::goto(self, url).await
    }

    async fn current_url(&self) -> Result<String> {
        self.get_url().await
    }

    async fn query_all(&self, matcher: &Matcher) -> Result<Vec<Element>> {
        Tab::query_all(self, matcher.css(), matcher.text()).await
    }

    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>> {
        Tab::fetch_bytes(self, url).await
    }

    async fn cookies(&self) -> Result<Vec<Cookie>> {
        self.get_all_cookies().await
    }

    async fn set_cookie(&self, cookie: PartialCookie) -> Result<()> {
        Tab::set_cookie(self, cookie).await
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matcher_parts() {
        let plain = Matcher::Css("textarea");
        assert_eq!(plain.css(), "textarea");
        assert_eq!(plain.text(), None);

        let with_text = Matcher::CssWithText {
            css: "button",
            text: "Create image",
        };
        assert_eq!(with_text.css(), "button");
        assert_eq!(with_text.text(), Some("Create image"));
    }

    #[test]
    fn test_matcher_display() {
        let matcher = Matcher::CssWithText {
            css: "button",
            text: "生成",
        };
        assert_eq!(matcher.to_string(), "button:has-text(\"生成\")");
        assert_eq!(Matcher::Css("img").to_string(), "img");
    }
}

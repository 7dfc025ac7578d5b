//! DOM element interaction.
//!
//! Elements are BiDi node references (`sharedId`) bound to the tab they were
//! found in. Every operation is a `script.callFunction` with the node as the
//! first argument, so a reference invalidated by a re-render surfaces as a
//! `no such node` remote error (see [`crate::Error::is_stale_reference`]).
//!
//! # Example
//!
//! ```ignore
//! let inputs = tab.query_all("textarea", None).await?;
//! let input = &inputs[0];
//!
//! if input.is_visible().await? {
//!     input.fill("a red fox").await?;
//!     input.press_enter().await?;
//! }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::identifiers::ElementId;
use crate::protocol::{KEY_ENTER, remote};

use super::Tab;

// ============================================================================
// Scripts
// ============================================================================

/// Non-empty layout box and not hidden by CSS.
const IS_VISIBLE: &str = r#"(el) => {
    const rect = el.getBoundingClientRect();
    if (rect.width <= 0 || rect.height <= 0) {
        return false;
    }
    const style = window.getComputedStyle(el);
    return style.display !== 'none' && style.visibility !== 'hidden';
}"#;

/// Box in CSS pixels, or `null` when the element is not rendered.
const BOUNDING_BOX: &str = r#"(el) => {
    const rect = el.getBoundingClientRect();
    if (rect.width === 0 && rect.height === 0 && el.getClientRects().length === 0) {
        return null;
    }
    return { x: rect.x, y: rect.y, width: rect.width, height: rect.height };
}"#;

/// Replaces the content of an editor with `text`, firing the events a
/// framework-bound input listens to.
const FILL: &str = r#"(el, text) => {
    el.focus();
    if (el.isContentEditable) {
        const selection = window.getSelection();
        const range = document.createRange();
        range.selectNodeContents(el);
        selection.removeAllRanges();
        selection.addRange(range);
        if (!document.execCommand('insertText', false, text)) {
            el.textContent = text;
            el.dispatchEvent(new InputEvent('input', { bubbles: true, data: text, inputType: 'insertText' }));
        }
        return;
    }
    const proto = el instanceof HTMLTextAreaElement
        ? HTMLTextAreaElement.prototype
        : HTMLInputElement.prototype;
    const setter = Object.getOwnPropertyDescriptor(proto, 'value').set;
    setter.call(el, text);
    el.dispatchEvent(new Event('input', { bubbles: true }));
    el.dispatchEvent(new Event('change', { bubbles: true }));
}"#;

// ============================================================================
// Types
// ============================================================================

/// Element box in CSS pixels relative to the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

/// Internal shared state for an element.
pub(crate) struct ElementInner {
    /// Node reference.
    pub id: ElementId,

    /// Tab the node lives in.
    pub tab: Tab,
}

// ============================================================================
// Element
// ============================================================================

/// A handle to a DOM node in a browser tab.
#[derive(Clone)]
pub struct Element {
    /// Shared inner state.
    pub(crate) inner: Arc<ElementInner>,
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("id", &self.inner.id)
            .field("context", self.inner.tab.context())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Element - Constructor
// ============================================================================

impl Element {
    /// Creates a new element handle.
    pub(crate) fn new(id: ElementId, tab: Tab) -> Self {
        Self {
            inner: Arc::new(ElementInner { id, tab }),
        }
    }
}

// ============================================================================
// Element - Accessors
// ============================================================================

impl Element {
    /// Returns this element's node reference.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &ElementId {
        &self.inner.id
    }
}

// ============================================================================
// Element - Properties
// ============================================================================

impl Element {
    /// Checks whether the element is rendered and not hidden.
    pub async fn is_visible(&self) -> Result<bool> {
        Ok(self.call(IS_VISIBLE, vec![]).await?.as_bool().unwrap_or(false))
    }

    /// Returns the element's box, or `None` when it is not rendered.
    pub async fn bounding_box(&self) -> Result<Option<BoundingBox>> {
        let value = self.call(BOUNDING_BOX, vec![]).await?;
        Ok(serde_json::from_value(value).ok())
    }

    /// Gets an attribute value.
    pub async fn get_attribute(&self, name: &str) -> Result<Option<String>> {
        let value = self
            .call(
                "(el, name) => el.getAttribute(name)",
                vec![remote::local_string(name)],
            )
            .await?;
        Ok(value.as_str().map(str::to_string))
    }

    /// Gets the element's rendered text.
    pub async fn get_text(&self) -> Result<String> {
        let value = self
            .call("(el) => el.innerText || el.textContent || ''", vec![])
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }
}

// ============================================================================
// Element - Actions
// ============================================================================

impl Element {
    /// Scrolls the element into view and clicks it.
    pub async fn click(&self) -> Result<()> {
        debug!(element_id = %self.inner.id, "Clicking element");
        self.call(
            "(el) => { el.scrollIntoView({ block: 'center' }); el.click(); }",
            vec![],
        )
        .await?;
        Ok(())
    }

    /// Focuses the element.
    pub async fn focus(&self) -> Result<()> {
        self.call("(el) => el.focus()", vec![]).await?;
        Ok(())
    }

    /// Replaces the element's content with `text`.
    ///
    /// Works for `contenteditable` editors as well as `textarea`/`input`.
    pub async fn fill(&self, text: &str) -> Result<()> {
        debug!(element_id = %self.inner.id, len = text.len(), "Filling element");
        self.call(FILL, vec![remote::local_string(text)]).await?;
        Ok(())
    }

    /// Focuses the element and presses Enter.
    pub async fn press_enter(&self) -> Result<()> {
        self.focus().await?;
        self.inner.tab.press_key(KEY_ENTER).await
    }

    /// Captures the element's pixels as PNG.
    pub async fn screenshot_png(&self) -> Result<Vec<u8>> {
        self.call(
            "(el) => el.scrollIntoView({ block: 'center' })",
            vec![],
        )
        .await?;
        self.inner.tab.capture_element(&self.inner.id).await
    }
}

// ============================================================================
// Element - Internal
// ============================================================================

impl Element {
    /// Calls `declaration` with this node followed by `args`.
    async fn call(&self, declaration: &str, args: Vec<Value>) -> Result<Value> {
        let mut arguments = Vec::with_capacity(args.len() + 1);
        arguments.push(remote::shared_reference(&self.inner.id));
        arguments.extend(args);

        self.inner.tab.call_function(declaration, arguments).await
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Element search.

use tracing::trace;

use crate::browser::Element;
use crate::error::Result;
use crate::protocol::remote;

use super::Tab;

// ============================================================================
// Scripts
// ============================================================================

/// Returns every match of `css`, optionally narrowed to nodes whose rendered
/// text contains `text` (case-insensitive, whitespace collapsed).
const QUERY_ALL: &str = r#"(css, text) => {
    const norm = (s) => (s || '').replace(/\s+/g, ' ').trim().toLowerCase();
    const wanted = text === null ? null : norm(text);
    return Array.from(document.querySelectorAll(css)).filter(
        (el) => wanted === null || norm(el.innerText || el.textContent).includes(wanted)
    );
}"#;

// ============================================================================
// Tab - Element Search
// ============================================================================

impl Tab {
    /// Finds all elements matching a CSS selector, in document order.
    ///
    /// With `text`, only elements whose rendered text contains it are kept.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::ScriptError`] for an invalid selector.
    pub async fn query_all(&self, css: &str, text: Option<&str>) -> Result<Vec<Element>> {
        let text_arg = text.map_or_else(remote::local_null, remote::local_string);
        let result = self
            .call_function_raw(QUERY_ALL, vec![remote::local_string(css), text_arg])
            .await?;

        let elements: Vec<Element> = remote::node_ids(&result)
            .into_iter()
            .map(|id| Element::new(id, self.clone()))
            .collect();

        trace!(css, ?text, count = elements.len(), "Queried elements");
        Ok(elements)
    }

}

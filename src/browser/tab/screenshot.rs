//! Screenshot capture methods.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::ElementId;
use crate::protocol::{
    BrowsingContextCommand, ClipRectangle, Command, ScreenshotOrigin, SharedReference,
};

use super::Tab;

// ============================================================================
// Tab - Screenshots
// ============================================================================

impl Tab {
    /// Captures the bounding box of a node as PNG bytes.
    ///
    /// Uses the document origin, so the node does not have to be inside the
    /// viewport.
    pub async fn capture_element(&self, element: &ElementId) -> Result<Vec<u8>> {
        let command = Command::BrowsingContext(BrowsingContextCommand::CaptureScreenshot {
            context: self.inner.context.clone(),
            origin: ScreenshotOrigin::Document,
            clip: Some(ClipRectangle::Element {
                element: SharedReference {
                    shared_id: element.clone(),
                },
            }),
        });

        let result = self.send_command(command).await?;
        let bytes = decode_data(&result)?;

        debug!(element = %element, bytes = bytes.len(), "Captured element screenshot");
        Ok(bytes)
    }
}

/// Decodes the base64 `data` field of a screenshot result.
fn decode_data(result: &Value) -> Result<Vec<u8>> {
    let data = result
        .get("data")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::protocol("No screenshot data in response"))?;

    Base64Standard
        .decode(data)
        .map_err(|e| Error::protocol(format!("Invalid base64 screenshot: {e}")))
}

// ============================================================================
// Tests
// ============================================================================

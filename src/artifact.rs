//! Image extraction.
//!
//! [`ArtifactExtractor::extract`] turns the resolved output `<img>` into
//! bytes. Tiers run in a fixed order and the first success wins:
//!
//! | Tier | Applies to | How |
//! |------|------------|-----|
//! | [`ExtractionTier::InlineData`] | `data:` sources | base64 decode |
//! | [`ExtractionTier::RemoteFetch`] | `http(s)` sources | `fetch` inside the signed-in page |
//! | [`ExtractionTier::Screenshot`] | anything | element screenshot |
//!
//! Failures of the first two tiers are logged and fall through. Only a
//! failed screenshot is returned as an error.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use image::ImageFormat;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::page::{Page, PageElement};

// ============================================================================
// Types
// ============================================================================

/// How an artifact was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTier {
    /// Decoded from a `data:` URL.
    InlineData,
    /// Downloaded through the page.
    RemoteFetch,
    /// Captured from the rendered element.
    Screenshot,
}

impl fmt::Display for ExtractionTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::InlineData => "inline_data",
            Self::RemoteFetch => "remote_fetch",
            Self::Screenshot => "screenshot",
        })
    }
}

/// Bytes of a generated image.
#[derive(Clone, PartialEq, Eq)]
pub struct Artifact {
    bytes: Vec<u8>,
    tier: ExtractionTier,
    format: Option<ImageFormat>,
}

impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("len", &self.bytes.len())
            .field("tier", &self.tier)
            .field("format", &self.format)
            .finish()
    }
}

impl Artifact {
    /// Wraps bytes, sniffing their image format.
    #[must_use]
    pub fn new(bytes: Vec<u8>, tier: ExtractionTier) -> Self {
        let format = image::guess_format(&bytes).ok();
        Self {
            bytes,
            tier,
            format,
        }
    }

    /// Image bytes.
    #[inline]
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consumes the artifact, returning its bytes.
    #[inline]
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Tier that produced the bytes.
    #[inline]
    #[must_use]
    pub fn tier(&self) -> ExtractionTier {
        self.tier
    }

    /// Sniffed image format.
    #[inline]
    #[must_use]
    pub fn format(&self) -> Option<ImageFormat> {
        self.format
    }

    /// File extension for the sniffed format, `png` when unknown.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        self.format
            .and_then(|f| f.extensions_str().first().copied())
            .unwrap_or("png")
    }
}

// ============================================================================
// ArtifactExtractor
// ============================================================================

/// Layered extraction of the output image.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArtifactExtractor;

impl ArtifactExtractor {
    /// Extracts `element`'s image from `page`.
    ///
    /// # Errors
    ///
    /// Returns the screenshot error when every tier failed.
    pub async fn extract<P: Page>(&self, page: &P, element: &P::Element) -> Result<Artifact> {
        let src = match element.attribute("src").await {
            Ok(src) => src.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "Cannot read image source");
                String::new()
            }
        };

        if src.starts_with("data:") {
            match decode_data_url(&src) {
                Ok(bytes) => return Ok(finish(bytes, ExtractionTier::InlineData)),
                Err(e) => warn!(error = %e, "Inline image could not be decoded"),
            }
        } else if src.starts_with("https://") || src.starts_with("http://") {
            match fetch_image(page, &src).await {
                Ok(bytes) => return Ok(finish(bytes, ExtractionTier::RemoteFetch)),
                Err(e) => warn!(error = %e, "Download through page failed"),
            }
        } else {
            debug!(src = %src, "Unrecognized image source");
        }

        info!("Falling back to element screenshot");
        let bytes = element.screenshot_png().await?;
        if bytes.is_empty() {
            return Err(Error::protocol("Screenshot was empty"));
        }
        Ok(finish(bytes, ExtractionTier::Screenshot))
    }
}

fn finish(bytes: Vec<u8>, tier: ExtractionTier) -> Artifact {
    let artifact = Artifact::new(bytes, tier);
    info!(
        %tier,
        bytes = artifact.bytes().len(),
        format = artifact.extension(),
        "Extracted image"
    );
    artifact
}

/// Downloads `url` and checks that the body is an image.
async fn fetch_image<P: Page>(page: &P, url: &str) -> Result<Vec<u8>> {
    let bytes = page.fetch_bytes(url).await?;
    if image::guess_format(&bytes).is_err() {
        return Err(Error::protocol(format!(
            "Downloaded {} bytes that are not an image",
            bytes.len()
        )));
    }
    Ok(bytes)
}

/// Decodes a base64 `data:` URL.
fn decode_data_url(src: &str) -> Result<Vec<u8>> {
    let (header, payload) = src
        .split_once(',')
        .ok_or_else(|| Error::protocol("data URL without payload"))?;

    if !header.ends_with(";base64") {
        return Err(Error::protocol(format!(
            "Unsupported data URL encoding: {header}"
        )));
    }

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = Base64Standard
        .decode(compact)
        .map_err(|e| Error::protocol(format!("Invalid base64 image: {e}")))?;

    if bytes.is_empty() {
        return Err(Error::protocol("data URL is empty"));
    }
    Ok(bytes)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::fake::{Call, FakeElement, FakePage};

    /// PNG signature plus padding; enough for format sniffing.
    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
    const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10, b'J', b'F', b'I', b'F'];
    const REMOTE: &str = "https://lh3.googleusercontent.com/gen/abc=s1024";

    fn data_url(bytes: &[u8]) -> String {
        format!("data:image/png;base64,{}", Base64Standard.encode(bytes))
    }

    #[tokio::test]
    async fn test_inline_data_skips_other_tiers() {
        let page = FakePage::new().with_fetch(REMOTE, JPEG);
        let element = FakeElement::image("img", &data_url(PNG)).with_screenshot(PNG);

        let artifact = ArtifactExtractor.extract(&page, &element).await.expect("extract");

        assert_eq!(artifact.tier(), ExtractionTier::InlineData);
        assert_eq!(artifact.bytes(), PNG);
        assert_eq!(artifact.format(), Some(ImageFormat::Png));
        assert!(page.calls().is_empty());
    }

    #[tokio::test]
    async fn test_remote_fetch() {
        let page = FakePage::new().with_fetch(REMOTE, JPEG);
        let element = FakeElement::image("img", REMOTE).with_screenshot(PNG);

        let artifact = ArtifactExtractor.extract(&page, &element).await.expect("extract");

        assert_eq!(artifact.tier(), ExtractionTier::RemoteFetch);
        assert_eq!(artifact.extension(), "jpg");
        assert_eq!(page.calls(), vec![Call::Fetch(REMOTE.to_string())]);
    }

    #[tokio::test]
    async fn test_failed_fetch_falls_back_to_screenshot() {
        let page = FakePage::new();
        let element = FakeElement::image("img", REMOTE).with_screenshot(PNG);

        let artifact = ArtifactExtractor.extract(&page, &element).await.expect("extract");

        assert_eq!(artifact.tier(), ExtractionTier::Screenshot);
        assert_eq!(
            page.calls(),
            vec![
                Call::Fetch(REMOTE.to_string()),
                Call::Screenshot("img".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_non_image_body_falls_back() {
        let page = FakePage::new().with_fetch(REMOTE, b"<!doctype html><p>denied</p>");
        let element = FakeElement::image("img", REMOTE).with_screenshot(PNG);

        let artifact = ArtifactExtractor.extract(&page, &element).await.expect("extract");
        assert_eq!(artifact.tier(), ExtractionTier::Screenshot);
    }

    #[tokio::test]
    async fn test_broken_inline_data_goes_to_screenshot() {
        let page = FakePage::new();
        let element = FakeElement::image("img", "data:image/png;base64,@@@").with_screenshot(PNG);

        let artifact = ArtifactExtractor.extract(&page, &element).await.expect("extract");

        assert_eq!(artifact.tier(), ExtractionTier::Screenshot);
        assert!(!page.calls().iter().any(|c| matches!(c, Call::Fetch(_))));
    }

    #[tokio::test]
    async fn test_all_tiers_failing_is_an_error() {
        let page = FakePage::new();
        let element = FakeElement::image("img", REMOTE);

        assert!(ArtifactExtractor.extract(&page, &element).await.is_err());
    }

    #[test]
    fn test_decode_data_url() {
        assert_eq!(decode_data_url(&data_url(PNG)).expect("decode"), PNG);
        assert!(decode_data_url("data:image/svg+xml,%3Csvg%3E").is_err());
        assert!(decode_data_url("data:image/png;base64").is_err());
        assert!(decode_data_url("data:image/png;base64,").is_err());
    }

    #[test]
    fn test_unknown_format_defaults_to_png_extension() {
        let artifact = Artifact::new(vec![1, 2, 3], ExtractionTier::Screenshot);
        assert_eq!(artifact.format(), None);
        assert_eq!(artifact.extension(), "png");
    }
}

//! Prompt templating from a reference image.
//!
//! A [`PromptTemplater`] rewrites the user's prompt before submission.
//! [`ReferenceImageTemplater`] reads a local image and appends a style
//! directive built from what it measures:
//!
//! | Measure | Source |
//! |---------|--------|
//! | orientation, aspect ratio | image dimensions |
//! | lighting | mean luma |
//! | palette | three most common colors after coarse quantization |
//!
//! Templating is optional. [`apply_template`] falls back to the original
//! prompt on any failure.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::path::{Path, PathBuf};

use image::RgbImage;
use image::imageops::FilterType;
use rustc_hash::FxHashMap;
use tracing::{debug, info, warn};

use crate::error::Result;

// ============================================================================
// Constants
// ============================================================================

/// Longest side after downscaling for analysis.
const ANALYSIS_SIZE: u32 = 64;

/// Palette entries reported.
const PALETTE_SIZE: usize = 3;

/// Bits kept per channel when bucketing colors.
const QUANT_SHIFT: u8 = 6;

// ============================================================================
// PromptTemplater
// ============================================================================

/// Turns a user prompt into the prompt that is submitted.
pub trait PromptTemplater {
    /// Composes the final prompt.
    ///
    /// # Errors
    ///
    /// Implementation specific; callers fall back to `prompt`.
    fn compose(&self, prompt: &str) -> Result<String>;
}

/// Runs `templater` when present, degrading to `prompt` on failure.
#[must_use]
pub fn apply_template(templater: Option<&dyn PromptTemplater>, prompt: &str) -> String {
    let Some(templater) = templater else {
        return prompt.to_string();
    };

    match templater.compose(prompt) {
        Ok(composed) if !composed.trim().is_empty() => {
            info!(chars = composed.chars().count(), "Prompt composed from template");
            composed
        }
        Ok(_) => {
            warn!("Template produced an empty prompt; using the original");
            prompt.to_string()
        }
        Err(e) => {
            warn!(error = %e, "Prompt templating failed; using the original");
            prompt.to_string()
        }
    }
}

// ============================================================================
// Style
// ============================================================================

/// What the analysis measured.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageStyle {
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Mean luma in `0.0..=1.0`.
    pub brightness: f64,
    /// Most common colors, most common first.
    pub palette: Vec<[u8; 3]>,
}

impl ImageStyle {
    /// `landscape`, `portrait`, or `square`.
    #[must_use]
    pub fn orientation(&self) -> &'static str {
        let ratio = self.aspect_ratio();
        if ratio > 1.1 {
            "landscape"
        } else if ratio < 0.9 {
            "portrait"
        } else {
            "square"
        }
    }

    /// Width over height.
    #[must_use]
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.width) / f64::from(self.height.max(1))
    }

    /// Coarse lighting description.
    #[must_use]
    pub fn lighting(&self) -> &'static str {
        match self.brightness {
            b if b < 0.3 => "dark, low-key",
            b if b > 0.7 => "bright, high-key",
            _ => "balanced",
        }
    }
}

impl fmt::Display for ImageStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let palette = self
            .palette
            .iter()
            .map(|[r, g, b]| format!("#{r:02x}{g:02x}{b:02x}"))
            .collect::<Vec<_>>()
            .join(", ");

        write!(
            f,
            "{} composition (aspect ratio {:.2}), {} lighting, dominant colors {}",
            self.orientation(),
            self.aspect_ratio(),
            self.lighting(),
            palette
        )
    }
}

// ============================================================================
// ReferenceImageTemplater
// ============================================================================

/// Appends the measured style of a reference image to the prompt.
#[derive(Debug, Clone)]
pub struct ReferenceImageTemplater {
    path: PathBuf,
}

impl ReferenceImageTemplater {
    /// Templater reading `path` on each [`PromptTemplater::compose`].
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reference image path.
    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decodes and measures the reference image.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Image`] if it cannot be opened or decoded.
    pub fn analyze(&self) -> Result<ImageStyle> {
        let image = image::open(&self.path)?;
        let small = image
            .resize(ANALYSIS_SIZE, ANALYSIS_SIZE, FilterType::Triangle)
            .to_rgb8();
        let style = measure(image.width(), image.height(), &small);

        debug!(path = %self.path.display(), %style, "Analyzed reference image");
        Ok(style)
    }
}

impl PromptTemplater for ReferenceImageTemplater {
    fn compose(&self, prompt: &str) -> Result<String> {
        let style = self.analyze()?;
        Ok(format!(
            "{prompt}\n\nMatch the visual style of the reference image: {style}."
        ))
    }
}

fn measure(width: u32, height: u32, pixels: &RgbImage) -> ImageStyle {
    let mut buckets: FxHashMap<[u8; 3], (u32, [u64; 3])> = FxHashMap::default();
    let mut luma_sum = 0.0;

    for pixel in pixels.pixels() {
        let [r, g, b] = pixel.0;
        luma_sum += (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)) / 255.0;

        let key = [r >> QUANT_SHIFT, g >> QUANT_SHIFT, b >> QUANT_SHIFT];
        let entry = buckets.entry(key).or_insert((0, [0; 3]));
        entry.0 += 1;
        entry.1[0] += u64::from(r);
        entry.1[1] += u64::from(g);
        entry.1[2] += u64::from(b);
    }

    let count = u64::from(pixels.width()) * u64::from(pixels.height());
    let brightness = if count == 0 {
        0.0
    } else {
        luma_sum / count as f64
    };

    let mut ranked: Vec<_> = buckets.into_iter().collect();
    ranked.sort_by(|(ka, (na, _)), (kb, (nb, _))| nb.cmp(na).then(ka.cmp(kb)));

    let palette = ranked
        .into_iter()
        .take(PALETTE_SIZE)
        .map(|(_, (n, sums))| sums.map(|s| (s / u64::from(n)) as u8))
        .collect();

    ImageStyle {
        width,
        height,
        brightness,
        palette,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;

    struct Failing;

    impl PromptTemplater for Failing {
        fn compose(&self, _prompt: &str) -> Result<String> {
            Err(crate::Error::config("no vision today"))
        }
    }

    /// Left two thirds red, right third blue.
    fn banner(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, _| {
            if x < width * 2 / 3 {
                Rgb([220, 20, 20])
            } else {
                Rgb([20, 20, 220])
            }
        })
    }

    #[test]
    fn test_measure_banner() {
        let style = measure(300, 100, &banner(30, 10));

        assert_eq!(style.orientation(), "landscape");
        assert_eq!(style.palette, vec![[220, 20, 20], [20, 20, 220]]);
        assert_eq!(style.lighting(), "dark, low-key");
    }

    #[test]
    fn test_orientation_and_lighting() {
        let white = measure(100, 200, &RgbImage::from_pixel(4, 8, Rgb([255, 255, 255])));
        assert_eq!(white.orientation(), "portrait");
        assert_eq!(white.lighting(), "bright, high-key");

        let grey = measure(100, 100, &RgbImage::from_pixel(4, 4, Rgb([128, 128, 128])));
        assert_eq!(grey.orientation(), "square");
        assert_eq!(grey.lighting(), "balanced");
    }

    #[test]
    fn test_compose_from_file() {
        let temp = tempfile::tempdir().expect("temp dir");
        let path = temp.path().join("ref.png");
        banner(90, 30).save(&path).expect("save png");

        let composed = ReferenceImageTemplater::new(&path)
            .compose("a lighthouse at dusk")
            .expect("compose");

        assert!(composed.starts_with("a lighthouse at dusk\n\n"));
        assert!(composed.contains("landscape composition"));
        assert!(composed.contains("dominant colors #"));
    }

    #[test]
    fn test_apply_template_degrades() {
        assert_eq!(apply_template(None, "fox"), "fox");
        assert_eq!(apply_template(Some(&Failing), "fox"), "fox");

        let missing = ReferenceImageTemplater::new("/nonexistent/ref.png");
        assert_eq!(apply_template(Some(&missing), "fox"), "fox");
    }
}

//! Configuration types for first-page PDF-to-PNG conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The defaults reproduce the fixed
//! policy of the upload flow: a 2.0× render scale, a 50 MiB input ceiling and
//! PNG quality 0.95.

use crate::error::ConvertError;
use crate::progress::ProgressCallback;
use pdfium_loader::LoaderConfig;
use std::fmt;

/// Inputs above this many bytes are rejected: 50 MiB.
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

/// Page 1 is rendered at twice its nominal size.
pub const DEFAULT_RENDER_SCALE: f32 = 2.0;

pub const DEFAULT_PNG_QUALITY: f32 = 0.95;

/// Largest render surface, in pixels: 50 megapixels (200 MB of RGBA).
pub const DEFAULT_MAX_SURFACE_PIXELS: u64 = 50_000_000;

/// Configuration for a [`crate::convert::Converter`].
///
/// # Example
/// ```rust
/// use resumind_pdf2png::ConversionConfig;
///
/// let config = ConversionConfig::builder()
///     .scale(1.5)
///     .max_file_bytes(10 * 1024 * 1024)
///     .build()
///     .unwrap();
/// assert_eq!(config.scale, 1.5);
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// Render scale applied to the page size in PDF points. Range: 0.1–10. Default: 2.0.
    pub scale: f32,

    /// Largest accepted input in bytes. Default: 50 MiB.
    pub max_file_bytes: u64,

    /// PNG quality in `0.0..=1.0`. Default: 0.95.
    ///
    /// PNG is lossless, so quality only selects compression effort:
    /// `>= 0.9` best, `>= 0.5` default, anything lower fast.
    pub png_quality: f32,

    /// Pages whose viewport exceeds this many pixels are refused before
    /// rendering. Default: 50 megapixels.
    pub max_surface_pixels: u64,

    /// Where the PDFium library is loaded from.
    pub loader: LoaderConfig,

    /// Optional stage-by-stage progress events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            scale: DEFAULT_RENDER_SCALE,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            png_quality: DEFAULT_PNG_QUALITY,
            max_surface_pixels: DEFAULT_MAX_SURFACE_PIXELS,
            loader: LoaderConfig::from_env(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("scale", &self.scale)
            .field("max_file_bytes", &self.max_file_bytes)
            .field("png_quality", &self.png_quality)
            .field("max_surface_pixels", &self.max_surface_pixels)
            .field("loader", &self.loader)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl ConversionConfig {
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn scale(mut self, scale: f32) -> Self {
        self.config.scale = scale;
        self
    }

    pub fn max_file_bytes(mut self, bytes: u64) -> Self {
        self.config.max_file_bytes = bytes;
        self
    }

    /// Clamped to `0.0..=1.0`.
    pub fn png_quality(mut self, quality: f32) -> Self {
        self.config.png_quality = quality.clamp(0.0, 1.0);
        self
    }

    pub fn max_surface_pixels(mut self, pixels: u64) -> Self {
        self.config.max_surface_pixels = pixels;
        self
    }

    pub fn loader(mut self, loader: LoaderConfig) -> Self {
        self.config.loader = loader;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if !c.scale.is_finite() || !(0.1..=10.0).contains(&c.scale) {
            return Err(ConvertError::InvalidConfig(format!(
                "Render scale must be 0.1–10, got {}",
                c.scale
            )));
        }
        if c.max_file_bytes == 0 {
            return Err(ConvertError::InvalidConfig(
                "Maximum file size must be at least 1 byte".into(),
            ));
        }
        if c.max_surface_pixels == 0 {
            return Err(ConvertError::InvalidConfig(
                "Maximum surface size must be at least 1 pixel".into(),
            ));
        }
        if c.png_quality.is_nan() {
            return Err(ConvertError::InvalidConfig("PNG quality must be a number".into()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upload_policy() {
        let c = ConversionConfig::default();
        assert_eq!(c.scale, 2.0);
        assert_eq!(c.max_file_bytes, 52_428_800);
        assert_eq!(c.png_quality, 0.95);
        assert_eq!(c.max_surface_pixels, 50_000_000);
        assert!(c.progress_callback.is_none());
    }

    #[test]
    fn builder_rejects_bad_scale() {
        assert!(ConversionConfig::builder().scale(0.0).build().is_err());
        assert!(ConversionConfig::builder().scale(f32::NAN).build().is_err());
        assert!(ConversionConfig::builder().scale(11.0).build().is_err());
        assert!(ConversionConfig::builder().scale(0.5).build().is_ok());
    }

    #[test]
    fn builder_rejects_zero_limit() {
        let err = ConversionConfig::builder().max_file_bytes(0).build().unwrap_err();
        assert!(err.to_string().contains("at least 1 byte"));
    }

    #[test]
    fn builder_rejects_zero_surface() {
        let err = ConversionConfig::builder()
            .max_surface_pixels(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("at least 1 pixel"));
    }

    #[test]
    fn quality_is_clamped() {
        let c = ConversionConfig::builder().png_quality(3.0).build().unwrap();
        assert_eq!(c.png_quality, 1.0);
        let c = ConversionConfig::builder().png_quality(-1.0).build().unwrap();
        assert_eq!(c.png_quality, 0.0);
    }

    #[test]
    fn debug_hides_callback() {
        let dbg = format!("{:?}", ConversionConfig::default());
        assert!(dbg.contains("scale"));
        assert!(dbg.contains("progress_callback: None"));
    }
}

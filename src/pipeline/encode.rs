//! PNG encoding of the rendered surface and output file naming.
//!
//! PNG is lossless, so the 0–1 "quality" knob only picks how hard the
//! deflate stage works. Adaptive row filtering is used at every level.

use crate::error::ConvertError;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder, RgbaImage};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

pub const PNG_MIME: &str = "image/png";

/// Trailing `.pdf`, any case.
static RE_PDF_EXTENSION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\.pdf$").unwrap());

/// Map a quality in `0.0..=1.0` to deflate effort.
pub fn compression_for_quality(quality: f32) -> CompressionType {
    if quality >= 0.9 {
        CompressionType::Best
    } else if quality >= 0.5 {
        CompressionType::Default
    } else {
        CompressionType::Fast
    }
}

/// Encode an RGBA surface as PNG bytes.
pub fn encode_png(surface: &RgbaImage, quality: f32) -> Result<Vec<u8>, ConvertError> {
    let (width, height) = surface.dimensions();
    if width == 0 || height == 0 {
        return Err(ConvertError::Encode(format!(
            "surface is {width}x{height} px"
        )));
    }

    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        &mut buf,
        compression_for_quality(quality),
        FilterType::Adaptive,
    );
    encoder
        .write_image(surface.as_raw(), width, height, ExtendedColorType::Rgba8)
        .map_err(|e| ConvertError::Encode(e.to_string()))?;

    debug!("Encoded {}x{} surface → {} PNG bytes", width, height, buf.len());
    Ok(buf)
}

/// `resume.pdf` → `resume.png`; names without a `.pdf` suffix keep their
/// full text and gain `.png`. An empty stem becomes `document.png`.
pub fn output_file_name(original: &str) -> String {
    let stem = RE_PDF_EXTENSION.replace(original, "");
    if stem.is_empty() {
        "document.png".to_string()
    } else {
        format!("{stem}.png")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn encode_small_surface() {
        let img = RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 255]));
        let png = encode_png(&img, 0.95).expect("encode should succeed");
        assert!(png.starts_with(b"\x89PNG\r\n\x1a\n"));

        let decoded = image::load_from_memory_with_format(&png, image::ImageFormat::Png)
            .expect("valid png")
            .into_rgba8();
        assert_eq!(decoded.dimensions(), (10, 10));
        assert_eq!(decoded.get_pixel(3, 7), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn empty_surface_is_an_encode_failure() {
        let img = RgbaImage::new(0, 5);
        let err = encode_png(&img, 0.95).unwrap_err();
        assert!(matches!(err, ConvertError::Encode(_)));
    }

    #[test]
    fn quality_selects_effort() {
        assert!(matches!(compression_for_quality(0.95), CompressionType::Best));
        assert!(matches!(compression_for_quality(0.6), CompressionType::Default));
        assert!(matches!(compression_for_quality(0.1), CompressionType::Fast));
    }

    #[test]
    fn file_names() {
        assert_eq!(output_file_name("resume.pdf"), "resume.png");
        assert_eq!(output_file_name("Resume.PDF"), "Resume.png");
        assert_eq!(output_file_name("my.pdf.backup.pdf"), "my.pdf.backup.png");
        assert_eq!(output_file_name("notes"), "notes.png");
        assert_eq!(output_file_name("report.pdfx"), "report.pdfx.png");
        assert_eq!(output_file_name(".pdf"), "document.png");
    }
}

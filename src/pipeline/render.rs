//! Rasterise the first page of a document.
//!
//! The viewport is the page size in points multiplied by the render scale,
//! truncated to whole pixels the way a canvas truncates fractional
//! dimensions. The library must fill a surface of exactly that size, and
//! the surface may not exceed the configured pixel ceiling.

use crate::error::ConvertError;
use crate::pipeline::library::{PageSize, PdfLibrary};
use crate::progress::{ConversionProgressCallback, ConversionStage};
use image::RgbaImage;
use tracing::{debug, info};

/// Index of the page that gets rendered.
pub const FIRST_PAGE: usize = 0;

/// Pixel dimensions of a page at a given scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    /// Scale a page size in points. Non-finite or negative results collapse
    /// to zero.
    pub fn at_scale(page: PageSize, scale: f32) -> Self {
        let px = |points: f32| {
            let v = (points * scale).floor();
            if v.is_finite() && v > 0.0 {
                v.min(u32::MAX as f32) as u32
            } else {
                0
            }
        };
        Self {
            width: px(page.width),
            height: px(page.height),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn pixels(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Page 1 of a document, rasterised.
#[derive(Debug, Clone)]
pub struct RenderedPage {
    pub surface: RgbaImage,
    /// Total pages in the source document.
    pub page_count: usize,
}

/// Decode `bytes` and render page 1 at `scale`, refusing surfaces larger
/// than `max_pixels`.
///
/// Blocking; run it inside `spawn_blocking`.
pub fn render_first_page(
    library: &dyn PdfLibrary,
    bytes: Vec<u8>,
    scale: f32,
    max_pixels: u64,
    progress: &dyn ConversionProgressCallback,
) -> Result<RenderedPage, ConvertError> {
    progress.on_stage(ConversionStage::Decoding);
    let document = library.open(bytes)?;

    let page_count = document.page_count();
    if page_count == 0 {
        return Err(ConvertError::NoPages);
    }
    info!("PDF loaded ({}): {} pages", library.name(), page_count);

    let size = document.page_size(FIRST_PAGE)?;
    let viewport = Viewport::at_scale(size, scale);
    if viewport.is_empty() {
        return Err(ConvertError::Render {
            page: FIRST_PAGE + 1,
            detail: format!(
                "page size {}x{} pt has no area at scale {}",
                size.width, size.height, scale
            ),
        });
    }

    if viewport.pixels() > max_pixels {
        return Err(ConvertError::Render {
            page: FIRST_PAGE + 1,
            detail: format!(
                "{}x{} px exceeds the {} pixel limit",
                viewport.width, viewport.height, max_pixels
            ),
        });
    }

    progress.on_stage(ConversionStage::Rendering {
        width: viewport.width,
        height: viewport.height,
    });
    info!("Rendering page at {}x{}", viewport.width, viewport.height);

    let surface = document.render_page(FIRST_PAGE, viewport.width, viewport.height)?;
    if surface.dimensions() != (viewport.width, viewport.height) {
        return Err(ConvertError::Render {
            page: FIRST_PAGE + 1,
            detail: format!(
                "library produced {}x{} px, expected {}x{}",
                surface.width(),
                surface.height(),
                viewport.width,
                viewport.height
            ),
        });
    }
    debug!("Rendered page {} → {}x{} px", FIRST_PAGE + 1, surface.width(), surface.height());

    Ok(RenderedPage {
        surface,
        page_count,
    })
}

//! PDFium-backed [`PdfLibrary`], loaded through `pdfium-loader`.
//!
//! `pdfium-render` is built with `thread_safe` and `sync`, so one bound [`Pdfium`] can
//! be shared behind an `Arc` and used from any blocking-pool thread.

use crate::error::ConvertError;
use crate::pipeline::library::{LibraryLoader, LoadedDocument, PageSize, PdfLibrary};
use image::RgbaImage;
use pdfium_loader::{LoaderConfig, PdfiumLoader};
use pdfium_render::prelude::*;
use std::sync::Arc;
use tracing::{debug, info};

/// Download progress hook: `(bytes_downloaded, total_bytes)`.
pub type DownloadProgressFn = Arc<dyn Fn(u64, Option<u64>) + Send + Sync>;

/// Loads PDFium according to a [`LoaderConfig`].
#[derive(Clone)]
pub struct PdfiumLibraryLoader {
    loader: PdfiumLoader,
    on_download: Option<DownloadProgressFn>,
}

impl PdfiumLibraryLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            loader: PdfiumLoader::new(config),
            on_download: None,
        }
    }

    /// Report download progress when the library is not cached yet.
    pub fn with_download_progress(mut self, on_download: DownloadProgressFn) -> Self {
        self.on_download = Some(on_download);
        self
    }

    /// `true` when loading will not need the network.
    pub fn is_cached(&self) -> bool {
        self.loader.cached_path().is_some()
    }
}

impl LibraryLoader for PdfiumLibraryLoader {
    fn check_host(&self) -> Result<(), ConvertError> {
        self.loader
            .host_support()
            .map_err(|e| ConvertError::EnvironmentUnsupported {
                reason: e.to_string(),
            })
    }

    fn load(&self) -> Result<Arc<dyn PdfLibrary>, ConvertError> {
        info!("Loading PDFium library");
        let progress = self.on_download.as_deref().map(|f| f as &dyn Fn(u64, Option<u64>));
        let pdfium = self
            .loader
            .bind(progress)
            .map_err(|e| ConvertError::LibraryLoad(e.to_string()))?;
        Ok(Arc::new(PdfiumLibrary { pdfium }))
    }
}

/// A bound PDFium instance.
pub struct PdfiumLibrary {
    pdfium: Pdfium,
}

impl PdfiumLibrary {
    pub fn new(pdfium: Pdfium) -> Self {
        Self { pdfium }
    }
}

impl PdfLibrary for PdfiumLibrary {
    fn name(&self) -> &str {
        "PDFium"
    }

    fn open<'a>(&'a self, bytes: Vec<u8>) -> Result<Box<dyn LoadedDocument + 'a>, ConvertError> {
        let document = self
            .pdfium
            .load_pdf_from_byte_vec(bytes, None)
            .map_err(|e| ConvertError::Decode(format!("{e:?}")))?;
        debug!("PDFium opened document, version {:?}", document.version());
        Ok(Box::new(PdfiumDocument { document }))
    }
}

struct PdfiumDocument<'a> {
    document: PdfDocument<'a>,
}

impl PdfiumDocument<'_> {
    fn page(&self, index: usize) -> Result<PdfPage<'_>, ConvertError> {
        let render_err = |detail: String| ConvertError::Render {
            page: index + 1,
            detail,
        };
        let index = u16::try_from(index).map_err(|_| render_err("page index out of range".into()))?;
        self.document
            .pages()
            .get(index)
            .map_err(|e| render_err(format!("{e:?}")))
    }
}

impl LoadedDocument for PdfiumDocument<'_> {
    fn page_count(&self) -> usize {
        self.document.pages().len() as usize
    }

    fn page_size(&self, index: usize) -> Result<PageSize, ConvertError> {
        let page = self.page(index)?;
        Ok(PageSize {
            width: page.width().value,
            height: page.height().value,
        })
    }

    fn render_page(&self, index: usize, width: u32, height: u32) -> Result<RgbaImage, ConvertError> {
        let page = self.page(index)?;
        let to_px = |v: u32| i32::try_from(v).unwrap_or(i32::MAX);
        let config = PdfRenderConfig::new()
            .set_target_size(to_px(width), to_px(height))
            .render_form_data(true);

        let bitmap = page
            .render_with_config(&config)
            .map_err(|e| ConvertError::Render {
                page: index + 1,
                detail: format!("{e:?}"),
            })?;

        Ok(bitmap.as_image().into_rgba8())
    }
}

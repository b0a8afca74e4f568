//! Shared fakes for the integration tests.
//!
//! `FakeLibrary` "decodes" any byte stream that starts with `%PDF` and
//! contains `/Count N`, producing N US-Letter pages. Everything else is a
//! decode failure. `FakeLoader` counts how often it is asked to load.

#![allow(dead_code)]

use image::{Rgba, RgbaImage};
use resumind_pdf2png::{
    ConversionConfig, ConvertError, Converter, LibraryLoader, LoadedDocument, ObjectUrlStore,
    PageSize, PdfLibrary,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const LETTER: PageSize = PageSize {
    width: 612.0,
    height: 792.0,
};

/// A well-formed single-page document for the fake library.
pub fn one_page_pdf() -> Vec<u8> {
    b"%PDF-1.7\n1 0 obj << /Type /Pages /Count 1 >> endobj\n%%EOF\n".to_vec()
}

pub fn pdf_with_pages(n: usize) -> Vec<u8> {
    format!("%PDF-1.7\n1 0 obj << /Type /Pages /Count {n} >> endobj\n%%EOF\n").into_bytes()
}

pub struct FakeLibrary {
    /// Fail every render with this message.
    pub render_error: Option<String>,
    pub page_size: PageSize,
    pub renders: Arc<AtomicUsize>,
}

struct FakeDocument {
    pages: usize,
    render_error: Option<String>,
    page_size: PageSize,
    renders: Arc<AtomicUsize>,
}

impl LoadedDocument for FakeDocument {
    fn page_count(&self) -> usize {
        self.pages
    }

    fn page_size(&self, _index: usize) -> Result<PageSize, ConvertError> {
        Ok(self.page_size)
    }

    fn render_page(&self, index: usize, width: u32, height: u32) -> Result<RgbaImage, ConvertError> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        if let Some(detail) = &self.render_error {
            return Err(ConvertError::Render {
                page: index + 1,
                detail: detail.clone(),
            });
        }
        Ok(RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])))
    }
}

impl PdfLibrary for FakeLibrary {
    fn name(&self) -> &str {
        "fake"
    }

    fn open<'a>(&'a self, bytes: Vec<u8>) -> Result<Box<dyn LoadedDocument + 'a>, ConvertError> {
        if !bytes.starts_with(b"%PDF") {
            return Err(ConvertError::Decode("Invalid PDF structure".into()));
        }
        let text = String::from_utf8_lossy(&bytes);
        let pages = text
            .split("/Count ")
            .nth(1)
            .and_then(|rest| rest.split_whitespace().next())
            .and_then(|n| n.parse::<usize>().ok())
            .ok_or_else(|| ConvertError::Decode("missing page tree".into()))?;
        Ok(Box::new(FakeDocument {
            pages,
            render_error: self.render_error.clone(),
            page_size: self.page_size,
            renders: Arc::clone(&self.renders),
        }))
    }
}

/// Loader that counts loads and can fail the first `fail_first` of them.
pub struct FakeLoader {
    pub loads: AtomicUsize,
    pub fail_first: usize,
    pub host_supported: bool,
    pub load_delay: Duration,
    pub render_error: Option<String>,
    /// Size reported for every page.
    pub page_size: PageSize,
    /// Calls to `render_page` across all loaded libraries.
    pub renders: Arc<AtomicUsize>,
}

impl Default for FakeLoader {
    fn default() -> Self {
        Self {
            loads: AtomicUsize::new(0),
            fail_first: 0,
            host_supported: true,
            load_delay: Duration::ZERO,
            render_error: None,
            page_size: LETTER,
            renders: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl FakeLoader {
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    pub fn render_count(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl LibraryLoader for FakeLoader {
    fn check_host(&self) -> Result<(), ConvertError> {
        if self.host_supported {
            Ok(())
        } else {
            Err(ConvertError::EnvironmentUnsupported {
                reason: "no rendering host".into(),
            })
        }
    }

    fn load(&self) -> Result<Arc<dyn PdfLibrary>, ConvertError> {
        let attempt = self.loads.fetch_add(1, Ordering::SeqCst);
        if !self.load_delay.is_zero() {
            std::thread::sleep(self.load_delay);
        }
        if attempt < self.fail_first {
            return Err(ConvertError::LibraryLoad("library fetch failed".into()));
        }
        Ok(Arc::new(FakeLibrary {
            render_error: self.render_error.clone(),
            page_size: self.page_size,
            renders: Arc::clone(&self.renders),
        }))
    }
}

/// A converter over `loader` with its own object URL store.
pub fn converter_with(loader: Arc<FakeLoader>) -> Converter {
    converter_with_config(loader, ConversionConfig::default())
}

pub fn converter_with_config(loader: Arc<FakeLoader>, config: ConversionConfig) -> Converter {
    Converter::with_loader(config, loader).with_object_store(Arc::new(ObjectUrlStore::new()))
}

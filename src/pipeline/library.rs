//! The seam between the converter and the PDF rendering library.
//!
//! [`LibraryLoader`] produces a [`PdfLibrary`] once per converter; the
//! library opens documents as [`LoadedDocument`]s. Production code uses the
//! PDFium implementation in [`crate::pdfium`]. Tests plug in in-memory
//! fakes, which is how load memoisation and the failure taxonomy are
//! exercised without a native library.
//!
//! All methods are blocking. The converter calls them from
//! `tokio::task::spawn_blocking`.

use crate::error::ConvertError;
use image::RgbaImage;
use std::sync::Arc;

/// Page dimensions in PDF points (1/72 inch).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// An open document. Page indices are 0-based.
pub trait LoadedDocument {
    fn page_count(&self) -> usize;

    fn page_size(&self, index: usize) -> Result<PageSize, ConvertError>;

    /// Rasterise page `index` into exactly `width × height` pixels.
    fn render_page(&self, index: usize, width: u32, height: u32)
        -> Result<RgbaImage, ConvertError>;
}

/// A loaded rendering library.
pub trait PdfLibrary: Send + Sync {
    /// Human-readable library name for logs.
    fn name(&self) -> &str;

    /// Decode a document held in memory.
    ///
    /// Corrupt input must come back as [`ConvertError::Decode`].
    fn open<'a>(&'a self, bytes: Vec<u8>) -> Result<Box<dyn LoadedDocument + 'a>, ConvertError>;
}

/// Knows whether the host can run a [`PdfLibrary`] and how to load it.
pub trait LibraryLoader: Send + Sync {
    /// Cheap check run before input validation.
    ///
    /// Failures must be [`ConvertError::EnvironmentUnsupported`].
    fn check_host(&self) -> Result<(), ConvertError>;

    /// Load the library. May download or bind native code.
    ///
    /// Failures must be [`ConvertError::LibraryLoad`].
    fn load(&self) -> Result<Arc<dyn PdfLibrary>, ConvertError>;
}

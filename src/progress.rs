//! Progress-callback trait for conversion stage events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to follow a
//! conversion as it moves through library load, decode, render and encode.
//! The CLI drives its spinner from these events; the upload server leaves
//! the callback unset.
//!
//! # Example
//!
//! ```rust
//! use resumind_pdf2png::{ConversionConfig, ConversionProgressCallback, ConversionStage};
//! use std::sync::Arc;
//!
//! struct PrintStages;
//!
//! impl ConversionProgressCallback for PrintStages {
//!     fn on_stage(&self, stage: ConversionStage) {
//!         eprintln!("{stage}");
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(PrintStages))
//!     .build()
//!     .unwrap();
//! ```

use std::fmt;
use std::sync::Arc;

/// A step of a single conversion, in the order they occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConversionStage {
    LoadingLibrary,
    Decoding,
    /// Page 1 is being rasterised into a surface of this size.
    Rendering { width: u32, height: u32 },
    Encoding,
}

impl fmt::Display for ConversionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversionStage::LoadingLibrary => f.write_str("Loading PDF engine"),
            ConversionStage::Decoding => f.write_str("Loading PDF document"),
            ConversionStage::Rendering { width, height } => {
                write!(f, "Rendering page at {width}x{height}")
            }
            ConversionStage::Encoding => f.write_str("Encoding PNG"),
        }
    }
}

/// Called by [`crate::convert::Converter`] as a conversion proceeds.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`; several
/// conversions may share one callback.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called when a stage begins. Validation failures happen before any stage.
    fn on_stage(&self, stage: ConversionStage) {
        let _ = stage;
    }

    /// Called once with the output file name and PNG size in bytes.
    fn on_complete(&self, file_name: &str, png_bytes: usize) {
        let _ = (file_name, png_bytes);
    }

    /// Called once with the message that ends up in the result.
    fn on_error(&self, message: &str) {
        let _ = message;
    }
}

/// A no-op implementation, used when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

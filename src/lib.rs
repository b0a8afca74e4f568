//! # resumind-pdf2png
//!
//! Render the first page of a PDF into a PNG image, for resume previews.
//!
//! Decoding and rasterisation are delegated to PDFium (via `pdfium-render`);
//! this crate validates the upload, loads the library once, sizes the
//! viewport, encodes the PNG and hands back a named file plus a process-local
//! object URL. Every failure is reported inside the result, never as an
//! `Err` or a panic.
//!
//! ## Pipeline Overview
//!
//! ```text
//! InputFile
//!  │
//!  ├─ 1. Host     can PDFium run here? (platform / explicit library path)
//!  ├─ 2. Validate application/pdf, non-empty, ≤ 50 MiB
//!  ├─ 3. Library  load PDFium once, memoised (spawn_blocking)
//!  ├─ 4. Decode   open from memory, reject zero pages
//!  ├─ 5. Render   page 1 at 2.0× into an RGBA surface of the viewport size
//!  ├─ 6. Encode   PNG, quality 0.95
//!  └─ 7. Output   `<name>.png` + `blob:resumind/<uuid>`
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use resumind_pdf2png::{convert_pdf_to_image, InputFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let file = InputFile::from_path("resume.pdf").await?;
//!     let result = convert_pdf_to_image(&file).await;
//!     if let Some(err) = result.error() {
//!         eprintln!("{err}");
//!     } else if let Some(png) = result.file() {
//!         png.write_to_dir(".").await?;
//!         println!("{} → {}", png.name(), result.image_url());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `server` | via cli | Upload front end on `tiny_http` |
//! | `cli`    | on      | The `pdf2png` binary (clap + anyhow + tracing-subscriber + indicatif) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod navbar;
pub mod object_url;
pub mod output;
pub mod pdfium;
pub mod pipeline;
pub mod progress;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ConversionConfig, ConversionConfigBuilder};
pub use convert::{convert_pdf_to_image, default_converter, Converter};
pub use error::{ConvertError, FailureKind};
pub use navbar::{NavLink, Navbar};
pub use object_url::{global_store, ObjectUrl, ObjectUrlStore};
pub use output::{ImageFile, PdfConversionResult};
pub use pdfium::{PdfiumLibrary, PdfiumLibraryLoader};
pub use pipeline::input::InputFile;
pub use pipeline::library::{LibraryLoader, LoadedDocument, PageSize, PdfLibrary};
pub use progress::{ConversionProgressCallback, ConversionStage, ProgressCallback};
pub use pdfium_loader::LoaderConfig;

//! Pipeline stages for first-page PDF-to-PNG conversion.
//!
//! Each submodule implements exactly one step. [`crate::convert::Converter`]
//! strings them together; only the converter deals with tokio tasks and
//! memoisation.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ library ──▶ render ──▶ encode
//! (checks)   (PDFium)   (page 1)   (PNG + name)
//! ```
//!
//! 1. [`input`]   — the uploaded bytes and their up-front validation
//! 2. [`library`] — the seam to the rendering library (PDFium in production,
//!    in-memory fakes in tests)
//! 3. [`render`]  — decode the document, size the viewport, rasterise page 1
//! 4. [`encode`]  — PNG-encode the surface and derive the output file name

pub mod encode;
pub mod input;
pub mod library;
pub mod render;

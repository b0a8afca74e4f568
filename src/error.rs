//! Error types for the resumind-pdf2png library.
//!
//! [`ConvertError`] describes every way a conversion can fail. It never
//! escapes [`crate::convert::Converter::convert`]: the converter folds it into
//! [`crate::output::PdfConversionResult::error`] as a human-readable message.
//! Callers that want to branch on the failure category use
//! [`ConvertError::kind`] instead of matching on message text.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Coarse failure category reported alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The host cannot run the rendering library.
    Environment,
    /// Wrong type, empty, or oversized input.
    InvalidInput,
    LibraryLoad,
    /// Corrupt document or a document without pages.
    Decode,
    Render,
    Encode,
    Internal,
}

/// All failures of a single conversion.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Host ──────────────────────────────────────────────────────────────
    /// No rendering-capable host (unsupported platform, missing library).
    #[error("PDF conversion is not available in this environment: {reason}")]
    EnvironmentUnsupported { reason: String },

    // ── Input ─────────────────────────────────────────────────────────────
    #[error("Invalid file: Must be a PDF (got '{mime_type}')")]
    NotAPdf { mime_type: String },

    #[error("File is empty")]
    EmptyFile,

    #[error("Could not read '{path}': {detail}")]
    Unreadable { path: PathBuf, detail: String },

    #[error("File too large: Maximum {}MB allowed (got {size} bytes)", .limit / (1024 * 1024))]
    FileTooLarge { size: u64, limit: u64 },

    // ── Library ───────────────────────────────────────────────────────────
    #[error("Failed to load PDF rendering library: {0}")]
    LibraryLoad(String),

    // ── Document ──────────────────────────────────────────────────────────
    /// The byte stream could not be parsed as a PDF.
    #[error("PDF document is invalid: {0}")]
    Decode(String),

    #[error("PDF document is invalid or has no pages")]
    NoPages,

    #[error("Failed to render page {page}: {detail}")]
    Render { page: usize, detail: String },

    /// The rendered surface could not be turned into PNG bytes.
    #[error("Failed to create image blob: {0}")]
    Encode(String),

    // ── Config ────────────────────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ConvertError::EnvironmentUnsupported { .. } => FailureKind::Environment,
            ConvertError::NotAPdf { .. }
            | ConvertError::EmptyFile
            | ConvertError::Unreadable { .. }
            | ConvertError::FileTooLarge { .. } => FailureKind::InvalidInput,
            ConvertError::LibraryLoad(_) => FailureKind::LibraryLoad,
            ConvertError::Decode(_) | ConvertError::NoPages => FailureKind::Decode,
            ConvertError::Render { .. } => FailureKind::Render,
            ConvertError::Encode(_) => FailureKind::Encode,
            ConvertError::InvalidConfig(_) | ConvertError::Internal(_) => FailureKind::Internal,
        }
    }

    /// Message stored in a failed [`crate::output::PdfConversionResult`].
    pub fn result_message(&self) -> String {
        format!("Failed to convert PDF: {self}")
    }
}

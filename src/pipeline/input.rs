//! The uploaded file and its validation.
//!
//! Validation runs before the rendering library is touched, so bad uploads
//! never pay for a library load. The checks run in a fixed order: MIME type,
//! emptiness, size ceiling. The host check happens earlier still, in the
//! converter.

use crate::error::ConvertError;
use std::fmt;
use std::path::Path;
use tracing::debug;

pub const PDF_MIME: &str = "application/pdf";

/// Fallback MIME type for anything that is not recognisably a PDF.
pub const OCTET_STREAM_MIME: &str = "application/octet-stream";

/// An opaque binary file: name, declared MIME type and contents.
#[derive(Clone, PartialEq, Eq)]
pub struct InputFile {
    name: String,
    mime_type: String,
    bytes: Vec<u8>,
}

impl InputFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, detecting its MIME type with [`sniff_mime`].
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());
        let mime_type = sniff_mime(&name, &bytes);
        debug!("Read {} ({} bytes, {})", path.display(), bytes.len(), mime_type);
        Ok(Self::new(name, mime_type, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Byte length of the contents.
    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl fmt::Debug for InputFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

/// Best-effort MIME detection: `%PDF` magic bytes win, then a `.pdf`
/// extension, else `application/octet-stream`.
///
/// An empty file named `*.pdf` is still reported as a PDF so that validation
/// can reject it as empty rather than as the wrong type.
pub fn sniff_mime(name: &str, bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"%PDF") {
        return PDF_MIME;
    }
    let is_pdf_name = Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if is_pdf_name {
        PDF_MIME
    } else {
        OCTET_STREAM_MIME
    }
}

/// `true` when `mime_type` names a PDF, ignoring case and parameters such as
/// `; charset=binary`.
pub fn is_pdf_mime(mime_type: &str) -> bool {
    let essence = mime_type.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case(PDF_MIME)
}

/// Check type, emptiness and size, in that order.
pub fn validate(file: &InputFile, max_bytes: u64) -> Result<(), ConvertError> {
    if !is_pdf_mime(file.mime_type()) {
        return Err(ConvertError::NotAPdf {
            mime_type: file.mime_type().to_string(),
        });
    }

    if file.size() == 0 {
        return Err(ConvertError::EmptyFile);
    }

    if file.size() > max_bytes {
        return Err(ConvertError::FileTooLarge {
            size: file.size(),
            limit: max_bytes,
        });
    }

    Ok(())
}

//! Conversion output types.
//!
//! [`PdfConversionResult`] always carries exactly one of: an image URL plus
//! an [`ImageFile`], or an error message. The constructors are the only way
//! to build one, so the invariant holds for every value in the program.

use crate::error::{ConvertError, FailureKind};
use crate::pipeline::encode::PNG_MIME;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A named, in-memory image file.
#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageFile {
    name: String,
    mime_type: String,
    size: usize,
    #[serde(skip)]
    bytes: Arc<[u8]>,
}

impl ImageFile {
    /// A PNG file with the given name.
    pub fn png(name: impl Into<String>, bytes: Arc<[u8]>) -> Self {
        Self {
            name: name.into(),
            mime_type: PNG_MIME.to_string(),
            size: bytes.len(),
            bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Shared handle to the contents.
    pub fn shared_bytes(&self) -> Arc<[u8]> {
        Arc::clone(&self.bytes)
    }

    /// `data:image/png;base64,…`
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }

    /// Write to `dir/<name>` and return the path.
    ///
    /// Only the final component of the name is used, so names carrying
    /// directories (`../../x.png`) stay inside `dir`.
    pub async fn write_to_dir(&self, dir: impl AsRef<Path>) -> std::io::Result<PathBuf> {
        let file_name = Path::new(&self.name)
            .file_name()
            .unwrap_or_else(|| OsStr::new("document.png"));
        let path = dir.as_ref().join(file_name);
        self.write_to(&path).await?;
        Ok(path)
    }

    pub async fn write_to(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        tokio::fs::write(path, &self.bytes).await
    }
}

impl fmt::Debug for ImageFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.size)
            .finish()
    }
}

/// Outcome of one conversion.
///
/// Serialises as `{"imageUrl": …, "file": {…} | null, "error"?: …, "errorKind"?: …}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PdfConversionResult {
    image_url: String,
    file: Option<ImageFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_kind: Option<FailureKind>,
}

impl PdfConversionResult {
    pub fn success(image_url: impl Into<String>, file: ImageFile) -> Self {
        Self {
            image_url: image_url.into(),
            file: Some(file),
            error: None,
            error_kind: None,
        }
    }

    pub fn failure(error: &ConvertError) -> Self {
        Self {
            image_url: String::new(),
            file: None,
            error: Some(error.result_message()),
            error_kind: Some(error.kind()),
        }
    }

    /// Empty on failure.
    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    pub fn file(&self) -> Option<&ImageFile> {
        self.file.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn error_kind(&self) -> Option<FailureKind> {
        self.error_kind
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// `Ok((image_url, file))` or `Err(message)`.
    pub fn into_result(self) -> Result<(String, ImageFile), String> {
        match (self.file, self.error) {
            (Some(file), None) => Ok((self.image_url, file)),
            (_, Some(error)) => Err(error),
            (None, None) => Err("conversion produced no output".to_string()),
        }
    }
}

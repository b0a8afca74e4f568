//! Conversion entry points.
//!
//! [`Converter::convert`] runs the whole chain for one file and folds every
//! failure into the returned [`PdfConversionResult`]; it has no error path of
//! its own. The rendering library is loaded on first use and memoised in the
//! converter: once a load succeeds, later calls reuse it. A failed load is not
//! remembered, so the next call tries again.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::object_url::{global_store, ObjectUrlStore};
use crate::output::{ImageFile, PdfConversionResult};
use crate::pdfium::PdfiumLibraryLoader;
use crate::pipeline::encode::{self, PNG_MIME};
use crate::pipeline::input::{self, InputFile};
use crate::pipeline::library::{LibraryLoader, PdfLibrary};
use crate::pipeline::render;
use crate::progress::{ConversionProgressCallback, ConversionStage, NoopProgressCallback};
use once_cell::sync::Lazy;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::OnceCell;
use tracing::{debug, error, info, warn};

static DEFAULT_CONVERTER: Lazy<Converter> =
    Lazy::new(|| Converter::new(ConversionConfig::default()));

/// The process-wide converter used by [`convert_pdf_to_image`].
///
/// Uses [`ConversionConfig::default`], PDFium, and the global object URL
/// store.
pub fn default_converter() -> &'static Converter {
    &DEFAULT_CONVERTER
}

/// Convert the first page of `file` to PNG with the process-wide converter.
///
/// # Example
/// ```rust,no_run
/// use resumind_pdf2png::{convert_pdf_to_image, InputFile};
///
/// # async fn run() -> std::io::Result<()> {
/// let file = InputFile::from_path("resume.pdf").await?;
/// let result = convert_pdf_to_image(&file).await;
/// match result.error() {
///     None => println!("{}", result.image_url()),
///     Some(msg) => eprintln!("{msg}"),
/// }
/// # Ok(())
/// # }
/// ```
pub async fn convert_pdf_to_image(file: &InputFile) -> PdfConversionResult {
    default_converter().convert(file).await
}

/// Converts first pages of PDFs into PNG files.
pub struct Converter {
    config: ConversionConfig,
    loader: Arc<dyn LibraryLoader>,
    library: OnceCell<Arc<dyn PdfLibrary>>,
    objects: Arc<ObjectUrlStore>,
}

impl Converter {
    /// A PDFium-backed converter registering URLs in the global store.
    pub fn new(config: ConversionConfig) -> Self {
        let loader = Arc::new(PdfiumLibraryLoader::new(config.loader.clone()));
        Self::with_loader(config, loader)
    }

    /// A converter using a custom rendering library loader.
    pub fn with_loader(config: ConversionConfig, loader: Arc<dyn LibraryLoader>) -> Self {
        Self {
            config,
            loader,
            library: OnceCell::new(),
            objects: global_store(),
        }
    }

    /// Register object URLs in `store` instead of the global one.
    pub fn with_object_store(mut self, store: Arc<ObjectUrlStore>) -> Self {
        self.objects = store;
        self
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    pub fn object_store(&self) -> &Arc<ObjectUrlStore> {
        &self.objects
    }

    /// `true` once a library load has succeeded.
    pub fn is_library_loaded(&self) -> bool {
        self.library.initialized()
    }

    /// Convert the first page of `file`. Never fails; check
    /// [`PdfConversionResult::error`].
    pub async fn convert(&self, file: &InputFile) -> PdfConversionResult {
        let start = Instant::now();
        info!("Starting PDF conversion for file: {}", file.name());

        match self.try_convert(file).await {
            Ok(result) => {
                info!(
                    "Conversion successful in {}ms: {}",
                    start.elapsed().as_millis(),
                    result.image_url()
                );
                result
            }
            Err(e) => {
                error!("PDF conversion error: {}", e);
                let result = PdfConversionResult::failure(&e);
                if let Some(message) = result.error() {
                    self.progress().on_error(message);
                }
                result
            }
        }
    }

    /// Read `path` and convert it. Read failures are reported in the result.
    pub async fn convert_path(&self, path: impl AsRef<Path>) -> PdfConversionResult {
        let path = path.as_ref();
        match InputFile::from_path(path).await {
            Ok(file) => self.convert(&file).await,
            Err(e) => {
                warn!("Could not read {}: {}", path.display(), e);
                let err = ConvertError::Unreadable {
                    path: path.to_path_buf(),
                    detail: e.to_string(),
                };
                let result = PdfConversionResult::failure(&err);
                if let Some(message) = result.error() {
                    self.progress().on_error(message);
                }
                result
            }
        }
    }

    async fn try_convert(&self, file: &InputFile) -> Result<PdfConversionResult, ConvertError> {
        self.loader.check_host()?;
        input::validate(file, self.config.max_file_bytes)?;

        let library = self.library().await?;

        let bytes = file.bytes().to_vec();
        let scale = self.config.scale;
        let quality = self.config.png_quality;
        let max_pixels = self.config.max_surface_pixels;
        let progress = self.progress();

        let (png, page_count) = tokio::task::spawn_blocking(move || {
            let page = render::render_first_page(
                library.as_ref(),
                bytes,
                scale,
                max_pixels,
                progress.as_ref(),
            )?;
            progress.on_stage(ConversionStage::Encoding);
            let png = encode::encode_png(&page.surface, quality)?;
            Ok::<_, ConvertError>((png, page.page_count))
        })
        .await
        .map_err(|e| ConvertError::Internal(format!("Render task panicked: {e}")))??;

        if page_count > 1 {
            debug!("Rendered page 1 of {} for {}", page_count, file.name());
        }

        let png: Arc<[u8]> = Arc::from(png);
        let image_file = ImageFile::png(encode::output_file_name(file.name()), Arc::clone(&png));
        let url = self.objects.create(PNG_MIME, png);

        self.progress()
            .on_complete(image_file.name(), image_file.size());
        Ok(PdfConversionResult::success(url.to_string(), image_file))
    }

    /// The memoised library, loading it on first use.
    async fn library(&self) -> Result<Arc<dyn PdfLibrary>, ConvertError> {
        if let Some(library) = self.library.get() {
            return Ok(Arc::clone(library));
        }

        self.progress().on_stage(ConversionStage::LoadingLibrary);
        let library = self
            .library
            .get_or_try_init(|| async {
                let loader = Arc::clone(&self.loader);
                tokio::task::spawn_blocking(move || loader.load())
                    .await
                    .map_err(|e| ConvertError::Internal(format!("Library load task panicked: {e}")))?
            })
            .await?;
        info!("PDF rendering library ready: {}", library.name());
        Ok(Arc::clone(library))
    }

    fn progress(&self) -> Arc<dyn ConversionProgressCallback> {
        match &self.config.progress_callback {
            Some(cb) => Arc::clone(cb),
            None => Arc::new(NoopProgressCallback),
        }
    }
}

//! # pdfium-loader
//!
//! Locate, download, cache and bind the [PDFium](https://pdfium.googlesource.com/pdfium/)
//! shared library used by `pdfium-render`.
//!
//! ## Resolution order
//!
//! [`PdfiumLoader::locate`] resolves the library in this order:
//!
//! 1. an explicit [`LoaderConfig::library_path`] (or `PDFIUM_LIB_PATH`);
//! 2. the per-version cache directory;
//! 3. a download of the platform archive from
//!    [`LoaderConfig::release_base_url`], extracted into the cache.
//!
//! Step 3 is skipped when [`LoaderConfig::allow_download`] is `false`.
//!
//! ```rust,no_run
//! use pdfium_loader::{LoaderConfig, PdfiumLoader};
//!
//! let loader = PdfiumLoader::new(LoaderConfig::from_env());
//! loader.host_support().expect("no PDFium build for this host");
//! let pdfium = loader.bind(None).expect("PDFium unavailable");
//! ```
//!
//! ## Environment variable overrides
//!
//! - `PDFIUM_LIB_PATH` — path to an existing pdfium library; skips download.
//! - `PDFIUM_LOADER_CACHE_DIR` — override the default cache directory.
//! - `PDFIUM_RELEASE_URL` — override the release download base URL.
//! - `PDFIUM_NO_DOWNLOAD` — `1`/`true` forbids network access.

use std::io::Read;
use std::path::{Path, PathBuf};

use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{debug, info, warn};

// ── Public constants ─────────────────────────────────────────────────────────

/// The pdfium-binaries release tag used for downloads.
pub const DEFAULT_PDFIUM_VERSION: &str = "7690";

/// GitHub release base URL of `bblanchon/pdfium-binaries`.
pub const DEFAULT_RELEASE_URL: &str =
    "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Callback receiving `(bytes_downloaded, total_bytes)` during a download.
pub type DownloadProgress<'a> = &'a dyn Fn(u64, Option<u64>);

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum PdfiumLoaderError {
    /// No PDFium build exists for this OS/architecture combination.
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    /// An explicitly configured library path does not exist.
    #[error("PDFium library not found at '{path}'")]
    LibraryNotFound { path: PathBuf },

    /// The library is not cached and downloads are disabled.
    #[error("PDFium library is not cached at '{expected}' and downloads are disabled")]
    DownloadDisabled { expected: PathBuf },

    #[error("Cache directory error: {0}")]
    CacheDir(#[source] std::io::Error),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Archive extraction failed: {0}")]
    Extract(String),

    /// `pdfium-render` could not load the library.
    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

// ── Platform metadata ────────────────────────────────────────────────────────

/// Where to find the PDFium library for one OS/architecture pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformInfo {
    /// Asset filename in the release, e.g. `pdfium-linux-x64.tgz`.
    pub archive_name: &'static str,
    /// Relative path inside the archive, e.g. `lib/libpdfium.so`.
    pub lib_path_in_archive: &'static str,
    /// Filename written to the cache, e.g. `libpdfium.so`.
    pub lib_name: &'static str,
}

/// Platform info for the running host.
pub fn detect_platform() -> Result<PlatformInfo, PdfiumLoaderError> {
    platform_for(std::env::consts::OS, std::env::consts::ARCH)
}

/// Platform info for an arbitrary `(os, arch)` pair, using the names of
/// [`std::env::consts`].
pub fn platform_for(os: &str, arch: &str) -> Result<PlatformInfo, PdfiumLoaderError> {
    const DYLIB: (&str, &str) = ("lib/libpdfium.dylib", "libpdfium.dylib");
    const SO: (&str, &str) = ("lib/libpdfium.so", "libpdfium.so");
    const DLL: (&str, &str) = ("bin/pdfium.dll", "pdfium.dll");

    let (archive_name, (lib_path_in_archive, lib_name)) = match (os, arch) {
        ("macos", "aarch64") => ("pdfium-mac-arm64.tgz", DYLIB),
        ("macos", "x86_64") => ("pdfium-mac-x64.tgz", DYLIB),
        ("linux", "x86_64") => ("pdfium-linux-x64.tgz", SO),
        ("linux", "aarch64") => ("pdfium-linux-arm64.tgz", SO),
        ("windows", "x86_64") => ("pdfium-win-x64.tgz", DLL),
        ("windows", "aarch64") => ("pdfium-win-arm64.tgz", DLL),
        ("windows", "x86") => ("pdfium-win-x86.tgz", DLL),
        (os, arch) => {
            return Err(PdfiumLoaderError::UnsupportedPlatform {
                os: os.to_string(),
                arch: arch.to_string(),
            })
        }
    };

    Ok(PlatformInfo {
        archive_name,
        lib_path_in_archive,
        lib_name,
    })
}

// ── Configuration ────────────────────────────────────────────────────────────

/// Where the PDFium library comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderConfig {
    /// Use this library file and nothing else.
    pub library_path: Option<PathBuf>,
    /// Base cache directory; the version subdirectory is appended.
    pub cache_dir: Option<PathBuf>,
    /// Release base URL the platform archive is fetched from.
    pub release_base_url: String,
    /// pdfium-binaries release tag.
    pub version: String,
    /// Permit network access when the library is not cached.
    pub allow_download: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            library_path: None,
            cache_dir: None,
            release_base_url: DEFAULT_RELEASE_URL.to_string(),
            version: DEFAULT_PDFIUM_VERSION.to_string(),
            allow_download: true,
        }
    }
}

impl LoaderConfig {
    /// Defaults overridden by the `PDFIUM_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(path) = env_non_empty("PDFIUM_LIB_PATH") {
            config.library_path = Some(PathBuf::from(path));
        }
        if let Some(dir) = env_non_empty("PDFIUM_LOADER_CACHE_DIR") {
            config.cache_dir = Some(PathBuf::from(dir));
        }
        if let Some(url) = env_non_empty("PDFIUM_RELEASE_URL") {
            config.release_base_url = url;
        }
        if let Some(flag) = env_non_empty("PDFIUM_NO_DOWNLOAD") {
            config.allow_download = !matches!(flag.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }
        config
    }

    /// Per-version cache directory.
    ///
    /// Default locations:
    /// - **macOS**: `~/Library/Caches/resumind/pdfium-{VERSION}/`
    /// - **Linux**: `~/.cache/resumind/pdfium-{VERSION}/`
    /// - **Windows**: `%LOCALAPPDATA%\resumind\pdfium-{VERSION}\`
    pub fn cache_dir(&self) -> PathBuf {
        let versioned = format!("pdfium-{}", self.version);
        if let Some(dir) = &self.cache_dir {
            return dir.join(versioned);
        }

        let base = dirs::cache_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
            .unwrap_or_else(std::env::temp_dir);

        base.join("resumind").join(versioned)
    }

    /// Download URL of the platform archive.
    pub fn archive_url(&self, platform: &PlatformInfo) -> String {
        format!(
            "{}/chromium%2F{}/{}",
            self.release_base_url.trim_end_matches('/'),
            self.version,
            platform.archive_name
        )
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

// ── Loader ───────────────────────────────────────────────────────────────────

/// Resolves and binds PDFium according to a [`LoaderConfig`].
///
/// The loader itself holds no cache; callers that want a single binding per
/// process memoise the returned [`Pdfium`].
#[derive(Debug, Clone, Default)]
pub struct PdfiumLoader {
    config: LoaderConfig,
}

impl PdfiumLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Whether this host can run PDFium at all.
    ///
    /// An explicit library path must exist; otherwise the platform must have
    /// a published PDFium build.
    pub fn host_support(&self) -> Result<(), PdfiumLoaderError> {
        if let Some(path) = &self.config.library_path {
            if path.exists() {
                return Ok(());
            }
            return Err(PdfiumLoaderError::LibraryNotFound { path: path.clone() });
        }
        detect_platform().map(|_| ())
    }

    /// Path of an already available library, without touching the network.
    pub fn cached_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config.library_path {
            return path.exists().then(|| path.clone());
        }
        let platform = detect_platform().ok()?;
        let path = self.config.cache_dir().join(platform.lib_name);
        path.exists().then_some(path)
    }

    /// Resolve the library path, downloading it if allowed and necessary.
    pub fn locate(
        &self,
        on_progress: Option<DownloadProgress<'_>>,
    ) -> Result<PathBuf, PdfiumLoaderError> {
        if let Some(path) = &self.config.library_path {
            if path.exists() {
                debug!("Using configured PDFium library: {}", path.display());
                return Ok(path.clone());
            }
            return Err(PdfiumLoaderError::LibraryNotFound { path: path.clone() });
        }

        let platform = detect_platform()?;
        let cache_dir = self.config.cache_dir();
        let lib_path = cache_dir.join(platform.lib_name);

        if lib_path.exists() {
            debug!("Using cached PDFium library: {}", lib_path.display());
            return Ok(lib_path);
        }

        if !self.config.allow_download {
            return Err(PdfiumLoaderError::DownloadDisabled { expected: lib_path });
        }

        let url = self.config.archive_url(&platform);
        info!("Downloading PDFium from {}", url);

        std::fs::create_dir_all(&cache_dir).map_err(PdfiumLoaderError::CacheDir)?;

        let archive_bytes = download_bytes(&url, on_progress)?;
        extract_library(&archive_bytes, platform.lib_path_in_archive, &lib_path)?;

        info!("PDFium cached at {}", lib_path.display());
        Ok(lib_path)
    }

    /// Resolve and bind PDFium.
    pub fn bind(
        &self,
        on_progress: Option<DownloadProgress<'_>>,
    ) -> Result<Pdfium, PdfiumLoaderError> {
        let path = self.locate(on_progress)?;
        bind_from_path(&path)
    }
}

/// Binds to a PDFium library at an explicit `path`.
pub fn bind_from_path(path: &Path) -> Result<Pdfium, PdfiumLoaderError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumLoaderError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

// ── Internal helpers ─────────────────────────────────────────────────────────

/// Streams a URL into a `Vec<u8>`, calling `on_progress` every 64 KiB.
fn download_bytes(
    url: &str,
    on_progress: Option<DownloadProgress<'_>>,
) -> Result<Vec<u8>, PdfiumLoaderError> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-loader/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| PdfiumLoaderError::Download(e.to_string()))?;

    let mut response = client
        .get(url)
        .send()
        .map_err(|e| PdfiumLoaderError::Download(format!("GET {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(PdfiumLoaderError::Download(format!(
            "HTTP {} for {url}",
            response.status()
        )));
    }

    let total = response.content_length();
    let mut buf = Vec::with_capacity(total.unwrap_or(32 * 1024 * 1024) as usize);
    let mut chunk = vec![0u8; 64 * 1024];
    let mut downloaded: u64 = 0;

    loop {
        match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                downloaded += n as u64;
                if let Some(cb) = on_progress {
                    cb(downloaded, total);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(PdfiumLoaderError::Download(format!("Read error: {e}"))),
        }
    }

    Ok(buf)
}

/// Extracts one file from a gzipped tar archive into `dest_path`.
///
/// The entry is unpacked next to `dest_path` first and renamed into place,
/// so an interrupted extraction never leaves a truncated library behind.
fn extract_library(
    archive_bytes: &[u8],
    lib_path_in_archive: &str,
    dest_path: &Path,
) -> Result<(), PdfiumLoaderError> {
    use flate2::read::GzDecoder;
    use tar::Archive;

    let mut archive = Archive::new(GzDecoder::new(archive_bytes));
    let partial = dest_path.with_extension("partial");

    for entry in archive
        .entries()
        .map_err(|e| PdfiumLoaderError::Extract(e.to_string()))?
    {
        let mut entry = entry.map_err(|e| PdfiumLoaderError::Extract(e.to_string()))?;
        let entry_path = entry
            .path()
            .map_err(|e| PdfiumLoaderError::Extract(e.to_string()))?;

        if entry_path.to_string_lossy() != lib_path_in_archive {
            continue;
        }

        entry
            .unpack(&partial)
            .map_err(|e| PdfiumLoaderError::Extract(format!("Unpack failed: {e}")))?;
        if let Err(e) = std::fs::rename(&partial, dest_path) {
            warn!("Could not move {} into place: {}", partial.display(), e);
            let _ = std::fs::remove_file(&partial);
            return Err(PdfiumLoaderError::Extract(format!("Rename failed: {e}")));
        }
        return Ok(());
    }

    Err(PdfiumLoaderError::Extract(format!(
        "Library '{lib_path_in_archive}' not found in archive"
    )))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

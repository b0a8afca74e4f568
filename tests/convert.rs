//! Converter behaviour against an in-memory rendering library.
//!
//! Run with:
//!   cargo test --test convert

mod common;

use common::*;
use resumind_pdf2png::{
    ConversionConfig, ConversionProgressCallback, ConversionStage, FailureKind, InputFile,
    PageSize,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn pdf_file(name: &str, bytes: Vec<u8>) -> InputFile {
    InputFile::new(name, "application/pdf", bytes)
}

// ── Validation ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn non_pdf_mime_types_are_rejected() {
    let loader = Arc::new(FakeLoader::default());
    let converter = converter_with(loader.clone());

    for mime in ["image/png", "text/plain", "application/octet-stream", ""] {
        let file = InputFile::new("resume.pdf", mime, one_page_pdf());
        let result = converter.convert(&file).await;

        assert!(result.file().is_none(), "[{mime}] must not produce a file");
        assert_eq!(result.image_url(), "");
        assert_eq!(result.error_kind(), Some(FailureKind::InvalidInput));
        assert!(
            result.error().unwrap().contains("Must be a PDF"),
            "[{mime}] got: {:?}",
            result.error()
        );
    }
    assert_eq!(loader.load_count(), 0, "validation must run before loading");
}

#[tokio::test]
async fn empty_input_mentions_emptiness() {
    let converter = converter_with(Arc::new(FakeLoader::default()));
    let result = converter.convert(&pdf_file("resume.pdf", Vec::new())).await;

    assert!(result.file().is_none());
    assert!(result.error().unwrap().contains("empty"), "got: {:?}", result.error());
}

#[tokio::test]
async fn oversized_input_hits_the_size_limit() {
    let converter = converter_with(Arc::new(FakeLoader::default()));
    let mut bytes = one_page_pdf();
    bytes.resize(50 * 1024 * 1024 + 1, b' ');

    let result = converter.convert(&pdf_file("big.pdf", bytes)).await;

    assert!(result.file().is_none());
    assert!(
        result.error().unwrap().contains("Maximum 50MB allowed"),
        "got: {:?}",
        result.error()
    );
}

#[tokio::test]
async fn input_at_exactly_the_limit_is_accepted() {
    let config = ConversionConfig::builder().max_file_bytes(4096).build().unwrap();
    let converter = converter_with_config(Arc::new(FakeLoader::default()), config);
    let mut bytes = one_page_pdf();
    bytes.resize(4096, b' ');

    let result = converter.convert(&pdf_file("edge.pdf", bytes)).await;
    assert!(result.is_success(), "got: {:?}", result.error());
}

#[tokio::test]
async fn unsupported_host_is_reported_before_input_checks() {
    let loader = Arc::new(FakeLoader {
        host_supported: false,
        ..FakeLoader::default()
    });
    let converter = converter_with(loader.clone());

    let result = converter
        .convert(&InputFile::new("x.txt", "text/plain", Vec::new()))
        .await;

    assert_eq!(result.error_kind(), Some(FailureKind::Environment));
    assert!(result.error().unwrap().contains("not available"));
    assert_eq!(loader.load_count(), 0);
}

// ── Success path ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn single_page_pdf_produces_named_png() {
    let converter = converter_with(Arc::new(FakeLoader::default()));
    let result = converter.convert(&pdf_file("resume.pdf", one_page_pdf())).await;

    assert!(result.is_success(), "got: {:?}", result.error());
    assert!(!result.image_url().is_empty());
    assert!(result.image_url().starts_with("blob:resumind/"));

    let file = result.file().expect("file on success");
    assert_eq!(file.name(), "resume.png");
    assert_eq!(file.mime_type(), "image/png");

    let img = image::load_from_memory(file.bytes()).expect("valid PNG").into_rgba8();
    assert_eq!(img.dimensions(), (1224, 1584), "US Letter at 2.0x");

    let stored = converter
        .object_store()
        .resolve(result.image_url())
        .expect("URL is registered");
    assert_eq!(&*stored.bytes, file.bytes());
}

#[tokio::test]
async fn multi_page_pdf_renders_only_the_first_page() {
    let converter = converter_with(Arc::new(FakeLoader::default()));
    let result = converter
        .convert(&pdf_file("Portfolio.PDF", pdf_with_pages(7)))
        .await;

    assert_eq!(result.file().unwrap().name(), "Portfolio.png");
}

#[tokio::test]
async fn custom_scale_changes_viewport() {
    let config = ConversionConfig::builder().scale(1.0).build().unwrap();
    let converter = converter_with_config(Arc::new(FakeLoader::default()), config);
    let result = converter.convert(&pdf_file("cv.pdf", one_page_pdf())).await;

    let png = result.file().unwrap();
    let img = image::load_from_memory(png.bytes()).unwrap();
    assert_eq!((img.width(), img.height()), (612, 792));
}

// ── Library memoisation ──────────────────────────────────────────────────────

#[tokio::test]
async fn library_is_loaded_at_most_once() {
    let loader = Arc::new(FakeLoader::default());
    let converter = converter_with(loader.clone());
    assert!(!converter.is_library_loaded());

    for i in 0..5 {
        let result = converter
            .convert(&pdf_file(&format!("cv{i}.pdf"), one_page_pdf()))
            .await;
        assert!(result.is_success());
    }

    assert_eq!(loader.load_count(), 1);
    assert!(converter.is_library_loaded());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_calls_share_one_load() {
    let loader = Arc::new(FakeLoader {
        load_delay: Duration::from_millis(50),
        ..FakeLoader::default()
    });
    let converter = Arc::new(converter_with(loader.clone()));

    let tasks: Vec<_> = (0..8)
        .map(|i| {
            let converter = Arc::clone(&converter);
            tokio::spawn(async move {
                converter
                    .convert(&pdf_file(&format!("cv{i}.pdf"), one_page_pdf()))
                    .await
            })
        })
        .collect();

    for task in tasks {
        assert!(task.await.unwrap().is_success());
    }
    assert_eq!(loader.load_count(), 1);
}

#[tokio::test]
async fn failed_load_is_retried_on_next_call() {
    let loader = Arc::new(FakeLoader {
        fail_first: 1,
        ..FakeLoader::default()
    });
    let converter = converter_with(loader.clone());

    let first = converter.convert(&pdf_file("cv.pdf", one_page_pdf())).await;
    assert_eq!(first.error_kind(), Some(FailureKind::LibraryLoad));
    assert!(first.error().unwrap().contains("Failed to load PDF rendering library"));
    assert!(!converter.is_library_loaded());

    let second = converter.convert(&pdf_file("cv.pdf", one_page_pdf())).await;
    assert!(second.is_success(), "got: {:?}", second.error());

    let third = converter.convert(&pdf_file("cv.pdf", one_page_pdf())).await;
    assert!(third.is_success());
    assert_eq!(loader.load_count(), 2);
}

// ── Decode / render failures ─────────────────────────────────────────────────

#[tokio::test]
async fn corrupted_pdf_yields_error_result() {
    let converter = converter_with(Arc::new(FakeLoader::default()));
    let result = converter
        .convert(&pdf_file("broken.pdf", b"\x00\x01garbage bytes".to_vec()))
        .await;

    assert!(result.file().is_none());
    assert_eq!(result.error_kind(), Some(FailureKind::Decode));
    assert!(result.error().unwrap().starts_with("Failed to convert PDF: "));
}

#[tokio::test]
async fn zero_page_pdf_is_a_decode_failure() {
    let converter = converter_with(Arc::new(FakeLoader::default()));
    let result = converter.convert(&pdf_file("empty.pdf", pdf_with_pages(0))).await;

    assert_eq!(result.error_kind(), Some(FailureKind::Decode));
    assert!(result.error().unwrap().contains("no pages"));
}

#[tokio::test]
async fn render_failure_is_captured() {
    let loader = Arc::new(FakeLoader {
        render_error: Some("out of memory".into()),
        ..FakeLoader::default()
    });
    let converter = converter_with(loader);
    let result = converter.convert(&pdf_file("cv.pdf", one_page_pdf())).await;

    assert_eq!(result.error_kind(), Some(FailureKind::Render));
    assert!(result.error().unwrap().contains("out of memory"));
}

#[tokio::test]
async fn huge_page_is_refused_without_rendering() {
    let loader = Arc::new(FakeLoader {
        page_size: PageSize {
            width: 14_400.0,
            height: 14_400.0,
        },
        ..FakeLoader::default()
    });
    let converter = converter_with(loader.clone());
    let result = converter.convert(&pdf_file("poster.pdf", one_page_pdf())).await;

    assert!(result.file().is_none());
    assert_eq!(result.error_kind(), Some(FailureKind::Render));
    assert!(
        result.error().unwrap().contains("28800x28800"),
        "got: {:?}",
        result.error()
    );
    assert_eq!(loader.render_count(), 0);
}

#[tokio::test]
async fn surface_limit_is_configurable() {
    let config = ConversionConfig::builder()
        .max_surface_pixels(1224 * 1584)
        .build()
        .unwrap();
    let loader = Arc::new(FakeLoader::default());
    let converter = converter_with_config(loader.clone(), config);
    assert!(converter.convert(&pdf_file("cv.pdf", one_page_pdf())).await.is_success());

    let config = ConversionConfig::builder()
        .max_surface_pixels(1224 * 1584 - 1)
        .build()
        .unwrap();
    let converter = converter_with_config(loader.clone(), config);
    let result = converter.convert(&pdf_file("cv.pdf", one_page_pdf())).await;
    assert_eq!(result.error_kind(), Some(FailureKind::Render));
    assert_eq!(loader.render_count(), 1);
}

// ── Paths and progress ───────────────────────────────────────────────────────

#[tokio::test]
async fn convert_path_reads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Jane Doe.pdf");
    std::fs::write(&path, one_page_pdf()).unwrap();

    let converter = converter_with(Arc::new(FakeLoader::default()));
    let result = converter.convert_path(&path).await;
    assert_eq!(result.file().unwrap().name(), "Jane Doe.png");

    let missing = converter.convert_path(dir.path().join("nope.pdf")).await;
    assert_eq!(missing.error_kind(), Some(FailureKind::InvalidInput));
    assert!(missing.error().unwrap().contains("Could not read"));
}

#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<String>>,
}

impl ConversionProgressCallback for Recorder {
    fn on_stage(&self, stage: ConversionStage) {
        self.events.lock().unwrap().push(format!("{stage:?}"));
    }

    fn on_complete(&self, file_name: &str, _png_bytes: usize) {
        self.events.lock().unwrap().push(format!("complete {file_name}"));
    }

    fn on_error(&self, message: &str) {
        self.events.lock().unwrap().push(format!("error {message}"));
    }
}

#[tokio::test]
async fn progress_events_follow_the_pipeline() {
    let recorder = Arc::new(Recorder::default());
    let config = ConversionConfig::builder()
        .progress_callback(recorder.clone())
        .build()
        .unwrap();
    let converter = converter_with_config(Arc::new(FakeLoader::default()), config);

    converter.convert(&pdf_file("cv.pdf", one_page_pdf())).await;
    converter.convert(&pdf_file("cv.pdf", Vec::new())).await;

    let events = recorder.events.lock().unwrap().clone();
    assert_eq!(
        events,
        vec![
            "LoadingLibrary".to_string(),
            "Decoding".to_string(),
            "Rendering { width: 1224, height: 1584 }".to_string(),
            "Encoding".to_string(),
            "complete cv.png".to_string(),
            "error Failed to convert PDF: File is empty".to_string(),
        ]
    );
}

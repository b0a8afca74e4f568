//! CLI binary for resumind-pdf2png.
//!
//! A thin shim over the library crate: `convert` maps flags to a
//! `ConversionConfig` and writes the PNG, `serve` starts the upload front end.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use resumind_pdf2png::{
    server, ConversionConfig, ConversionProgressCallback, ConversionStage, Converter, LoaderConfig,
    PdfiumLibraryLoader, ProgressCallback,
};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that shows the current conversion stage.
struct CliProgressCallback {
    bar: ProgressBar,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner())
                .tick_strings(TICKS),
        );
        bar.set_prefix("Converting");
        bar.set_message("Validating…");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_stage(&self, stage: ConversionStage) {
        self.bar.set_message(format!("{stage}…"));
    }

    fn on_complete(&self, file_name: &str, png_bytes: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {}  {}",
            green("✔"),
            bold(file_name),
            dim(&format!("{png_bytes} bytes"))
        );
    }

    fn on_error(&self, message: &str) {
        self.bar.finish_and_clear();
        eprintln!("{} {}", red("✘"), message);
    }
}

/// Download bar for the first-run PDFium fetch.
fn download_progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {bytes}/{total_bytes}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS),
    );
    bar.set_prefix("PDF engine");
    bar
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Render page 1 of a resume next to it (resume.png)
  pdf2png convert resume.pdf

  # Choose the output path and print the result as JSON
  pdf2png convert resume.pdf -o preview.png --json

  # Print a data: URL instead of writing a file
  pdf2png convert resume.pdf --data-url

  # Run the upload front end
  pdf2png serve --addr 127.0.0.1:8080

PDF ENGINE:
  PDFium is downloaded on first use to ~/.cache/resumind/pdfium-7690/.
  To use an existing copy: PDFIUM_LIB_PATH=/path/to/libpdfium pdf2png ...
"#;

/// Render the first page of a PDF to PNG.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2png",
    version,
    about = "Render the first page of a PDF to a PNG image",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to an existing PDFium library (skips download).
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2PNG_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2PNG_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one PDF file.
    Convert(ConvertArgs),
    /// Serve the upload front end.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Local PDF file path.
    input: PathBuf,

    /// Write the PNG here instead of `<input stem>.png` next to the input.
    #[arg(short, long, env = "PDF2PNG_OUTPUT")]
    output: Option<PathBuf>,

    /// Render scale (0.1–10).
    #[arg(long, env = "PDF2PNG_SCALE", default_value_t = 2.0)]
    scale: f32,

    /// PNG quality (0–1); selects compression effort.
    #[arg(long, env = "PDF2PNG_QUALITY", default_value_t = 0.95)]
    quality: f32,

    /// Largest accepted input, in MiB.
    #[arg(long, env = "PDF2PNG_MAX_SIZE_MB", default_value_t = 50,
          value_parser = clap::value_parser!(u64).range(1..))]
    max_size_mb: u64,

    /// Print the conversion result as JSON.
    #[arg(long, env = "PDF2PNG_JSON")]
    json: bool,

    /// Print a base64 data: URL of the PNG instead of writing a file.
    #[arg(long)]
    data_url: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PDF2PNG_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Listen address.
    #[arg(long, env = "PDF2PNG_ADDR", default_value = "127.0.0.1:8080")]
    addr: String,

    /// Largest accepted upload, in MiB.
    #[arg(long, env = "PDF2PNG_MAX_SIZE_MB", default_value_t = 50,
          value_parser = clap::value_parser!(u64).range(1..))]
    max_size_mb: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs while the spinner is active.
    let spinner = match &cli.command {
        Command::Convert(args) => !cli.quiet && !args.no_progress && !args.json,
        Command::Serve(_) => false,
    };
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || spinner {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut loader_config = LoaderConfig::from_env();
    if let Some(path) = &cli.pdfium_lib {
        loader_config.library_path = Some(path.clone());
    }

    match cli.command {
        Command::Convert(ref args) => run_convert(args, loader_config, spinner, cli.quiet).await,
        Command::Serve(args) => run_serve(args, loader_config).await,
    }
}

/// Build a PDFium loader that shows a download bar unless `quiet`.
fn pdfium_loader(config: LoaderConfig, quiet: bool) -> PdfiumLibraryLoader {
    let loader = PdfiumLibraryLoader::new(config);
    if quiet || loader.is_cached() {
        return loader;
    }

    let bar = download_progress_bar();
    loader.with_download_progress(Arc::new(move |downloaded, total| {
        if let Some(t) = total {
            if bar.length().unwrap_or(0) != t {
                bar.set_length(t);
            }
        }
        bar.set_position(downloaded);
        if total.is_some_and(|t| downloaded >= t) {
            bar.finish_and_clear();
        }
    }))
}

async fn run_convert(
    args: &ConvertArgs,
    loader_config: LoaderConfig,
    spinner: bool,
    quiet: bool,
) -> Result<()> {
    let mut builder = ConversionConfig::builder()
        .scale(args.scale)
        .png_quality(args.quality)
        .max_file_bytes(args.max_size_mb * 1024 * 1024)
        .loader(loader_config.clone());
    if spinner {
        builder = builder.progress_callback(CliProgressCallback::new() as ProgressCallback);
    }
    let config = builder.build().context("Invalid configuration")?;

    let loader = pdfium_loader(loader_config, quiet || args.json);
    let converter = Converter::with_loader(config, Arc::new(loader));

    let result = converter.convert_path(&args.input).await;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialise result")?
        );
    }

    let (_, file) = match result.into_result() {
        Ok(ok) => ok,
        Err(message) => {
            if !spinner && !args.json {
                eprintln!("{} {}", red("✘"), message);
            }
            std::process::exit(1);
        }
    };

    if args.data_url {
        println!("{}", file.to_data_url());
        return Ok(());
    }

    let output = match &args.output {
        Some(path) => path.clone(),
        None => args
            .input
            .parent()
            .map(|dir| dir.join(file.name()))
            .unwrap_or_else(|| PathBuf::from(file.name())),
    };
    file.write_to(&output)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    if !quiet && !args.json {
        eprintln!("   {}", bold(&output.display().to_string()));
    }
    Ok(())
}

async fn run_serve(args: ServeArgs, loader_config: LoaderConfig) -> Result<()> {
    let config = ConversionConfig::builder()
        .max_file_bytes(args.max_size_mb * 1024 * 1024)
        .loader(loader_config.clone())
        .build()
        .context("Invalid configuration")?;

    let loader = PdfiumLibraryLoader::new(loader_config);
    let converter = Arc::new(Converter::with_loader(config, Arc::new(loader)));

    eprintln!("{} Serving on {}", green("◆"), bold(&format!("http://{}", args.addr)));
    server::serve(&args.addr, converter)
        .await
        .with_context(|| format!("Server on {} failed", args.addr))
}

//! CLI binary for edgequake-pdf-enhance.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `EnhanceConfig`, writes the artifact and prints a summary.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_pdf_enhance::pipeline::{compare, encode, input};
use edgequake_pdf_enhance::prompts::{DEFAULT_INSTRUCTION, DEFAULT_INSTRUCTION_ZH_HANT};
use edgequake_pdf_enhance::run::write_atomic;
use edgequake_pdf_enhance::{
    inspect_with, run_file, AspectRatio, EnhanceConfig, ImageSize, ProgressCallback, RunMode,
    RunProgressCallback,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

const TICKS: [&str; 11] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: one bar for the whole run plus a log line per
/// page. Pages arrive strictly in order, so a single start time suffices.
struct CliProgressCallback {
    bar: ProgressBar,
    page_started: Mutex<Option<Instant>>,
    unchanged: AtomicUsize,
}

impl CliProgressCallback {
    /// Spinner until `on_run_start` tells us how many pages there are.
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let spinner_style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&TICKS);

        bar.set_style(spinner_style);
        bar.set_prefix("Preparing");
        bar.set_message("Rendering PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            page_started: Mutex::new(None),
            unchanged: AtomicUsize::new(0),
        })
    }

    fn activate_bar(&self, selected: usize) {
        let progress_style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}  ETA {eta_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&TICKS);

        self.bar.set_length(selected as u64);
        self.bar.set_style(progress_style);
        self.bar.set_prefix("Enhancing");
        self.bar.reset_eta();
    }

    fn page_elapsed(&self) -> f64 {
        self.page_started
            .lock()
            .ok()
            .and_then(|mut started| started.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl RunProgressCallback for CliProgressCallback {
    fn on_run_start(&self, selected_pages: usize, total_pages: usize) {
        self.activate_bar(selected_pages);
        let what = if selected_pages == total_pages {
            format!("Enhancing {total_pages} pages…")
        } else {
            format!("Previewing page 1 of {total_pages}…")
        };
        self.bar.println(format!("{} {}", cyan("◆"), bold(&what)));
    }

    fn on_page_start(&self, page_num: usize, _selected: usize) {
        if let Ok(mut started) = self.page_started.lock() {
            *started = Some(Instant::now());
        }
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_enhanced(&self, page_num: usize, selected: usize) {
        let secs = self.page_elapsed();
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            green("✓"),
            page_num,
            selected,
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_page_unchanged(&self, page_num: usize, selected: usize, reason: &str) {
        let secs = self.page_elapsed();
        self.unchanged.fetch_add(1, Ordering::SeqCst);

        // Keep one line per page.
        let msg: String = if reason.chars().count() > 80 {
            let mut short: String = reason.chars().take(79).collect();
            short.push('\u{2026}');
            short
        } else {
            reason.to_string()
        };

        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}  {}",
            yellow("↺"),
            page_num,
            selected,
            yellow(&msg),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_assembly_start(&self, pages: usize) {
        self.bar.set_prefix("Assembling");
        self.bar.set_message(format!("{pages} pages"));
    }

    fn on_run_complete(&self, selected_pages: usize, enhanced_pages: usize) {
        self.bar.finish_and_clear();
        let unchanged = self.unchanged.load(Ordering::SeqCst);

        if unchanged == 0 {
            eprintln!(
                "{} {} pages enhanced",
                green("✔"),
                bold(&enhanced_pages.to_string())
            );
        } else {
            eprintln!(
                "{} {}/{} pages enhanced  ({} kept original)",
                if enhanced_pages == 0 { red("✘") } else { cyan("⚠") },
                bold(&enhanced_pages.to_string()),
                selected_pages,
                yellow(&unchanged.to_string()),
            );
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Enhance every page; writes optimized_scan.pdf next to the input
  pdfenhance scan.pdf

  # Choose the output file
  pdfenhance scan.pdf -o clean.pdf

  # Try the settings on page 1 first (writes preview_scan.png)
  pdfenhance --preview --dpi 200 --aspect-ratio 3:4 scan.pdf

  # Also save a before/after image of page 1
  pdfenhance --preview --compare compare.png scan.pdf

  # From a URL, at 4K output
  pdfenhance --image-size 4K https://example.com/scan.pdf -o scan_4k.pdf

  # Inspect PDF metadata (no API key needed)
  pdfenhance --inspect-only scan.pdf

  # JSON run report on stdout
  pdfenhance --json scan.pdf > report.json

ASPECT RATIOS:
  1:1 (default)  2:3  3:2  3:4  4:3  4:5  5:4  9:16  16:9  21:9

IMAGE SIZES:
  1K  2K (default)  4K

ENVIRONMENT VARIABLES:
  GOOGLE_CLOUD_API_KEY    API key (Vertex AI API-key mode)
  GEMINI_API_KEY          Fallback API key
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  PDFENHANCE_*            Any flag, e.g. PDFENHANCE_DPI=200
  RUST_LOG                Override log filter (e.g. RUST_LOG=debug)

SETUP:
  1. Set API key:     export GOOGLE_CLOUD_API_KEY=...
  2. Enhance:         pdfenhance scan.pdf
"#;

/// Make the text in PDF pages clearer with a generative image model.
#[derive(Parser, Debug)]
#[command(
    name = "pdfenhance",
    version,
    about = "Make the text in PDF pages clearer with a generative image model",
    long_about = "Rasterise each page of a PDF, ask a Gemini image model to redraw it with \
sharper, higher-contrast text while keeping the layout, and rebuild a PDF from the results. \
Pages the model cannot improve keep their original image.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path or HTTP/HTTPS URL.
    input: String,

    /// Output file. Default: optimized_<name> (or preview_<stem>.png) next to the input.
    #[arg(short, long, env = "PDFENHANCE_OUTPUT")]
    output: Option<PathBuf>,

    /// Rendering DPI (150–600).
    #[arg(long, env = "PDFENHANCE_DPI", default_value_t = 300,
          value_parser = clap::value_parser!(u32).range(150..=600))]
    dpi: u32,

    /// Aspect ratio requested from the model (e.g. 1:1, 3:4, 16:9).
    #[arg(long, env = "PDFENHANCE_ASPECT_RATIO", default_value = "1:1",
          value_parser = parse_aspect_ratio)]
    aspect_ratio: AspectRatio,

    /// Output resolution class requested from the model: 1K, 2K or 4K.
    #[arg(long, env = "PDFENHANCE_IMAGE_SIZE", default_value = "2K",
          value_parser = parse_image_size)]
    image_size: ImageSize,

    /// Enhance page 1 only and write a PNG.
    #[arg(long, env = "PDFENHANCE_PREVIEW")]
    preview: bool,

    /// Image model ID.
    #[arg(long, env = "PDFENHANCE_MODEL", default_value = edgequake_pdf_enhance::config::DEFAULT_MODEL)]
    model: String,

    /// API key. Falls back to GEMINI_API_KEY.
    #[arg(long, env = "GOOGLE_CLOUD_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Endpoint prefix; `/{model}:generateContent` is appended.
    #[arg(long, env = "PDFENHANCE_API_BASE_URL")]
    api_base_url: Option<String>,

    /// Path to a text file with a custom instruction.
    #[arg(long, env = "PDFENHANCE_INSTRUCTION", conflicts_with = "language")]
    instruction: Option<PathBuf>,

    /// Language of the built-in instruction [default: en].
    #[arg(long, env = "PDFENHANCE_LANGUAGE", value_enum)]
    language: Option<LanguageArg>,

    /// Per-page model call timeout in seconds. Pages that time out keep their original.
    #[arg(long, env = "PDFENHANCE_API_TIMEOUT", default_value_t = 300)]
    api_timeout: u64,

    /// HTTP download timeout in seconds.
    #[arg(long, env = "PDFENHANCE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// PDF user password for encrypted documents.
    #[arg(long, env = "PDFENHANCE_PASSWORD")]
    password: Option<String>,

    /// Also write page 1 before/after, side by side, as PNG.
    #[arg(long, env = "PDFENHANCE_COMPARE")]
    compare: Option<PathBuf>,

    /// Print the run report (or metadata) as JSON on stdout.
    #[arg(long, env = "PDFENHANCE_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PDFENHANCE_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no enhancement.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFENHANCE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFENHANCE_QUIET")]
    quiet: bool,

    /// Print the full error chain on failure.
    #[arg(long, env = "PDFENHANCE_DEBUG_ERRORS")]
    debug_errors: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum LanguageArg {
    En,
    ZhHant,
}

/// Built-in instruction for `language`; English when unset.
fn builtin_instruction(language: Option<LanguageArg>) -> &'static str {
    match language {
        None | Some(LanguageArg::En) => DEFAULT_INSTRUCTION,
        Some(LanguageArg::ZhHant) => DEFAULT_INSTRUCTION_ZH_HANT,
    }
}

fn parse_aspect_ratio(s: &str) -> Result<AspectRatio, String> {
    s.parse().map_err(|e: edgequake_pdf_enhance::EnhanceError| e.to_string())
}

fn parse_image_size(s: &str) -> Result<ImageSize, String> {
    s.parse().map_err(|e: edgequake_pdf_enhance::EnhanceError| e.to_string())
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    match execute(&cli, show_progress).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.debug_errors {
                eprintln!("{} {e:?}", red("error:"));
            } else {
                eprintln!("{} {e:#}", red("error:"));
            }
            ExitCode::FAILURE
        }
    }
}

async fn execute(cli: &Cli, show_progress: bool) -> Result<()> {
    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let mut config = EnhanceConfig::default();
        config.password = cli.password.clone();
        config.download_timeout_secs = cli.download_timeout;
        let meta = inspect_with(&cli.input, &config)
            .await
            .context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialize metadata")?
            );
        } else {
            println!("File:         {}", cli.input);
            if let Some(ref t) = meta.title {
                println!("Title:        {}", t);
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {}", a);
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {}", p);
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {}", c);
            }
        }
        return Ok(());
    }

    // ── Build config ─────────────────────────────────────────────────────
    let progress_cb: Option<ProgressCallback> = if show_progress {
        let cb = CliProgressCallback::new_dynamic();
        Some(cb as Arc<dyn RunProgressCallback>)
    } else {
        None
    };
    let config = build_config(cli, progress_cb).await?;

    // ── Run ──────────────────────────────────────────────────────────────
    let output = run_file(&cli.input, &config)
        .await
        .context("Enhancement failed")?;

    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| input::sibling_path(&cli.input, &output.suggested_file_name()));
    write_atomic(&output_path, output.artifact.bytes())
        .await
        .with_context(|| format!("Failed to write {}", output_path.display()))?;

    if let Some(ref compare_path) = cli.compare {
        let side_by_side =
            compare::side_by_side(&output.first_page.original, &output.first_page.result);
        let png = encode::encode_png(&side_by_side).context("Failed to encode comparison image")?;
        write_atomic(compare_path, &png)
            .await
            .with_context(|| format!("Failed to write {}", compare_path.display()))?;
    }

    if cli.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    }

    // ── Summary ──────────────────────────────────────────────────────────
    if !cli.quiet {
        let stats = &output.stats;
        if !show_progress {
            eprintln!(
                "Enhanced {}/{} pages ({} in document) in {}ms",
                stats.enhanced_pages, stats.processed_pages, stats.total_pages, stats.total_duration_ms
            );
            for page in output.pages.iter().filter(|p| !p.enhanced) {
                if let Some(ref err) = page.error {
                    eprintln!("  page {} kept original: {}", page.page_num, err);
                }
            }
        }
        eprintln!(
            "{}  {}ms  →  {}",
            if stats.unchanged_pages == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
        if let Some(ref compare_path) = cli.compare {
            eprintln!("   comparison  →  {}", dim(&compare_path.display().to_string()));
        }
    }

    Ok(())
}

/// Map CLI args to `EnhanceConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<EnhanceConfig> {
    let instruction = match cli.instruction {
        Some(ref path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read instruction from {:?}", path))?,
        None => builtin_instruction(cli.language).to_string(),
    };

    let mut builder = EnhanceConfig::builder()
        .dpi(cli.dpi)
        .aspect_ratio(cli.aspect_ratio)
        .image_size(cli.image_size)
        .mode(if cli.preview {
            RunMode::Preview
        } else {
            RunMode::Full
        })
        .model(cli.model.clone())
        .instruction(instruction)
        .api_timeout_secs(cli.api_timeout)
        .download_timeout_secs(cli.download_timeout);

    if let Some(ref key) = cli.api_key {
        builder = builder.api_key(key.clone());
    }
    if let Some(ref url) = cli.api_base_url {
        builder = builder.api_base_url(url.clone());
    }
    if let Some(ref pwd) = cli.password {
        builder = builder.password(pwd.clone());
    }
    if let Some(cb) = progress {
        builder = builder.progress_callback(cb);
    }

    builder.build().context("Invalid configuration")
}

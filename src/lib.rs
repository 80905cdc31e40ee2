//! # edgequake-pdf-enhance
//!
//! Make the text in PDF documents sharper and easier to read with a
//! generative image model.
//!
//! ## Why this crate?
//!
//! Scanned and low-quality PDFs are hard to read and hard to OCR. Filters
//! (sharpen, threshold, denoise) help a little but cannot redraw a smudged
//! glyph. This crate rasterises every page, asks an image model (Gemini) to
//! redraw it with cleaner text while keeping the layout, and rebuilds a PDF
//! from the results. A page the model cannot improve keeps its original
//! image, so the output always has every page of the input.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input     resolve local file or download from URL
//!  ├─ 2. Render    rasterise pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Enhance   one Gemini call per page, in order; failures pass through
//!  └─ 4. Output    lossless image PDF (full) or optimized PNG (preview)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_pdf_enhance::{run_to_file, AspectRatio, EnhanceConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // API key from GOOGLE_CLOUD_API_KEY / GEMINI_API_KEY
//!     let config = EnhanceConfig::builder()
//!         .dpi(300)
//!         .aspect_ratio(AspectRatio::Portrait3x4)
//!         .build()?;
//!     let output = run_to_file("scan.pdf", "optimized_scan.pdf", &config).await?;
//!     eprintln!(
//!         "{}/{} pages enhanced",
//!         output.stats.enhanced_pages, output.stats.processed_pages
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `pdfenhance` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-pdf-enhance = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod run;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AspectRatio, EnhanceConfig, EnhanceConfigBuilder, GenerationSettings, ImageSize, RunMode};
pub use error::{EnhanceError, EnhancerError, FailureStage, PageError};
pub use output::{FirstPage, OutputArtifact, PageOutcome, PageReport, RunOutput, RunStats};
pub use pipeline::assemble::{Assembler, AssemblyPage, PdfImageAssembler};
pub use pipeline::enhance::{EnhancementRequest, PageEnhancer};
pub use pipeline::gemini::GeminiEnhancer;
pub use pipeline::input::InputDocument;
pub use pipeline::render::{DocumentInfo, PdfiumRasterizer, RasterRequest, RasterizedDocument, Rasterizer};
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
pub use run::{inspect, inspect_with, run, run_document, run_file, run_sync, run_to_file, RunContext};

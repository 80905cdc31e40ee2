//! Run entry points: rasterise, enhance page by page, then assemble.
//!
//! A run is driven by a [`RunContext`] built from an [`EnhanceConfig`]. The
//! context owns the resolved collaborators and everything derived from the
//! configuration; nothing is shared between runs.
//!
//! ## Failure policy
//!
//! Configuration, input, rasterisation and assembly failures abort the run
//! with an [`EnhanceError`]. A page the enhancer cannot improve keeps its
//! original image and is reported through [`PageReport::error`]; the run
//! carries on with the next page.

use crate::config::{EnhanceConfig, GenerationSettings, RunMode};
use crate::error::EnhanceError;
use crate::output::{FirstPage, OutputArtifact, PageReport, RunOutput, RunStats};
use crate::pipeline::assemble::{self, Assembler, AssemblyPage, PdfImageAssembler};
use crate::pipeline::encode;
use crate::pipeline::enhance::{enhance_page, EnhancementRequest, PageEnhancer};
use crate::pipeline::gemini::GeminiEnhancer;
use crate::pipeline::input::{self, InputDocument};
use crate::pipeline::render::{self, DocumentInfo, PdfiumRasterizer, RasterRequest, Rasterizer};
use crate::progress::{NoopProgressCallback, ProgressCallback};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Download timeout used by [`inspect`].
const INSPECT_DOWNLOAD_TIMEOUT_SECS: u64 = 120;

/// Everything one run needs, resolved up front.
pub struct RunContext {
    rasterizer: Arc<dyn Rasterizer>,
    enhancer: Arc<dyn PageEnhancer>,
    assembler: Arc<dyn Assembler>,
    settings: GenerationSettings,
    instruction: String,
    mode: RunMode,
    raster: RasterRequest,
    api_timeout: Duration,
    progress: ProgressCallback,
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("enhancer", &self.enhancer.name())
            .field("mode", &self.mode)
            .field("dpi", &self.raster.dpi)
            .field("settings", &self.settings)
            .field("api_timeout", &self.api_timeout)
            .finish_non_exhaustive()
    }
}

impl RunContext {
    /// Validate `config` and resolve the collaborators.
    ///
    /// Fails before any page is rendered when the configuration is invalid or
    /// no enhancer can be built (e.g. no API key).
    pub fn from_config(config: &EnhanceConfig) -> Result<Self, EnhanceError> {
        config.validate()?;

        let enhancer: Arc<dyn PageEnhancer> = match config.enhancer {
            Some(ref enhancer) => Arc::clone(enhancer),
            None => Arc::new(
                GeminiEnhancer::from_key_or_env(config.api_key.as_deref(), Some(config.model.as_str()))?
                    .with_base_url(config.api_base_url.as_str()),
            ),
        };
        let rasterizer: Arc<dyn Rasterizer> = match config.rasterizer {
            Some(ref rasterizer) => Arc::clone(rasterizer),
            None => Arc::new(PdfiumRasterizer),
        };
        let assembler: Arc<dyn Assembler> = match config.assembler {
            Some(ref assembler) => Arc::clone(assembler),
            None => Arc::new(PdfImageAssembler::default()),
        };

        Ok(Self {
            rasterizer,
            enhancer,
            assembler,
            settings: config.generation_settings(),
            instruction: config.instruction().to_string(),
            mode: config.mode,
            raster: RasterRequest {
                dpi: config.dpi,
                max_rendered_pixels: config.max_rendered_pixels,
                password: config.password.clone(),
                page_limit: match config.mode {
                    RunMode::Preview => Some(1),
                    RunMode::Full => None,
                },
            },
            api_timeout: Duration::from_secs(config.api_timeout_secs),
            progress: config
                .progress_callback
                .clone()
                .unwrap_or_else(|| Arc::new(NoopProgressCallback)),
        })
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn settings(&self) -> &GenerationSettings {
        &self.settings
    }

    /// Process one document.
    pub async fn execute(&self, document: &InputDocument) -> Result<RunOutput, EnhanceError> {
        let total_start = Instant::now();
        info!(
            "Starting {:?} run on '{}' ({} bytes) with {}",
            self.mode,
            document.name,
            document.bytes.len(),
            self.enhancer.name()
        );

        // ── Step 1: Rasterise ────────────────────────────────────────────
        document.ensure_pdf_magic()?;
        let render_start = Instant::now();
        let rasterized = render::rasterize(
            Arc::clone(&self.rasterizer),
            Arc::new(document.bytes.clone()),
            self.raster.clone(),
        )
        .await?;
        let render_duration_ms = render_start.elapsed().as_millis() as u64;

        let total_pages = rasterized.total_pages;
        let mut pages = rasterized.pages;
        if pages.is_empty() {
            return Err(EnhanceError::EmptyDocument);
        }
        // ── Step 2: Select the working set ───────────────────────────────
        if self.mode == RunMode::Preview {
            pages.truncate(1);
        }
        let selected = pages.len();
        info!(
            "Rendered {} of {} pages in {}ms",
            selected, total_pages, render_duration_ms
        );
        self.progress.on_run_start(selected, total_pages);

        // ── Step 3: Enhance, one page at a time ──────────────────────────
        let enhance_start = Instant::now();
        let mut results = Vec::with_capacity(selected);
        let mut reports = Vec::with_capacity(selected);
        let mut first_original = None;
        let mut enhanced_pages = 0;

        for (idx, original) in pages.into_iter().enumerate() {
            let page_num = idx + 1;
            self.progress.on_page_start(page_num, selected);

            let request = EnhancementRequest {
                page_num,
                image: &original,
                instruction: &self.instruction,
                settings: &self.settings,
            };
            let (outcome, elapsed) =
                enhance_page(self.enhancer.as_ref(), request, self.api_timeout).await;

            match outcome.error() {
                None => {
                    enhanced_pages += 1;
                    self.progress.on_page_enhanced(page_num, selected);
                }
                Some(reason) => {
                    self.progress
                        .on_page_unchanged(page_num, selected, &reason.to_string());
                }
            }

            let (rendered_width, rendered_height) = (original.width(), original.height());
            let image = outcome.image();
            reports.push(PageReport {
                page_num,
                enhanced: outcome.is_enhanced(),
                width: image.width(),
                height: image.height(),
                duration_ms: elapsed.as_millis() as u64,
                error: outcome.error().cloned(),
            });
            results.push(AssemblyPage::new(
                outcome.into_image(),
                rendered_width,
                rendered_height,
            ));

            if idx == 0 {
                first_original = Some(original);
            }
        }
        let enhance_duration_ms = enhance_start.elapsed().as_millis() as u64;
        let unchanged_pages = selected - enhanced_pages;
        info!(
            "Enhancement finished: {} enhanced, {} unchanged in {}ms",
            enhanced_pages, unchanged_pages, enhance_duration_ms
        );

        let first_page = match (first_original, results.first()) {
            (Some(original), Some(result)) => FirstPage {
                original,
                result: result.image.clone(),
            },
            _ => return Err(EnhanceError::Internal("no page was processed".into())),
        };

        // ── Step 4: Produce the artifact ─────────────────────────────────
        let assemble_start = Instant::now();
        let artifact = match self.mode {
            RunMode::Full => {
                self.progress.on_assembly_start(results.len());
                let pdf = assemble::assemble(Arc::clone(&self.assembler), results, self.raster.dpi).await?;
                OutputArtifact::Pdf(pdf)
            }
            RunMode::Preview => {
                let png = encode::encode_png_optimized(&first_page.result)
                    .map_err(|e| EnhanceError::Internal(format!("PNG encoding failed: {e}")))?;
                OutputArtifact::Png(png)
            }
        };
        let assemble_duration_ms = assemble_start.elapsed().as_millis() as u64;
        debug!(
            "Produced {} artifact: {} bytes",
            artifact.extension(),
            artifact.bytes().len()
        );

        let stats = RunStats {
            total_pages,
            processed_pages: selected,
            enhanced_pages,
            unchanged_pages,
            render_duration_ms,
            enhance_duration_ms,
            assemble_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };
        info!(
            "Run complete: {}/{} pages enhanced, {}ms total",
            enhanced_pages, selected, stats.total_duration_ms
        );
        self.progress.on_run_complete(selected, enhanced_pages);

        Ok(RunOutput {
            document_name: document.name.clone(),
            mode: self.mode,
            artifact,
            pages: reports,
            stats,
            first_page,
        })
    }
}

/// Enhance a PDF held in memory.
///
/// The output is named after [`input::DEFAULT_DOCUMENT_NAME`]; use
/// [`run_document`] to keep a real file name.
///
/// # Errors
/// Returns `Err` only for fatal failures. Pages the enhancer could not
/// improve are reported in [`RunOutput::pages`].
pub async fn run(bytes: &[u8], config: &EnhanceConfig) -> Result<RunOutput, EnhanceError> {
    run_document(&InputDocument::from_bytes(bytes.to_vec()), config).await
}

/// Enhance an in-memory document, keeping its name.
pub async fn run_document(
    document: &InputDocument,
    config: &EnhanceConfig,
) -> Result<RunOutput, EnhanceError> {
    let ctx = RunContext::from_config(config)?;
    ctx.execute(document).await
}

/// Enhance a local PDF file or HTTP(S) URL.
///
/// The configuration is checked before the input is read, so a missing API
/// key never triggers a download.
pub async fn run_file(input_str: impl AsRef<str>, config: &EnhanceConfig) -> Result<RunOutput, EnhanceError> {
    let ctx = RunContext::from_config(config)?;
    let document = input::resolve_input(input_str.as_ref(), config.download_timeout_secs).await?;
    ctx.execute(&document).await
}

/// Enhance `input_str` and write the artifact to `output_path`.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn run_to_file(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &EnhanceConfig,
) -> Result<RunOutput, EnhanceError> {
    let output = run_file(input_str, config).await?;
    write_atomic(output_path.as_ref(), output.artifact.bytes()).await?;
    Ok(output)
}

/// Synchronous wrapper around [`run`].
///
/// Creates a temporary tokio runtime internally.
pub fn run_sync(bytes: &[u8], config: &EnhanceConfig) -> Result<RunOutput, EnhanceError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| EnhanceError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(run(bytes, config))
}

/// Read page count and metadata without an enhancer or API key.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentInfo, EnhanceError> {
    inspect_with(input_str, &EnhanceConfig::default()).await
}

/// [`inspect`] honouring the rasterizer, password and download timeout of
/// `config`.
pub async fn inspect_with(
    input_str: impl AsRef<str>,
    config: &EnhanceConfig,
) -> Result<DocumentInfo, EnhanceError> {
    let timeout = if config.download_timeout_secs == 0 {
        INSPECT_DOWNLOAD_TIMEOUT_SECS
    } else {
        config.download_timeout_secs
    };
    let document = input::resolve_input(input_str.as_ref(), timeout).await?;
    let rasterizer: Arc<dyn Rasterizer> = match config.rasterizer {
        Some(ref rasterizer) => Arc::clone(rasterizer),
        None => Arc::new(PdfiumRasterizer),
    };
    render::inspect(rasterizer, Arc::new(document.bytes), config.password.clone()).await
}

/// Write `bytes` to `path` via a temp file in the same directory.
///
/// The temp file is removed if anything fails before the rename.
pub async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), EnhanceError> {
    let path = path.to_path_buf();
    let bytes = bytes.to_vec();
    let target = path.clone();
    tokio::task::spawn_blocking(move || write_atomic_blocking(&target, &bytes))
        .await
        .map_err(|e| EnhanceError::Internal(format!("Write task panicked: {}", e)))?
        .map_err(|source| EnhanceError::OutputWriteFailed { path, source })
}

fn write_atomic_blocking(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::path::PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

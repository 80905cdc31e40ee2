//! Result types produced by a run.

use crate::config::RunMode;
use crate::error::PageError;
use image::DynamicImage;
use serde::{Deserialize, Serialize};

/// Outcome of enhancing one page.
///
/// Success is carried by the variant, never inferred by comparing the
/// returned image with the original.
#[derive(Debug, Clone)]
pub enum PageOutcome {
    /// The enhancer returned a replacement image.
    Enhanced(DynamicImage),
    /// The original page is kept.
    Unchanged {
        image: DynamicImage,
        reason: PageError,
    },
}

impl PageOutcome {
    /// The image that goes into the output, enhanced or original.
    pub fn image(&self) -> &DynamicImage {
        match self {
            PageOutcome::Enhanced(img) => img,
            PageOutcome::Unchanged { image, .. } => image,
        }
    }

    /// Consume the outcome, keeping only the output image.
    pub fn into_image(self) -> DynamicImage {
        match self {
            PageOutcome::Enhanced(img) => img,
            PageOutcome::Unchanged { image, .. } => image,
        }
    }

    pub fn is_enhanced(&self) -> bool {
        matches!(self, PageOutcome::Enhanced(_))
    }

    /// Why the page was kept, if it was.
    pub fn error(&self) -> Option<&PageError> {
        match self {
            PageOutcome::Enhanced(_) => None,
            PageOutcome::Unchanged { reason, .. } => Some(reason),
        }
    }
}

/// Serialisable summary of one processed page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageReport {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Whether the output page is the enhancer's image.
    pub enhanced: bool,
    /// Output image width in pixels.
    pub width: u32,
    /// Output image height in pixels.
    pub height: u32,
    /// Wall-clock time spent on this page's enhancer call.
    pub duration_ms: u64,
    /// Set when the original page was kept.
    pub error: Option<PageError>,
}

/// The single artifact a run hands back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputArtifact {
    /// Assembled multi-page PDF (Full mode).
    Pdf(Vec<u8>),
    /// PNG of the first page (Preview mode).
    Png(Vec<u8>),
}

impl OutputArtifact {
    pub fn bytes(&self) -> &[u8] {
        match self {
            OutputArtifact::Pdf(b) | OutputArtifact::Png(b) => b,
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            OutputArtifact::Pdf(b) | OutputArtifact::Png(b) => b,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            OutputArtifact::Pdf(_) => "application/pdf",
            OutputArtifact::Png(_) => "image/png",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            OutputArtifact::Pdf(_) => "pdf",
            OutputArtifact::Png(_) => "png",
        }
    }
}

/// Page 1 before and after enhancement.
#[derive(Debug, Clone)]
pub struct FirstPage {
    pub original: DynamicImage,
    pub result: DynamicImage,
}

/// Aggregate counters for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Pages in the document, even when only the first one was processed.
    pub total_pages: usize,
    /// Pages submitted to the enhancer.
    pub processed_pages: usize,
    /// Pages replaced by the enhancer's image.
    pub enhanced_pages: usize,
    /// Pages passed through unchanged.
    pub unchanged_pages: usize,
    pub render_duration_ms: u64,
    pub enhance_duration_ms: u64,
    pub assemble_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Everything a successful run returns.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    /// Name of the input document.
    pub document_name: String,
    pub mode: RunMode,
    #[serde(skip)]
    pub artifact: OutputArtifact,
    pub pages: Vec<PageReport>,
    pub stats: RunStats,
    #[serde(skip)]
    pub first_page: FirstPage,
}

impl RunOutput {
    /// `optimized_<name>` for PDFs, `preview_<stem>.png` for previews.
    pub fn suggested_file_name(&self) -> String {
        suggested_file_name(&self.document_name, self.mode)
    }
}

/// Output file name for a document processed in `mode`.
pub fn suggested_file_name(document_name: &str, mode: RunMode) -> String {
    match mode {
        RunMode::Full => {
            if document_name.to_ascii_lowercase().ends_with(".pdf") {
                format!("optimized_{document_name}")
            } else {
                format!("optimized_{document_name}.pdf")
            }
        }
        RunMode::Preview => {
            let stem = std::path::Path::new(document_name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "document".to_string());
            format!("preview_{stem}.png")
        }
    }
}

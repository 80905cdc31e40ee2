//! Error types for the edgequake-pdf-enhance library.
//!
//! Three error types reflect three distinct failure modes:
//!
//! * [`EnhanceError`] — **Fatal**: the run cannot produce an artifact at all
//!   (bad configuration, unreadable input, rasterisation or assembly failure).
//!   Returned as `Err(EnhanceError)` from the top-level `run*` functions.
//!
//! * [`PageError`] — **Non-fatal**: a single page could not be enhanced. The
//!   original page is passed through and the error is recorded in the
//!   [`crate::output::PageReport`] for that page.
//!
//! * [`EnhancerError`] — what a [`crate::pipeline::enhance::PageEnhancer`]
//!   returns when its remote call fails. The controller converts it into a
//!   [`PageError`]; it never aborts a run.

use std::path::PathBuf;
use thiserror::Error;

/// Pipeline stage a fatal error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    /// Configuration rejected before any external call.
    Config,
    /// Input file or URL could not be read.
    Input,
    /// The document could not be turned into page images.
    Rasterization,
    /// The enhancer could not be set up (per-page failures are never fatal).
    Enhancement,
    /// The resulting pages could not be combined into a PDF.
    Assembly,
    /// The artifact could not be written out.
    Output,
    /// Anything else.
    Internal,
}

/// All fatal errors returned by the edgequake-pdf-enhance library.
#[derive(Debug, Error)]
pub enum EnhanceError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed, or a selection token was not recognised.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The input string is not a valid file path or URL.
    #[error("Invalid input '{input}': not a file path or a valid HTTP/HTTPS URL")]
    InvalidInput { input: String },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'\nIncrease --download-timeout.")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Rasterisation errors ──────────────────────────────────────────────
    /// The bytes do not start with the `%PDF` signature.
    #[error("'{name}' is not a PDF document (first bytes: {magic:?})")]
    NotAPdf { name: String, magic: Vec<u8> },

    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt: {detail}\nTry repairing with: qpdf input.pdf output.pdf")]
    CorruptPdf { detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired,

    /// A password was provided but it is wrong.
    #[error("Wrong password for encrypted PDF")]
    WrongPassword,

    /// The document parsed but contains no pages.
    #[error("PDF contains no pages")]
    EmptyDocument,

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterizationFailed { page: usize, detail: String },

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\n\
PDFium must be available as a shared library. You can:\n\
  • Set PDFIUM_LIB_PATH=/path/to/libpdfium.\n\
  • Place libpdfium next to the executable or in the working directory.\n\
  • Install it system-wide so the dynamic loader can find it.\n"
    )]
    PdfiumBindingFailed(String),

    // ── Enhancer errors ───────────────────────────────────────────────────
    /// No enhancer could be built (missing API key etc.).
    #[error("Image enhancer '{enhancer}' is not configured.\n{hint}")]
    EnhancerNotConfigured { enhancer: String, hint: String },

    // ── Assembly errors ───────────────────────────────────────────────────
    /// The page images could not be combined into a PDF.
    #[error("Failed to assemble {pages} pages into a PDF: {detail}")]
    AssemblyFailed { pages: usize, detail: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl EnhanceError {
    /// The pipeline stage this error aborted.
    pub fn stage(&self) -> FailureStage {
        match self {
            EnhanceError::InvalidConfig(_) => FailureStage::Config,
            EnhanceError::FileNotFound { .. }
            | EnhanceError::PermissionDenied { .. }
            | EnhanceError::InvalidInput { .. }
            | EnhanceError::DownloadFailed { .. }
            | EnhanceError::DownloadTimeout { .. } => FailureStage::Input,
            EnhanceError::NotAPdf { .. }
            | EnhanceError::CorruptPdf { .. }
            | EnhanceError::PasswordRequired
            | EnhanceError::WrongPassword
            | EnhanceError::EmptyDocument
            | EnhanceError::RasterizationFailed { .. }
            | EnhanceError::PdfiumBindingFailed(_) => FailureStage::Rasterization,
            EnhanceError::EnhancerNotConfigured { .. } => FailureStage::Enhancement,
            EnhanceError::AssemblyFailed { .. } => FailureStage::Assembly,
            EnhanceError::OutputWriteFailed { .. } => FailureStage::Output,
            EnhanceError::Internal(_) => FailureStage::Internal,
        }
    }

    /// `true` when the document could not be rasterised.
    pub fn is_rasterization_failure(&self) -> bool {
        self.stage() == FailureStage::Rasterization
    }

    /// `true` when the final PDF could not be assembled.
    pub fn is_assembly_failure(&self) -> bool {
        self.stage() == FailureStage::Assembly
    }
}

/// A non-fatal error for a single page.
///
/// The page's original image is used in the output whenever one of these is
/// recorded.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The enhancer call failed (transport error, upstream rejection, bad payload).
    #[error("Page {page}: enhancement failed: {detail}")]
    EnhancementFailed { page: usize, detail: String },

    /// The enhancer answered but did not return an image.
    #[error("Page {page}: enhancer returned no image, original kept")]
    NoImageReturned { page: usize },

    /// The enhancer call exceeded the per-call timeout.
    #[error("Page {page}: enhancement timed out after {secs}s")]
    Timeout { page: usize, secs: u64 },
}

impl PageError {
    /// 1-indexed page number the error belongs to.
    pub fn page(&self) -> usize {
        match self {
            PageError::EnhancementFailed { page, .. }
            | PageError::NoImageReturned { page }
            | PageError::Timeout { page, .. } => *page,
        }
    }
}

/// Error returned by a [`crate::pipeline::enhance::PageEnhancer`].
#[derive(Debug, Error)]
pub enum EnhancerError {
    /// The request never produced an HTTP response.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// The service answered with a non-success status.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The page image could not be encoded for upload.
    #[error("Failed to encode page image: {0}")]
    Encode(String),

    /// The returned image bytes could not be decoded.
    #[error("Failed to decode returned image: {0}")]
    Decode(String),

    /// The response body did not have the expected shape.
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for EnhancerError {
    fn from(e: reqwest::Error) -> Self {
        EnhancerError::Http(e.to_string())
    }
}

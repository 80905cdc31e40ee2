//! Input resolution: turn a user-supplied path or URL into PDF bytes.
//!
//! pdfium opens documents from memory, so both local files and downloads end
//! up as an [`InputDocument`] owned by the run. We validate the PDF magic
//! bytes (`%PDF`) here so callers get a meaningful error rather than a
//! pdfium parse failure.

use crate::error::EnhanceError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Name used when a caller hands over raw bytes.
pub const DEFAULT_DOCUMENT_NAME: &str = "document.pdf";

/// A PDF loaded into memory for the duration of one run.
#[derive(Debug, Clone)]
pub struct InputDocument {
    /// File name the document was uploaded or downloaded as.
    pub name: String,
    /// Raw PDF bytes.
    pub bytes: Vec<u8>,
}

impl InputDocument {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// Wrap raw bytes under [`DEFAULT_DOCUMENT_NAME`].
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self::new(DEFAULT_DOCUMENT_NAME, bytes)
    }

    /// Fail with [`EnhanceError::NotAPdf`] unless the bytes start with `%PDF`.
    pub fn ensure_pdf_magic(&self) -> Result<(), EnhanceError> {
        check_magic(&self.name, &self.bytes)
    }
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve the input string to an in-memory PDF.
///
/// URLs are downloaded with `timeout_secs`; anything else is treated as a
/// local path.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<InputDocument, EnhanceError> {
    if input.trim().is_empty() {
        return Err(EnhanceError::InvalidInput {
            input: input.to_string(),
        });
    }
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else {
        read_local(Path::new(input)).await
    }
}

fn check_magic(name: &str, bytes: &[u8]) -> Result<(), EnhanceError> {
    if bytes.len() < 4 || &bytes[..4] != b"%PDF" {
        return Err(EnhanceError::NotAPdf {
            name: name.to_string(),
            magic: bytes.iter().take(4).copied().collect(),
        });
    }
    Ok(())
}

/// Read a local file, validating existence, permissions and PDF magic bytes.
async fn read_local(path: &Path) -> Result<InputDocument, EnhanceError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => EnhanceError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => EnhanceError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let name = file_name_of(path);
    check_magic(&name, &bytes)?;

    debug!("Read local PDF: {} ({} bytes)", path.display(), bytes.len());
    Ok(InputDocument::new(name, bytes))
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_DOCUMENT_NAME.to_string())
}

/// Download a URL into memory.
async fn download_url(url: &str, timeout_secs: u64) -> Result<InputDocument, EnhanceError> {
    info!("Downloading PDF from: {}", url);

    let parsed = reqwest::Url::parse(url).map_err(|_| EnhanceError::InvalidInput {
        input: url.to_string(),
    })?;

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| EnhanceError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let response = client.get(parsed.clone()).send().await.map_err(|e| {
        if e.is_timeout() {
            EnhanceError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            EnhanceError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    if !response.status().is_success() {
        return Err(EnhanceError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(|e| {
        if e.is_timeout() {
            EnhanceError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            EnhanceError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    })?;

    let name = filename_from_url(&parsed);
    check_magic(&name, &bytes)?;

    info!("Downloaded {} bytes as '{}'", bytes.len(), name);
    Ok(InputDocument::new(name, bytes.to_vec()))
}

/// Last non-empty path segment containing a dot, else `downloaded.pdf`.
fn filename_from_url(url: &reqwest::Url) -> String {
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|last| !last.is_empty() && last.contains('.'))
        .map(str::to_string)
        .unwrap_or_else(|| "downloaded.pdf".to_string())
}

/// Path of the file the artifact would be written to next to `input`.
pub fn sibling_path(input: &str, file_name: &str) -> PathBuf {
    if is_url(input) {
        return PathBuf::from(file_name);
    }
    Path::new(input)
        .parent()
        .map(|p| p.join(file_name))
        .unwrap_or_else(|| PathBuf::from(file_name))
}

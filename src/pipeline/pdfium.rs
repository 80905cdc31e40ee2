//! Locating and binding the pdfium shared library.
//!
//! Resolution order (first match wins):
//!
//! 1. `PDFIUM_LIB_PATH` — explicit path to the library file.
//! 2. The platform library name next to the running executable.
//! 3. The platform library name in the current working directory.
//! 4. The system library search path.

use crate::error::EnhanceError;
use pdfium_render::prelude::*;
use std::path::PathBuf;
use tracing::debug;

/// Environment variable naming an explicit pdfium library file.
pub const PDFIUM_LIB_PATH_ENV: &str = "PDFIUM_LIB_PATH";

/// Directories searched for the platform library before the system path.
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|d| d.to_path_buf()))
    {
        dirs.push(exe_dir);
    }
    dirs.push(PathBuf::from("./"));
    dirs
}

/// Bind to pdfium, returning a ready-to-use [`Pdfium`] instance.
pub fn bind_pdfium() -> Result<Pdfium, EnhanceError> {
    if let Ok(explicit) = std::env::var(PDFIUM_LIB_PATH_ENV) {
        if !explicit.is_empty() {
            debug!("Binding pdfium from {}={}", PDFIUM_LIB_PATH_ENV, explicit);
            return Pdfium::bind_to_library(&explicit)
                .map(Pdfium::new)
                .map_err(|e| EnhanceError::PdfiumBindingFailed(format!("{explicit}: {e}")));
        }
    }

    let mut last_err = None;
    for dir in candidate_dirs() {
        let lib = Pdfium::pdfium_platform_library_name_at_path(&dir);
        if !lib.exists() {
            continue;
        }
        match Pdfium::bind_to_library(&lib) {
            Ok(bindings) => {
                debug!("Bound pdfium from {}", lib.display());
                return Ok(Pdfium::new(bindings));
            }
            Err(e) => last_err = Some(format!("{}: {e}", lib.display())),
        }
    }

    Pdfium::bind_to_system_library()
        .map(Pdfium::new)
        .map_err(|e| {
            let detail = match last_err {
                Some(prev) => format!("{prev}; system library: {e}"),
                None => format!("system library: {e}"),
            };
            EnhanceError::PdfiumBindingFailed(detail)
        })
}

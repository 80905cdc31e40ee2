//! PDF rasterisation: turn PDF bytes into one `DynamicImage` per page.
//!
//! The [`Rasterizer`] trait is the seam the controller talks to;
//! [`PdfiumRasterizer`] is the production implementation.
//!
//! ## Why spawn_blocking?
//!
//! pdfium is a C++ library with global state and CPU-heavy rendering.
//! [`rasterize`] moves the work onto tokio's blocking pool so the async
//! workers never stall while a 600-DPI page renders.

use crate::error::EnhanceError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Parameters for one rasterisation call.
#[derive(Debug, Clone)]
pub struct RasterRequest {
    /// Rendering resolution.
    pub dpi: u32,
    /// Longest-edge cap in pixels.
    pub max_rendered_pixels: u32,
    /// User password for encrypted documents.
    pub password: Option<String>,
    /// Render only the first `n` pages. `None` renders all of them.
    pub page_limit: Option<usize>,
}

/// Rendered pages plus the true page count of the document.
#[derive(Debug, Clone)]
pub struct RasterizedDocument {
    /// Number of pages in the document, regardless of `page_limit`.
    pub total_pages: usize,
    /// Rendered pages in document order, starting at page 1.
    pub pages: Vec<DynamicImage>,
}

/// Converts PDF bytes into ordered page images.
pub trait Rasterizer: Send + Sync {
    /// Render pages of `pdf` according to `request`.
    ///
    /// Implementations return a rasterisation-stage [`EnhanceError`] when the
    /// document cannot be parsed or a page cannot be rendered.
    fn rasterize(&self, pdf: &[u8], request: &RasterRequest) -> Result<RasterizedDocument, EnhanceError>;

    /// Read document metadata without rendering any page.
    fn inspect(&self, pdf: &[u8], password: Option<&str>) -> Result<DocumentInfo, EnhanceError>;
}

/// Document-level metadata reported by [`Rasterizer::inspect`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentInfo {
    pub page_count: usize,
    pub title: Option<String>,
    pub author: Option<String>,
    pub producer: Option<String>,
    pub creator: Option<String>,
    pub pdf_version: String,
}

/// Run `rasterizer` on the blocking pool.
pub async fn rasterize(
    rasterizer: Arc<dyn Rasterizer>,
    pdf: Arc<Vec<u8>>,
    request: RasterRequest,
) -> Result<RasterizedDocument, EnhanceError> {
    tokio::task::spawn_blocking(move || rasterizer.rasterize(&pdf, &request))
        .await
        .map_err(|e| EnhanceError::Internal(format!("Render task panicked: {}", e)))?
}

/// Run [`Rasterizer::inspect`] on the blocking pool.
pub async fn inspect(
    rasterizer: Arc<dyn Rasterizer>,
    pdf: Arc<Vec<u8>>,
    password: Option<String>,
) -> Result<DocumentInfo, EnhanceError> {
    tokio::task::spawn_blocking(move || rasterizer.inspect(&pdf, password.as_deref()))
        .await
        .map_err(|e| EnhanceError::Internal(format!("Inspect task panicked: {}", e)))?
}

/// Target pixel size for a page of `width_pt` × `height_pt` points at `dpi`,
/// scaled down so neither edge exceeds `max_pixels`.
pub fn target_size(width_pt: f32, height_pt: f32, dpi: u32, max_pixels: u32) -> (u32, u32) {
    let scale = dpi as f32 / 72.0;
    let mut w = (width_pt * scale).round().max(1.0);
    let mut h = (height_pt * scale).round().max(1.0);

    let longest = w.max(h);
    let cap = max_pixels as f32;
    if longest > cap {
        let shrink = cap / longest;
        w = (w * shrink).round().max(1.0);
        h = (h * shrink).round().max(1.0);
    }
    (w as u32, h as u32)
}

/// pdfium-backed [`Rasterizer`].
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfiumRasterizer;

impl PdfiumRasterizer {
    fn load<'a>(
        pdfium: &'a Pdfium,
        pdf: &'a [u8],
        password: Option<&'a str>,
    ) -> Result<PdfDocument<'a>, EnhanceError> {
        pdfium.load_pdf_from_byte_slice(pdf, password).map_err(|e| {
            let err_str = format!("{:?}", e);
            if err_str.contains("Password") || err_str.contains("password") {
                if password.is_some() {
                    EnhanceError::WrongPassword
                } else {
                    EnhanceError::PasswordRequired
                }
            } else {
                EnhanceError::CorruptPdf { detail: err_str }
            }
        })
    }
}

impl Rasterizer for PdfiumRasterizer {
    fn rasterize(&self, pdf: &[u8], request: &RasterRequest) -> Result<RasterizedDocument, EnhanceError> {
        let pdfium = super::pdfium::bind_pdfium()?;
        let document = Self::load(&pdfium, pdf, request.password.as_deref())?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!("PDF loaded: {} pages", total_pages);
        if total_pages == 0 {
            return Err(EnhanceError::EmptyDocument);
        }

        let wanted = request.page_limit.unwrap_or(total_pages).min(total_pages);
        let mut rendered = Vec::with_capacity(wanted);

        for idx in 0..wanted {
            let page = pages
                .get(idx as u16)
                .map_err(|e| EnhanceError::RasterizationFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                })?;

            let (w, h) = target_size(
                page.width().value,
                page.height().value,
                request.dpi,
                request.max_rendered_pixels,
            );
            let render_config = PdfRenderConfig::new()
                .set_target_width(w as i32)
                .set_maximum_height(h as i32);

            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                EnhanceError::RasterizationFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px @ {} DPI",
                idx + 1,
                image.width(),
                image.height(),
                request.dpi
            );
            rendered.push(image);
        }

        Ok(RasterizedDocument {
            total_pages,
            pages: rendered,
        })
    }

    fn inspect(&self, pdf: &[u8], password: Option<&str>) -> Result<DocumentInfo, EnhanceError> {
        let pdfium = super::pdfium::bind_pdfium()?;
        let document = Self::load(&pdfium, pdf, password)?;

        let metadata = document.metadata();
        let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
            metadata.get(tag).and_then(|t| {
                let v = t.value().to_string();
                if v.is_empty() {
                    None
                } else {
                    Some(v)
                }
            })
        };

        Ok(DocumentInfo {
            page_count: document.pages().len() as usize,
            title: get_meta(PdfDocumentMetadataTagType::Title),
            author: get_meta(PdfDocumentMetadataTagType::Author),
            producer: get_meta(PdfDocumentMetadataTagType::Producer),
            creator: get_meta(PdfDocumentMetadataTagType::Creator),
            pdf_version: format!("{:?}", document.version()),
        })
    }
}

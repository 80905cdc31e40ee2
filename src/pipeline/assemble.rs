//! PDF assembly: one full-page image per PDF page.
//!
//! Each page becomes a single `/XObject /Image` in `DeviceRGB`, 8 bits per
//! component, compressed with `FlateDecode`. The encoding is lossless: the
//! decompressed stream of page *i* is byte-for-byte the RGB buffer of output
//! image *i*. Page size in points is `pixels × 72 / dpi` of the page as it
//! was *rendered*; an image returned at another resolution is scaled into
//! that box, so every page keeps the physical size of the input.

use crate::error::EnhanceError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info};

/// One output page: the final image plus the pixel size it was rendered at.
#[derive(Debug, Clone)]
pub struct AssemblyPage {
    pub image: DynamicImage,
    /// Width of the rasterised page in pixels.
    pub rendered_width: u32,
    /// Height of the rasterised page in pixels.
    pub rendered_height: u32,
}

impl AssemblyPage {
    /// `image` placed in a box of `rendered_width × rendered_height` pixels.
    pub fn new(image: DynamicImage, rendered_width: u32, rendered_height: u32) -> Self {
        Self {
            image,
            rendered_width,
            rendered_height,
        }
    }

    /// A page whose image is the rendering itself.
    pub fn from_rendered(image: DynamicImage) -> Self {
        let (w, h) = (image.width(), image.height());
        Self::new(image, w, h)
    }
}

/// Combines an ordered page sequence into one PDF byte stream.
pub trait Assembler: Send + Sync {
    /// Build a PDF with one page per entry, in the given order.
    ///
    /// `dpi` is the resolution the pages were rasterised at.
    fn assemble(&self, pages: &[AssemblyPage], dpi: u32) -> Result<Vec<u8>, EnhanceError>;
}

/// Run `assembler` on the blocking pool.
pub async fn assemble(
    assembler: Arc<dyn Assembler>,
    pages: Vec<AssemblyPage>,
    dpi: u32,
) -> Result<Vec<u8>, EnhanceError> {
    let count = pages.len();
    tokio::task::spawn_blocking(move || assembler.assemble(&pages, dpi))
        .await
        .map_err(|e| EnhanceError::AssemblyFailed {
            pages: count,
            detail: format!("assembly task panicked: {e}"),
        })?
}

/// lopdf-backed [`Assembler`].
#[derive(Debug, Clone, Copy)]
pub struct PdfImageAssembler {
    compression: Compression,
}

impl Default for PdfImageAssembler {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
        }
    }
}

impl PdfImageAssembler {
    /// zlib level 0–9 for the image streams.
    pub fn with_compression_level(level: u32) -> Self {
        Self {
            compression: Compression::new(level.min(9)),
        }
    }

    fn image_stream(&self, img: &DynamicImage) -> Result<(Stream, u32, u32), String> {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();

        let mut encoder = ZlibEncoder::new(Vec::new(), self.compression);
        encoder
            .write_all(rgb.as_raw())
            .map_err(|e| format!("Failed to compress RGB data: {e}"))?;
        let compressed = encoder
            .finish()
            .map_err(|e| format!("Failed to finish compression: {e}"))?;

        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => "DeviceRGB",
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        let mut stream = Stream::new(dict, compressed);
        stream.allows_compression = false;
        Ok((stream, width, height))
    }
}

/// Page edge length in points for `pixels` rendered at `dpi`.
pub fn points_for(pixels: u32, dpi: u32) -> f32 {
    pixels as f32 * 72.0 / dpi.max(1) as f32
}

impl Assembler for PdfImageAssembler {
    fn assemble(&self, pages: &[AssemblyPage], dpi: u32) -> Result<Vec<u8>, EnhanceError> {
        let fail = |detail: String| EnhanceError::AssemblyFailed {
            pages: pages.len(),
            detail,
        };
        if pages.is_empty() {
            return Err(fail("no pages to assemble".to_string()));
        }

        let mut doc = Document::with_version("1.5");
        let pages_id: ObjectId = doc.new_object_id();
        let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

        for (idx, page) in pages.iter().enumerate() {
            let (stream, width, height) = self
                .image_stream(&page.image)
                .map_err(|e| fail(format!("page {}: {e}", idx + 1)))?;
            let image_id = doc.add_object(stream);

            // The image is drawn into the unit square, stretched by `cm`.
            let w_pt = points_for(page.rendered_width, dpi);
            let h_pt = points_for(page.rendered_height, dpi);

            let content = Content {
                operations: vec![
                    Operation::new("q", vec![]),
                    Operation::new(
                        "cm",
                        vec![
                            w_pt.into(),
                            0.into(),
                            0.into(),
                            h_pt.into(),
                            0.into(),
                            0.into(),
                        ],
                    ),
                    Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                    Operation::new("Q", vec![]),
                ],
            };
            let encoded = content
                .encode()
                .map_err(|e| fail(format!("page {}: content stream: {e}", idx + 1)))?;
            let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), w_pt.into(), h_pt.into()],
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "XObject" => dictionary! {
                        "Im0" => image_id,
                    },
                },
            });
            kids.push(page_id.into());

            debug!(
                "Assembled page {}: {}x{} px → {:.1}x{:.1} pt",
                idx + 1,
                width,
                height,
                w_pt,
                h_pt
            );
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => pages.len() as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out)
            .map_err(|e| fail(format!("serialising PDF: {e}")))?;

        info!("Assembled {} pages → {} bytes", pages.len(), out.len());
        Ok(out)
    }
}

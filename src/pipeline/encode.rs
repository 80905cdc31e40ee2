//! Image encoding helpers: `DynamicImage` ⇄ PNG bytes ⇄ base64.
//!
//! PNG everywhere: lossless compression keeps glyph edges intact, which is
//! the whole point of the tool. JPEG is only ever decoded, in case the model
//! answers in a different format than requested.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode an image as PNG with default (fast) compression.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

/// Encode an image as PNG with maximum compression and adaptive filtering.
///
/// Used for the preview artifact, which is written once and downloaded.
pub fn encode_png_optimized(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(&mut buf, CompressionType::Best, FilterType::Adaptive);
    img.write_with_encoder(encoder)?;
    debug!(
        "Optimized PNG {}x{} → {} bytes",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}

/// Encode a rasterised page as base64 PNG for an inline API payload.
pub fn encode_page_base64(img: &DynamicImage) -> Result<String, image::ImageError> {
    let png = encode_png(img)?;
    let b64 = STANDARD.encode(&png);
    debug!("Encoded image → {} bytes base64", b64.len());
    Ok(b64)
}

/// Decode base64 image data returned by the enhancer.
pub fn decode_base64_image(data: &str) -> Result<DynamicImage, String> {
    let bytes = STANDARD
        .decode(data.trim())
        .map_err(|e| format!("invalid base64: {e}"))?;
    image::load_from_memory(&bytes).map_err(|e| format!("invalid image data: {e}"))
}

//! Before/after comparison image.
//!
//! The enhancer may answer at a different resolution than the page it was
//! given, so both sides are scaled to a shared height before being placed
//! next to each other on a white canvas.

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};

/// Horizontal gap between the two panels, in pixels.
pub const GAP_PX: u32 = 16;

/// Place `original` (left) and `enhanced` (right) side by side.
///
/// The shared height is the smaller of the two heights, so neither side is
/// upscaled.
pub fn side_by_side(original: &DynamicImage, enhanced: &DynamicImage) -> DynamicImage {
    let height = original.height().min(enhanced.height()).max(1);
    let left = fit_height(original, height);
    let right = fit_height(enhanced, height);

    let width = left.width() + GAP_PX + right.width();
    let mut canvas = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    imageops::replace(&mut canvas, &left, 0, 0);
    imageops::replace(&mut canvas, &right, (left.width() + GAP_PX) as i64, 0);
    DynamicImage::ImageRgb8(canvas)
}

fn fit_height(img: &DynamicImage, height: u32) -> RgbImage {
    let rgb = img.to_rgb8();
    if rgb.height() == height {
        return rgb;
    }
    let width = ((rgb.width() as u64 * height as u64) / rgb.height().max(1) as u64).max(1) as u32;
    imageops::resize(&rgb, width, height, FilterType::Lanczos3)
}

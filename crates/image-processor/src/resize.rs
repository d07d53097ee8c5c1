//! Resize to the printer's paper width before any pixel processing.
//!
//! Aspect ratio is preserved with Lanczos3 filtering.

use image::DynamicImage;
use image::imageops::FilterType;
use tracing::debug;

use crate::{ProcessError, Result};

/// Resize an image to a target width while maintaining aspect ratio.
///
/// The new height is `floor(height * width / orig_width)`, but never less
/// than one row. Returns a copy unchanged if the image already matches the
/// target width.
pub fn resize_to_width(img: &DynamicImage, width: u32) -> Result<DynamicImage> {
    let (orig_w, orig_h) = (img.width(), img.height());

    if width == 0 {
        return Err(ProcessError::ZeroTargetWidth);
    }
    if orig_w == 0 || orig_h == 0 {
        return Err(ProcessError::EmptyImage {
            width: orig_w,
            height: orig_h,
        });
    }

    if orig_w == width {
        debug!(width, "Image already at target width, skipping resize");
        return Ok(img.clone());
    }

    let new_height = (u64::from(orig_h) * u64::from(width) / u64::from(orig_w)) as u32;
    let new_height = new_height.max(1);

    debug!(
        orig_w,
        orig_h,
        new_width = width,
        new_height,
        "Resizing image to target width"
    );

    Ok(img.resize_exact(width, new_height, FilterType::Lanczos3))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    const PAPER_WIDTH: u32 = 384;

    fn solid(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([128, 64, 32])))
    }

    #[test]
    fn test_photo_is_scaled_to_paper_width() {
        let out = resize_to_width(&solid(1920, 1080), PAPER_WIDTH).unwrap();
        assert_eq!(out.dimensions(), (384, 216));

        let out = resize_to_width(&solid(192, 50), PAPER_WIDTH).unwrap();
        assert_eq!(out.dimensions(), (384, 100));
    }

    #[test]
    fn test_paper_width_input_is_untouched() {
        let img = solid(384, 777);
        let out = resize_to_width(&img, PAPER_WIDTH).unwrap();
        assert_eq!(out, img);
    }

    #[test]
    fn test_fractional_height_is_truncated() {
        // 100 * 384 / 250 = 153.6
        let out = resize_to_width(&solid(250, 100), PAPER_WIDTH).unwrap();
        assert_eq!(out.height(), 153);
    }

    #[test]
    fn test_thin_strip_keeps_one_row() {
        // 1 * 384 / 4000 rounds down to 0
        let out = resize_to_width(&solid(4000, 1), PAPER_WIDTH).unwrap();
        assert_eq!(out.dimensions(), (384, 1));
    }

    #[test]
    fn test_bad_sizes_rejected() {
        assert!(matches!(
            resize_to_width(&solid(10, 10), 0),
            Err(ProcessError::ZeroTargetWidth)
        ));
        assert!(matches!(
            resize_to_width(&DynamicImage::ImageRgb8(RgbImage::new(0, 5)), PAPER_WIDTH),
            Err(ProcessError::EmptyImage { width: 0, height: 5 })
        ));
    }
}

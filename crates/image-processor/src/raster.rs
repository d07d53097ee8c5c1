//! Mutable RGB raster shared by the adjustment, dithering and packing stages.

use image::{Rgb, RgbImage};

use crate::{ProcessError, Result};

/// A row-major grid of RGB pixels with signed channel accumulators.
///
/// Channels are stored as `i32` so that error diffusion can push values
/// outside `0..=255` without clamping. Only [`Raster::to_rgb_image`] clamps.
/// A raster always has a non-zero width and height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<[i32; 3]>,
}

impl Raster {
    /// Create a raster filled with a single color.
    pub fn from_pixel(width: u32, height: u32, rgb: [u8; 3]) -> Result<Self> {
        check_dimensions(width, height)?;
        let px = rgb.map(i32::from);
        Ok(Self {
            width,
            height,
            pixels: vec![px; width as usize * height as usize],
        })
    }

    /// Copy an 8-bit RGB image into a new raster.
    pub fn from_rgb_image(img: &RgbImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        check_dimensions(width, height)?;
        let pixels = img.pixels().map(|p| p.0.map(i32::from)).collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Current channel values at `(x, y)`.
    pub fn get(&self, x: u32, y: u32) -> [i32; 3] {
        self.pixels[self.index(x, y)]
    }

    /// Overwrite all three channels at `(x, y)`.
    pub fn set(&mut self, x: u32, y: u32, px: [i32; 3]) {
        let i = self.index(x, y);
        self.pixels[i] = px;
    }

    /// Add `delta` to every channel at `(x, y)`. No clamping.
    pub fn nudge(&mut self, x: u32, y: u32, delta: i32) {
        let i = self.index(x, y);
        for c in &mut self.pixels[i] {
            *c += delta;
        }
    }

    /// Sum of the three channels at `(x, y)`.
    pub fn channel_sum(&self, x: u32, y: u32) -> i32 {
        self.get(x, y).iter().sum()
    }

    /// All pixels in row-major order.
    pub fn pixels(&self) -> &[[i32; 3]] {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [[i32; 3]] {
        &mut self.pixels
    }

    /// Export as an 8-bit image, clamping each channel to `0..=255`.
    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            Rgb(self.get(x, y).map(|c| c.clamp(0, 255) as u8))
        })
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y as usize * self.width as usize + x as usize
    }
}

fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(ProcessError::EmptyImage { width, height });
    }
    Ok(())
}

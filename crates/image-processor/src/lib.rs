//! Image processing for Luck thermal printer output.
//!
//! Pipeline stages, in the order the print driver runs them:
//! resize to paper width, brightness/contrast adjustment, Floyd-Steinberg
//! dithering, and bit packing into the printer's hex payload.

pub mod adjust;
pub mod dither;
pub mod pack;
pub mod raster;
pub mod resize;

// Re-exports for convenience
pub use adjust::adjust_brightness_contrast;
pub use dither::floyd_steinberg_dither;
pub use pack::{BitSequence, HEADER_BITS, pack_bits};
pub use raster::Raster;
pub use resize::resize_to_width;

/// Errors raised while preparing an image for printing.
#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("Image has empty dimensions: {width}x{height}")]
    EmptyImage { width: u32, height: u32 },

    #[error("Target width must be greater than 0")]
    ZeroTargetWidth,
}

/// Result type alias for image processing operations.
pub type Result<T> = std::result::Result<T, ProcessError>;

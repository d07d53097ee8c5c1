//! Floyd-Steinberg error-diffusion dithering on an RGB raster.

use tracing::debug;

use crate::raster::Raster;

/// Threshold separating black from white levels.
const THRESHOLD: i32 = 128;

/// Apply Floyd-Steinberg dithering to a raster, in place.
///
/// Pixels are visited row-major. Each pixel's level is the truncated mean of
/// its (possibly error-accumulated) channels; all three channels are then set
/// to 0 or 255 and the quantization error is pushed onto unvisited neighbors:
/// - Right:        7/16
/// - Bottom-left:  3/16
/// - Bottom:       5/16
/// - Bottom-right: 1/16
///
/// Neighbor accumulators are never clamped, so a later threshold decision can
/// see values outside `0..=255`. Error aimed past an edge is dropped.
pub fn floyd_steinberg_dither(raster: &mut Raster) {
    let (width, height) = raster.dimensions();
    debug!(width, height, "Applying Floyd-Steinberg dithering");

    for y in 0..height {
        for x in 0..width {
            let level = raster.channel_sum(x, y) / 3;
            let new_level = if level >= THRESHOLD { 255 } else { 0 };
            raster.set(x, y, [new_level; 3]);

            distribute_error(raster, x, y, level - new_level);
        }
    }

    debug!("Floyd-Steinberg dithering complete");
}

/// Distribute quantization error to neighboring pixels.
///
/// Returns the total amount actually handed out, which never exceeds
/// `error` in magnitude.
fn distribute_error(raster: &mut Raster, x: u32, y: u32, error: i32) -> i32 {
    let (width, height) = raster.dimensions();
    let right_edge = x + 1 == width;
    let left_edge = x == 0;
    let bottom_row = y + 1 == height;
    let mut spent = 0;

    let mut push = |raster: &mut Raster, tx: u32, ty: u32, share: i32| {
        raster.nudge(tx, ty, share);
        spent += share;
    };

    if !right_edge {
        push(raster, x + 1, y, error * 7 / 16);
    }
    if !bottom_row && !left_edge {
        push(raster, x - 1, y + 1, error * 3 / 16);
    }
    if !bottom_row {
        push(raster, x, y + 1, error * 5 / 16);
    }
    if !bottom_row && !right_edge {
        push(raster, x + 1, y + 1, error / 16);
    }

    spent
}

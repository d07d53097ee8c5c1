//! Brightness and contrast normalization applied before dithering.

use tracing::debug;

use crate::raster::Raster;

/// Apply brightness and contrast to every channel of every pixel, in place.
///
/// For each channel value `v`:
///
/// ```text
/// v = v + (brightness - 0.5) * 256
/// v = (v - 128) * contrast + 128
/// v = trunc(clamp(v, 0, 255))
/// ```
///
/// `brightness` is expected in `0.0..=1.0` (0.5 is neutral) and `contrast`
/// is used as given (1.0 is neutral). The print driver passes the squared
/// profile contrast here.
pub fn adjust_brightness_contrast(raster: &mut Raster, brightness: f64, contrast: f64) {
    let (width, height) = raster.dimensions();
    debug!(width, height, brightness, contrast, "Adjusting brightness/contrast");

    let offset = (brightness - 0.5) * 256.0;
    for px in raster.pixels_mut() {
        for c in px.iter_mut() {
            *c = adjust_channel(*c, offset, contrast);
        }
    }
}

fn adjust_channel(value: i32, offset: f64, contrast: f64) -> i32 {
    let v = f64::from(value) + offset;
    let v = (v - 128.0) * contrast + 128.0;
    v.clamp(0.0, 255.0) as i32
}

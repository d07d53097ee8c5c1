//! Image encoder: turns a decoded image into the ordered command chunks of
//! one print job.
//!
//! Pipeline: RGB conversion and resize to profile width, brightness/contrast
//! adjustment, Floyd-Steinberg dithering, bit packing to a hex payload, and
//! protocol framing. The raster moves through each stage by value.

use image::DynamicImage;
use image_processor::{
    Raster, adjust_brightness_contrast, floyd_steinberg_dither, pack_bits, resize_to_width,
};
use tracing::debug;

use crate::Result;
use crate::profile::DeviceProfile;
use crate::protocol::{LuckProtocol, PrinterProtocol};

/// Encodes images for one printer model.
#[derive(Debug, Clone)]
pub struct ImageEncoder<P = LuckProtocol> {
    profile: DeviceProfile,
    protocol: P,
}

impl ImageEncoder {
    /// Create an encoder for the Luck protocol.
    ///
    /// Fails with a configuration error if the profile is invalid.
    pub fn new(profile: DeviceProfile) -> Result<Self> {
        Self::with_protocol(profile, LuckProtocol::new())
    }
}

impl<P: PrinterProtocol> ImageEncoder<P> {
    pub fn with_protocol(profile: DeviceProfile, protocol: P) -> Result<Self> {
        profile.validate()?;
        Ok(Self { profile, protocol })
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn protocol(&self) -> &P {
        &self.protocol
    }

    /// Convert to RGB and resize to the profile width.
    pub fn prepare_raster(&self, img: &DynamicImage) -> Result<Raster> {
        let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
        let resized = resize_to_width(&rgb, self.profile.width)?;
        Ok(Raster::from_rgb_image(&resized.into_rgb8())?)
    }

    /// Adjust, dither and pack a raster into the hex image payload.
    pub fn payload_hex(&self, mut raster: Raster) -> String {
        adjust_brightness_contrast(
            &mut raster,
            self.profile.brightness,
            self.profile.effective_contrast(),
        );
        floyd_steinberg_dither(&mut raster);
        pack_bits(&raster).to_hex()
    }

    /// Encode an already-sized raster: density block first, then image
    /// chunks.
    pub fn encode_raster(&self, raster: Raster) -> Result<Vec<Vec<u8>>> {
        let (width, height) = raster.dimensions();
        let payload = self.payload_hex(raster);

        let mut commands = vec![self.protocol.build_density_command(self.profile.density)];
        commands.extend(self.protocol.build_image_frames(&payload)?);

        debug!(
            protocol = self.protocol.name(),
            width,
            height,
            density = %self.profile.density,
            command_count = commands.len(),
            "Encoded image"
        );
        Ok(commands)
    }

    /// Encode a decoded image into the command chunks for one print.
    pub fn encode(&self, img: &DynamicImage) -> Result<Vec<Vec<u8>>> {
        let raster = self.prepare_raster(img)?;
        self.encode_raster(raster)
    }
}

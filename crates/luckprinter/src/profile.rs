//! Device profile: the physical constants of one printer for a print job.
//!
//! These values control paper width, image tone and print density. They are
//! validated once when an encoder is built and never change afterwards.

use std::fmt;
use std::str::FromStr;

use crate::{LuckPrinterError, PRINT_WIDTH, Result};

/// Print head density (heat) level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Density {
    Low,
    #[default]
    Normal,
    High,
}

impl Density {
    /// Two-byte code carried by the density-select command.
    pub fn code(self) -> [u8; 2] {
        match self {
            Self::Low => [0x00, 0x00],
            Self::Normal => [0x01, 0x00],
            Self::High => [0x02, 0x00],
        }
    }
}

impl TryFrom<u8> for Density {
    type Error = LuckPrinterError;

    fn try_from(level: u8) -> Result<Self> {
        match level {
            0 => Ok(Self::Low),
            1 => Ok(Self::Normal),
            2 => Ok(Self::High),
            other => Err(LuckPrinterError::Configuration(format!(
                "unsupported density level {other} (expected 0, 1 or 2)"
            ))),
        }
    }
}

impl FromStr for Density {
    type Err = LuckPrinterError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" | "0" => Ok(Self::Low),
            "normal" | "1" => Ok(Self::Normal),
            "high" | "2" => Ok(Self::High),
            other => Err(LuckPrinterError::Configuration(format!(
                "unsupported density '{other}' (expected low, normal or high)"
            ))),
        }
    }
}

impl fmt::Display for Density {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
        };
        f.write_str(s)
    }
}

/// Physical printer constants used by the encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceProfile {
    /// Print width in pixels; images are resized to this width.
    pub width: u32,

    /// Brightness factor in `0.0..=1.0` (0.5 is neutral).
    pub brightness: f64,

    /// Contrast factor (1.0 is neutral). Squared before it is applied.
    pub contrast: f64,

    pub density: Density,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            width: PRINT_WIDTH,
            brightness: 0.35,
            contrast: 1.45,
            density: Density::Normal,
        }
    }
}

impl DeviceProfile {
    /// Create a profile with the stock printer values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set print width in pixels.
    pub fn with_width(mut self, val: u32) -> Self {
        self.width = val;
        self
    }

    /// Builder: set brightness factor.
    pub fn with_brightness(mut self, val: f64) -> Self {
        self.brightness = val;
        self
    }

    /// Builder: set contrast factor.
    pub fn with_contrast(mut self, val: f64) -> Self {
        self.contrast = val;
        self
    }

    /// Builder: set density level.
    pub fn with_density(mut self, val: Density) -> Self {
        self.density = val;
        self
    }

    /// Contrast as applied to pixels.
    pub fn effective_contrast(&self) -> f64 {
        self.contrast * self.contrast
    }

    /// Check that every value is usable by the encoder.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(LuckPrinterError::Configuration(
                "print width must be greater than 0".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.brightness) {
            return Err(LuckPrinterError::Configuration(format!(
                "brightness must be between 0.0 and 1.0, got {}",
                self.brightness
            )));
        }
        if !(self.contrast.is_finite() && self.contrast > 0.0) {
            return Err(LuckPrinterError::Configuration(format!(
                "contrast must be a positive number, got {}",
                self.contrast
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let profile = DeviceProfile::default();
        assert_eq!(profile.width, 384);
        assert!((profile.brightness - 0.35).abs() < f64::EPSILON);
        assert!((profile.contrast - 1.45).abs() < f64::EPSILON);
        assert_eq!(profile.density, Density::Normal);
        assert!(profile.validate().is_ok());
    }

    #[test]
    fn test_builder_chain() {
        let profile = DeviceProfile::new()
            .with_width(576)
            .with_brightness(0.5)
            .with_contrast(1.0)
            .with_density(Density::High);

        assert_eq!(profile.width, 576);
        assert!((profile.brightness - 0.5).abs() < f64::EPSILON);
        assert!((profile.effective_contrast() - 1.0).abs() < f64::EPSILON);
        assert_eq!(profile.density, Density::High);
    }

    #[test]
    fn test_invalid_profiles_rejected() {
        let cases = vec![
            DeviceProfile::new().with_width(0),
            DeviceProfile::new().with_brightness(1.5),
            DeviceProfile::new().with_brightness(-0.1),
            DeviceProfile::new().with_contrast(0.0),
            DeviceProfile::new().with_contrast(f64::NAN),
        ];
        for profile in cases {
            let err = profile.validate().unwrap_err();
            assert!(err.is_configuration_error(), "{profile:?} -> {err}");
        }
    }

    #[test]
    fn test_density_codes() {
        assert_eq!(Density::Low.code(), [0x00, 0x00]);
        assert_eq!(Density::Normal.code(), [0x01, 0x00]);
        assert_eq!(Density::High.code(), [0x02, 0x00]);
    }

    #[test]
    fn test_density_parsing() {
        assert_eq!("low".parse::<Density>().unwrap(), Density::Low);
        assert_eq!(" High ".parse::<Density>().unwrap(), Density::High);
        assert_eq!("1".parse::<Density>().unwrap(), Density::Normal);
        assert_eq!(Density::try_from(2u8).unwrap(), Density::High);

        assert!("extreme".parse::<Density>().unwrap_err().is_configuration_error());
        assert!(Density::try_from(3u8).unwrap_err().is_configuration_error());
    }

    #[test]
    fn test_density_display_round_trips() {
        for d in [Density::Low, Density::Normal, Density::High] {
            assert_eq!(d.to_string().parse::<Density>().unwrap(), d);
        }
    }
}

//! Luck thermal printer driver (D1 / DingDang family, 384 dots wide).
//!
//! Provides the image encoder that turns any raster into the printer's
//! `GS v 0`-style command stream, the print driver that streams it in order,
//! and BLE, serial and dry-run transports.

pub mod encoder;
pub mod printer;
pub mod profile;
pub mod protocol;
pub mod transport;

// Re-exports for convenience
pub use encoder::ImageEncoder;
pub use printer::LuckPrinter;
pub use profile::{Density, DeviceProfile};
pub use protocol::{LuckProtocol, PrinterProtocol};
pub use transport::{BleTransport, DryRunTransport, SerialTransport, Transport};

/// Print width in pixels (standard for Luck series thermal printers).
pub const PRINT_WIDTH: u32 = 384;

/// Errors that can occur during printer operations.
#[derive(Debug, thiserror::Error)]
pub enum LuckPrinterError {
    #[error("Printer '{0}' not found during BLE scan")]
    PrinterNotFound(String),

    #[error("Missing write characteristic on connected device")]
    MissingCharacteristic,

    #[error("BLE connection error: {0}")]
    BleConnection(String),

    #[error("BLE write error: {0}")]
    BleWrite(String),

    #[error("BLE scan error: {0}")]
    BleScan(String),

    #[error("Serial port error: {0}")]
    Serial(String),

    #[error("Not connected to any device")]
    NotConnected,

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error(transparent)]
    Process(#[from] image_processor::ProcessError),

    #[error("Failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("Invalid configuration: {0}")]
    Configuration(String),
}

impl LuckPrinterError {
    /// Open, write or close failed on the underlying channel.
    pub fn is_transport_failure(&self) -> bool {
        matches!(
            self,
            Self::PrinterNotFound(_)
                | Self::MissingCharacteristic
                | Self::BleConnection(_)
                | Self::BleWrite(_)
                | Self::BleScan(_)
                | Self::Serial(_)
                | Self::NotConnected
        )
    }

    /// The input image was rejected before anything was sent.
    pub fn is_invalid_image(&self) -> bool {
        matches!(
            self,
            Self::InvalidImage(_) | Self::Process(_) | Self::Decode(_)
        )
    }

    pub fn is_configuration_error(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Result type alias for luckprinter operations.
pub type Result<T> = std::result::Result<T, LuckPrinterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories_are_disjoint() {
        let cases = vec![
            LuckPrinterError::BleWrite("gatt".into()),
            LuckPrinterError::Serial("eio".into()),
            LuckPrinterError::NotConnected,
            LuckPrinterError::InvalidImage("too tall".into()),
            LuckPrinterError::Process(image_processor::ProcessError::EmptyImage {
                width: 0,
                height: 1,
            }),
            LuckPrinterError::Configuration("density 7".into()),
        ];

        for err in cases {
            let hits = [
                err.is_transport_failure(),
                err.is_invalid_image(),
                err.is_configuration_error(),
            ]
            .iter()
            .filter(|&&b| b)
            .count();
            assert_eq!(hits, 1, "{err} should belong to exactly one category");
        }
    }
}

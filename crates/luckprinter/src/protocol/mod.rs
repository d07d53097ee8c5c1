//! Printer protocol definitions.
//!
//! Only the Luck dialect is implemented. The trait is the seam where a
//! printer with different opcodes or BLE characteristics would plug in.

pub mod luck;

pub use luck::{LuckProtocol, encode_length};

use crate::Result;
use crate::profile::Density;

/// Trait defining the interface for printer protocol implementations.
///
/// Implementations provide the device's BLE characteristics and the exact
/// byte sequences for control commands and framed image data.
pub trait PrinterProtocol: Send + Sync {
    /// Human-readable protocol name (e.g. "Luck").
    fn name(&self) -> &str;

    /// BLE characteristic UUID for writing commands and data.
    fn write_characteristic(&self) -> uuid::Uuid;

    /// BLE characteristics the device reports status on.
    fn notify_characteristics(&self) -> Vec<uuid::Uuid>;

    /// Commands that wake the printer before a job.
    fn build_enable_sequence(&self) -> Vec<Vec<u8>>;

    /// Command that stops the printer from powering off mid-session.
    fn build_disable_shutdown(&self) -> Vec<u8>;

    /// Density-select command, sent before each image.
    fn build_density_command(&self, density: Density) -> Vec<u8>;

    /// Frame a hex image payload into ordered transport chunks.
    fn build_image_frames(&self, payload_hex: &str) -> Result<Vec<Vec<u8>>>;

    /// Commands that feed paper and end the job.
    fn build_finish_sequence(&self) -> Vec<Vec<u8>>;
}

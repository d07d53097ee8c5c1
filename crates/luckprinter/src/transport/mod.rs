//! Byte channels to the printer.
//!
//! - [`ble`]: Bluetooth Low Energy GATT writes via btleplug
//! - [`serial`]: serial port or bound RFCOMM device
//! - [`dry_run`]: in-memory recorder for dry runs and tests

pub mod ble;
pub mod dry_run;
pub mod serial;

pub use ble::BleTransport;
pub use dry_run::DryRunTransport;
pub use serial::SerialTransport;

use async_trait::async_trait;

use crate::Result;

/// A sequential, in-order byte channel to one printer.
///
/// Each `write` must be fully delivered before it returns. Implementations
/// do not retry; a failed call is reported to the caller as-is.
#[async_trait]
pub trait Transport: Send {
    async fn open(&mut self) -> Result<()>;

    async fn write(&mut self, data: &[u8]) -> Result<()>;

    async fn close(&mut self) -> Result<()>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn open(&mut self) -> Result<()> {
        (**self).open().await
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        (**self).write(data).await
    }

    async fn close(&mut self) -> Result<()> {
        (**self).close().await
    }
}

//! Print driver: owns a transport and streams encoded jobs to it in order.
//!
//! A job is encoded completely before the first byte is written, so a bad
//! image never reaches the device. Once streaming starts, the first failed
//! write aborts the job; the partially sent frame is not resumed or retried.

use std::path::Path;

use image::DynamicImage;

use crate::Result;
use crate::encoder::ImageEncoder;
use crate::profile::DeviceProfile;
use crate::protocol::{LuckProtocol, PrinterProtocol};
use crate::transport::Transport;

/// A Luck printer session over any [`Transport`].
pub struct LuckPrinter<T, P = LuckProtocol> {
    transport: T,
    encoder: ImageEncoder<P>,
}

impl<T: Transport> LuckPrinter<T> {
    /// Create a printer session with the Luck protocol.
    pub fn new(transport: T, profile: DeviceProfile) -> Result<Self> {
        Ok(Self::with_encoder(transport, ImageEncoder::new(profile)?))
    }
}

impl<T: Transport, P: PrinterProtocol> LuckPrinter<T, P> {
    pub fn with_encoder(transport: T, encoder: ImageEncoder<P>) -> Self {
        Self { transport, encoder }
    }

    pub fn encoder(&self) -> &ImageEncoder<P> {
        &self.encoder
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Open the transport, wake the printer and keep it from powering off.
    pub async fn initialize(&mut self) -> Result<()> {
        self.open().await?;
        self.enable().await?;
        self.disable_shutdown().await
    }

    pub async fn open(&mut self) -> Result<()> {
        self.transport.open().await
    }

    pub async fn close(&mut self) -> Result<()> {
        self.transport.close().await
    }

    pub async fn enable(&mut self) -> Result<()> {
        let commands = self.encoder.protocol().build_enable_sequence();
        self.send_all(&commands).await
    }

    pub async fn disable_shutdown(&mut self) -> Result<()> {
        let command = self.encoder.protocol().build_disable_shutdown();
        self.transport.write(&command).await
    }

    /// Feed paper past the tear bar and end the job.
    pub async fn print_end(&mut self) -> Result<()> {
        let commands = self.encoder.protocol().build_finish_sequence();
        self.send_all(&commands).await
    }

    /// Encode and print one image.
    pub async fn print_image(&mut self, img: &DynamicImage) -> Result<()> {
        let commands = self.encoder.encode(img)?;
        tracing::info!(
            width = img.width(),
            height = img.height(),
            chunk_count = commands.len(),
            "Printing image"
        );
        self.send_all(&commands).await?;
        tracing::info!("Image sent");
        Ok(())
    }

    /// Decode an image file and print it.
    pub async fn print_image_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "Decoding image file");
        let img = image::open(path)?;
        self.print_image(&img).await
    }

    /// Write each command in order, stopping at the first failure.
    async fn send_all(&mut self, commands: &[Vec<u8>]) -> Result<()> {
        let total = commands.len();
        for (i, cmd) in commands.iter().enumerate() {
            if let Err(e) = self.transport.write(cmd).await {
                tracing::error!(chunk = i + 1, total, error = %e, "Write failed, aborting");
                return Err(e);
            }
        }
        Ok(())
    }
}

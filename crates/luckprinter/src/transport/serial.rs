//! Serial device transport (a bound `/dev/rfcomm*` or a USB serial adapter).
//!
//! Bind the printer first so the kernel exposes a device node:
//!
//! ```text
//! $ sudo rfcomm bind 1 60:6E:41:62:DC:F4
//! # This creates /dev/rfcomm1
//! ```
//!
//! The device is opened write-only and every `write` is flushed before it
//! returns. When the node is a tty it is switched to raw mode first, so the
//! line discipline never rewrites `0x0A` as `0D 0A` or swallows `0x11`/`0x13`
//! as flow control.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::Transport;
use crate::{LuckPrinterError, Result};

/// Default RFCOMM device path
pub const DEFAULT_DEVICE: &str = "/dev/rfcomm1";

/// Printer reachable through a serial device node.
pub struct SerialTransport {
    path: PathBuf,
    file: Option<File>,
}

impl SerialTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_connected(&self) -> bool {
        self.file.is_some()
    }
}

impl Default for SerialTransport {
    fn default() -> Self {
        Self::new(DEFAULT_DEVICE)
    }
}

#[async_trait]
impl Transport for SerialTransport {
    async fn open(&mut self) -> Result<()> {
        tracing::info!(path = %self.path.display(), "Opening serial device");
        let mut options = OpenOptions::new();
        options.write(true);
        #[cfg(unix)]
        options.custom_flags(libc::O_NOCTTY);

        let file = options.open(&self.path).await.map_err(|e| {
            LuckPrinterError::Serial(format!("Failed to open {}: {e}", self.path.display()))
        })?;

        configure_tty_raw(&file)?;
        self.file = Some(file);
        Ok(())
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let file = self.file.as_mut().ok_or(LuckPrinterError::NotConnected)?;
        file.write_all(data)
            .await
            .map_err(|e| LuckPrinterError::Serial(format!("Write failed: {e}")))?;
        file.flush()
            .await
            .map_err(|e| LuckPrinterError::Serial(format!("Flush failed: {e}")))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush()
                .await
                .map_err(|e| LuckPrinterError::Serial(format!("Flush failed: {e}")))?;
            tracing::info!(path = %self.path.display(), "Closed serial device");
        }
        Ok(())
    }
}

/// Put a tty into raw 8-bit mode. Non-tty nodes are left alone.
///
/// Clears input translation and XON/XOFF flow control (IXON, IXOFF, IXANY),
/// output post-processing (OPOST), echo, canonical mode and signals, and
/// selects CS8 without parity.
#[cfg(unix)]
fn configure_tty_raw(file: &File) -> Result<()> {
    use std::mem::MaybeUninit;
    use std::os::unix::io::AsRawFd;

    let fd = file.as_raw_fd();
    if unsafe { libc::isatty(fd) } == 0 {
        tracing::debug!("Device is not a tty, skipping raw mode");
        return Ok(());
    }

    let mut termios = MaybeUninit::uninit();
    if unsafe { libc::tcgetattr(fd, termios.as_mut_ptr()) } != 0 {
        return Err(LuckPrinterError::Serial(format!(
            "tcgetattr failed: {}",
            std::io::Error::last_os_error()
        )));
    }
    let mut termios = unsafe { termios.assume_init() };

    termios.c_iflag &= !(libc::IGNBRK
        | libc::BRKINT
        | libc::PARMRK
        | libc::ISTRIP
        | libc::INLCR
        | libc::IGNCR
        | libc::ICRNL
        | libc::IXON
        | libc::IXOFF
        | libc::IXANY);
    termios.c_oflag &= !libc::OPOST;
    termios.c_lflag &= !(libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN);
    termios.c_cflag &= !(libc::CSIZE | libc::PARENB);
    termios.c_cflag |= libc::CS8;

    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &termios) } != 0 {
        return Err(LuckPrinterError::Serial(format!(
            "tcsetattr failed: {}",
            std::io::Error::last_os_error()
        )));
    }

    tracing::debug!(fd, "Configured tty for raw output");
    Ok(())
}

#[cfg(not(unix))]
fn configure_tty_raw(_file: &File) -> Result<()> {
    Ok(())
}

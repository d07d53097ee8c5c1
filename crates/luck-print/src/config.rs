//! Runtime configuration loaded from the environment, with CLI overrides.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use luckprinter::{Density, DeviceProfile};

/// Print an image on a Luck thermal printer.
#[derive(Debug, Parser)]
#[command(name = "luck-print", version, about)]
pub struct Args {
    /// Image file to print.
    pub image: PathBuf,

    /// BLE address, peripheral UUID or advertised name of the printer.
    #[arg(long, conflicts_with = "serial")]
    pub address: Option<String>,

    /// Serial device path, e.g. /dev/rfcomm1.
    #[arg(long)]
    pub serial: Option<String>,

    /// Print density: low, normal or high.
    #[arg(long)]
    pub density: Option<Density>,

    /// Brightness factor between 0.0 and 1.0.
    #[arg(long)]
    pub brightness: Option<f64>,

    /// Contrast factor (squared before use).
    #[arg(long)]
    pub contrast: Option<f64>,

    /// Encode and record the job without touching a device.
    #[arg(long)]
    pub dry_run: bool,

    /// Write the recorded dry-run byte stream to this file.
    #[arg(long, requires = "dry_run")]
    pub dump: Option<PathBuf>,
}

/// Where the job goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportKind {
    DryRun,
    Serial(String),
    Ble(String),
}

/// Runtime configuration populated from `LUCK_*` environment variables.
#[derive(Debug, Clone, PartialEq)]
pub struct PrintConfig {
    pub printer_address: String,
    pub serial_path: String,
    pub brightness: f64,
    pub contrast: f64,
    pub density: Density,
    pub dry_run: bool,
}

impl Default for PrintConfig {
    fn default() -> Self {
        let profile = DeviceProfile::default();
        Self {
            printer_address: String::new(),
            serial_path: String::new(),
            brightness: profile.brightness,
            contrast: profile.contrast,
            density: profile.density,
            dry_run: false,
        }
    }
}

impl PrintConfig {
    /// Load configuration from the process environment.
    pub fn load() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup (empty values count as unset).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let g = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        Ok(Self {
            printer_address: g("LUCK_PRINTER_ADDRESS").unwrap_or_default(),
            serial_path: g("LUCK_PRINTER_SERIAL").unwrap_or_default(),
            brightness: parse_f64(g("LUCK_BRIGHTNESS"), "LUCK_BRIGHTNESS", defaults.brightness)?,
            contrast: parse_f64(g("LUCK_CONTRAST"), "LUCK_CONTRAST", defaults.contrast)?,
            density: match g("LUCK_DENSITY") {
                Some(v) => v.parse().context("LUCK_DENSITY")?,
                None => defaults.density,
            },
            dry_run: parse_bool(g("LUCK_DRY_RUN"), "LUCK_DRY_RUN", defaults.dry_run)?,
        })
    }

    /// Command-line flags take precedence over the environment.
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(address) = &args.address {
            self.printer_address = address.clone();
            self.serial_path.clear();
        }
        if let Some(path) = &args.serial {
            self.serial_path = path.clone();
            self.printer_address.clear();
        }
        if let Some(density) = args.density {
            self.density = density;
        }
        if let Some(brightness) = args.brightness {
            self.brightness = brightness;
        }
        if let Some(contrast) = args.contrast {
            self.contrast = contrast;
        }
        self.dry_run |= args.dry_run;
    }

    pub fn profile(&self) -> DeviceProfile {
        DeviceProfile::new()
            .with_brightness(self.brightness)
            .with_contrast(self.contrast)
            .with_density(self.density)
    }

    /// Pick the transport. Dry run wins; otherwise serial before BLE.
    pub fn transport_kind(&self) -> anyhow::Result<TransportKind> {
        if self.dry_run {
            Ok(TransportKind::DryRun)
        } else if !self.serial_path.is_empty() {
            Ok(TransportKind::Serial(self.serial_path.clone()))
        } else if !self.printer_address.is_empty() {
            Ok(TransportKind::Ble(self.printer_address.clone()))
        } else {
            anyhow::bail!(
                "no printer configured: pass --address or --serial, or set LUCK_PRINTER_ADDRESS / LUCK_PRINTER_SERIAL"
            )
        }
    }
}

fn parse_f64(value: Option<String>, key: &str, default: f64) -> anyhow::Result<f64> {
    match value {
        Some(v) => v
            .parse()
            .with_context(|| format!("{key} must be a number, got '{v}'")),
        None => Ok(default),
    }
}

fn parse_bool(value: Option<String>, key: &str, default: bool) -> anyhow::Result<bool> {
    let Some(v) = value else {
        return Ok(default);
    };
    match v.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("{key} must be true or false, got '{v}'"),
    }
}

//! BLE connection management using btleplug.
//!
//! `open` scans for the configured device, connects, discovers the write
//! characteristic and subscribes to status notifications. Every `write` is a
//! single GATT write of the given bytes.

use std::time::Duration;

use async_trait::async_trait;
use btleplug::api::{
    Central, CentralEvent, CharPropFlags, Characteristic, Manager as _, Peripheral as _,
    ScanFilter, WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use futures::StreamExt;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::Transport;
use crate::protocol::{LuckProtocol, PrinterProtocol};
use crate::{LuckPrinterError, Result};

/// Default BLE scan timeout in seconds.
const SCAN_TIMEOUT_SECS: u64 = 10;

/// Byte the printer notifies when it stops a job.
const STOP_SIGNAL: u8 = 0xaa;

/// Printer reachable over Bluetooth Low Energy.
pub struct BleTransport {
    /// Address (Linux/Windows), peripheral UUID (macOS) or advertised name.
    target: String,
    write_uuid: Uuid,
    notify_uuids: Vec<Uuid>,
    scan_timeout: Duration,
    peripheral: Option<Peripheral>,
    write_char: Option<Characteristic>,
    notify_task: Option<JoinHandle<()>>,
}

impl BleTransport {
    /// Create a transport for a Luck printer at `target`.
    pub fn new(target: impl Into<String>) -> Self {
        Self::for_protocol(target, &LuckProtocol::new())
    }

    /// Create a transport using the characteristics of `protocol`.
    pub fn for_protocol(target: impl Into<String>, protocol: &impl PrinterProtocol) -> Self {
        Self {
            target: target.into(),
            write_uuid: protocol.write_characteristic(),
            notify_uuids: protocol.notify_characteristics(),
            scan_timeout: Duration::from_secs(SCAN_TIMEOUT_SECS),
            peripheral: None,
            write_char: None,
            notify_task: None,
        }
    }

    /// Builder: set how long `open` scans for the device.
    pub fn with_scan_timeout(mut self, timeout: Duration) -> Self {
        self.scan_timeout = timeout;
        self
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Check whether a peripheral is currently connected.
    pub fn is_connected(&self) -> bool {
        self.peripheral.is_some()
    }

    /// Initialize the platform BLE adapter (first available).
    async fn first_adapter() -> Result<Adapter> {
        let manager = Manager::new()
            .await
            .map_err(|e| LuckPrinterError::BleConnection(e.to_string()))?;

        let adapters = manager
            .adapters()
            .await
            .map_err(|e| LuckPrinterError::BleConnection(e.to_string()))?;

        adapters
            .into_iter()
            .next()
            .ok_or_else(|| LuckPrinterError::BleConnection("No BLE adapter found".into()))
    }

    /// Scan until a peripheral matching the target shows up or the timeout
    /// elapses.
    async fn find_peripheral(&self, adapter: &Adapter) -> Result<Peripheral> {
        tracing::info!(
            device = %self.target,
            timeout_secs = self.scan_timeout.as_secs(),
            "Starting BLE scan"
        );

        let mut events = adapter
            .events()
            .await
            .map_err(|e| LuckPrinterError::BleScan(e.to_string()))?;

        adapter
            .start_scan(ScanFilter::default())
            .await
            .map_err(|e| LuckPrinterError::BleScan(e.to_string()))?;

        let deadline = tokio::time::sleep(self.scan_timeout);
        tokio::pin!(deadline);

        let mut found = None;
        loop {
            tokio::select! {
                _ = &mut deadline => break,
                event = events.next() => {
                    let Some(event) = event else { break };
                    let id = match event {
                        CentralEvent::DeviceDiscovered(id) | CentralEvent::DeviceUpdated(id) => id,
                        _ => continue,
                    };
                    let Ok(peripheral) = adapter.peripheral(&id).await else { continue };
                    let Ok(Some(props)) = peripheral.properties().await else { continue };

                    let candidates = [
                        id.to_string(),
                        props.address.to_string(),
                        props.local_name.clone().unwrap_or_default(),
                    ];
                    if candidates.iter().any(|c| matches_target(c, &self.target)) {
                        tracing::info!(
                            id = %id,
                            name = props.local_name.as_deref().unwrap_or(""),
                            "Found printer"
                        );
                        found = Some(peripheral);
                        break;
                    }
                }
            }
        }

        adapter
            .stop_scan()
            .await
            .map_err(|e| LuckPrinterError::BleScan(e.to_string()))?;

        found.ok_or_else(|| LuckPrinterError::PrinterNotFound(self.target.clone()))
    }

    /// Subscribe to the notify characteristics and log what the printer
    /// reports until the connection is closed.
    async fn subscribe_notifications(&mut self, peripheral: &Peripheral) -> Result<()> {
        let notify_chars: Vec<Characteristic> = peripheral
            .characteristics()
            .into_iter()
            .filter(|c| self.notify_uuids.contains(&c.uuid))
            .collect();

        for c in &notify_chars {
            peripheral
                .subscribe(c)
                .await
                .map_err(|e| LuckPrinterError::BleConnection(e.to_string()))?;
        }

        let mut stream = peripheral
            .notifications()
            .await
            .map_err(|e| LuckPrinterError::BleConnection(e.to_string()))?;

        self.notify_task = Some(tokio::spawn(async move {
            while let Some(n) = stream.next().await {
                tracing::debug!(uuid = %n.uuid, data = ?n.value, "BLE notification");
                if n.value == [STOP_SIGNAL] {
                    tracing::info!("Printer sent stop signal");
                }
            }
        }));

        tracing::debug!(count = notify_chars.len(), "Subscribed to notifications");
        Ok(())
    }

    /// Discover services, locate the write characteristic and subscribe to
    /// notifications on a freshly connected peripheral.
    async fn setup_link(&mut self, peripheral: &Peripheral) -> Result<Characteristic> {
        peripheral
            .discover_services()
            .await
            .map_err(|e| LuckPrinterError::BleConnection(e.to_string()))?;

        let write_char = peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == self.write_uuid)
            .ok_or(LuckPrinterError::MissingCharacteristic)?;

        self.subscribe_notifications(peripheral).await?;
        Ok(write_char)
    }
}

/// Run `disconnect` when `result` is an error. The setup error is returned
/// either way; a failed disconnect is only logged.
async fn disconnect_on_error<T, F, Fut>(result: Result<T>, disconnect: F) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    if let Err(e) = &result {
        tracing::warn!(error = %e, "BLE setup failed after connect, disconnecting");
        if let Err(disconnect_err) = disconnect().await {
            tracing::warn!(error = %disconnect_err, "Disconnect after failed setup also failed");
        }
    }
    result
}

#[async_trait]
impl Transport for BleTransport {
    async fn open(&mut self) -> Result<()> {
        let adapter = Self::first_adapter().await?;
        let peripheral = self.find_peripheral(&adapter).await?;

        tracing::info!(device = %self.target, "Connecting to device");
        peripheral
            .connect()
            .await
            .map_err(|e| LuckPrinterError::BleConnection(e.to_string()))?;

        // From here on the link is up; a failed setup must not leave it open.
        let setup = self.setup_link(&peripheral).await;
        let write_char = disconnect_on_error(setup, || async {
            peripheral
                .disconnect()
                .await
                .map_err(|e| LuckPrinterError::BleConnection(e.to_string()))
        })
        .await?;

        self.write_char = Some(write_char);
        self.peripheral = Some(peripheral);

        tracing::info!("Connected and discovered characteristics");
        Ok(())
    }

    async fn write(&mut self, data: &[u8]) -> Result<()> {
        let peripheral = self
            .peripheral
            .as_ref()
            .ok_or(LuckPrinterError::NotConnected)?;
        let write_char = self
            .write_char
            .as_ref()
            .ok_or(LuckPrinterError::MissingCharacteristic)?;

        let write_type = if write_char.properties.contains(CharPropFlags::WRITE) {
            WriteType::WithResponse
        } else {
            WriteType::WithoutResponse
        };

        peripheral
            .write(write_char, data, write_type)
            .await
            .map_err(|e| LuckPrinterError::BleWrite(format!("{} bytes: {e}", data.len())))
    }

    /// Disconnect from the currently connected peripheral.
    async fn close(&mut self) -> Result<()> {
        if let Some(task) = self.notify_task.take() {
            task.abort();
        }
        if let Some(ref peripheral) = self.peripheral {
            tracing::info!("Disconnecting BLE device");
            peripheral
                .disconnect()
                .await
                .map_err(|e| LuckPrinterError::BleConnection(e.to_string()))?;
        }
        self.peripheral = None;
        self.write_char = None;
        Ok(())
    }
}

/// Compare device identifiers ignoring case and separators, so
/// `60:6E:41:62:DC:F4` matches `606e4162dcf4`.
fn matches_target(candidate: &str, target: &str) -> bool {
    if candidate.is_empty() || target.is_empty() {
        return false;
    }
    candidate.eq_ignore_ascii_case(target)
        || normalize_device_id(candidate) == normalize_device_id(target)
}

fn normalize_device_id(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_target_ignores_case_and_separators() {
        assert!(matches_target("60:6E:41:62:DC:F4", "60:6e:41:62:dc:f4"));
        assert!(matches_target("60:6E:41:62:DC:F4", "606E4162DCF4"));
        assert!(matches_target(
            "028EBD80-9CCC-AD10-E727-8715AF47A664",
            "028ebd80-9ccc-ad10-e727-8715af47a664"
        ));
        assert!(matches_target("LuckP_D1", "luckp_d1"));
    }

    #[test]
    fn test_matches_target_rejects_other_devices() {
        assert!(!matches_target("60:6E:41:62:DC:F5", "60:6E:41:62:DC:F4"));
        assert!(!matches_target("", "60:6E:41:62:DC:F4"));
        assert!(!matches_target("LuckP_D1", ""));
    }

    #[test]
    fn test_new_uses_luck_characteristics() {
        let t = BleTransport::new("60:6E:41:62:DC:F4").with_scan_timeout(Duration::from_secs(3));
        assert_eq!(t.target(), "60:6E:41:62:DC:F4");
        assert_eq!(t.write_uuid, LuckProtocol::new().write_characteristic());
        assert_eq!(t.notify_uuids.len(), 2);
        assert_eq!(t.scan_timeout, Duration::from_secs(3));
        assert!(!t.is_connected());
    }

    #[tokio::test]
    async fn test_failed_setup_disconnects() {
        let mut disconnects = 0;
        let setup: Result<()> = Err(LuckPrinterError::MissingCharacteristic);
        let result = disconnect_on_error(setup, || {
            disconnects += 1;
            async { Ok(()) }
        })
        .await;

        assert!(matches!(result, Err(LuckPrinterError::MissingCharacteristic)));
        assert_eq!(disconnects, 1);
    }

    #[tokio::test]
    async fn test_successful_setup_stays_connected() {
        let mut disconnects = 0;
        let result = disconnect_on_error(Ok(7u8), || {
            disconnects += 1;
            async { Ok(()) }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(disconnects, 0);
    }

    #[tokio::test]
    async fn test_setup_error_wins_over_disconnect_error() {
        let result: Result<()> = disconnect_on_error(
            Err(LuckPrinterError::BleConnection("discover failed".into())),
            || async { Err(LuckPrinterError::BleConnection("already gone".into())) },
        )
        .await;

        let err = result.unwrap_err();
        assert!(err.to_string().contains("discover failed"), "{err}");
    }

    #[tokio::test]
    async fn test_write_before_open_is_not_connected() {
        let mut t = BleTransport::new("60:6E:41:62:DC:F4");
        let err = t.write(&[0x10, 0xff, 0x40]).await.unwrap_err();
        assert!(matches!(err, LuckPrinterError::NotConnected));
    }
}

//! HID transport backed by `hidapi` (feature `transport-hid`).
//!
//! The barcode scanner is a USB HID device delivering whole input reports.
//! `hidapi` is a blocking API, so reads run on a dedicated thread; each
//! successful read becomes one [`TransportEvent::DataReceived`], preserving
//! the packet boundary the HID codec relies on.

use crate::error::{Result, TransportError};
use crate::traits::{Transport, TransportEvent};
use bytes::Bytes;
use hidapi::{HidApi, HidDevice};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// USB input report size.
const REPORT_SIZE: usize = 64;

/// Blocking read timeout in milliseconds; bounds how fast the reader
/// thread notices the transport side has been dropped.
const READ_TIMEOUT_MS: i32 = 100;

/// Inbound event channel depth.
const EVENT_CHANNEL_DEPTH: usize = 32;

/// A HID device transport.
pub struct HidTransport {
    device: Arc<HidDevice>,
    event_rx: mpsc::Receiver<TransportEvent>,
    exhausted: bool,
}

impl HidTransport {
    /// Open the first HID device matching the vendor/product pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the HID subsystem cannot be initialized or the
    /// device is absent.
    pub fn open(vendor_id: u16, product_id: u16) -> Result<Self> {
        let api = HidApi::new()
            .map_err(|e| TransportError::unavailable(format!("hidapi init failed: {e}")))?;
        let device = api.open(vendor_id, product_id).map_err(|e| {
            TransportError::unavailable(format!("{vendor_id:04x}:{product_id:04x}: {e}"))
        })?;
        let device = Arc::new(device);

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_DEPTH);
        let reader = Arc::clone(&device);
        std::thread::Builder::new()
            .name("cashlink-hid-rx".to_string())
            .spawn(move || read_loop(reader, event_tx))?;

        debug!(vendor_id, product_id, "HID transport opened");
        Ok(HidTransport {
            device,
            event_rx,
            exhausted: false,
        })
    }
}

/// Reader thread: deliver whole input reports until either side goes away.
fn read_loop(device: Arc<HidDevice>, tx: mpsc::Sender<TransportEvent>) {
    let mut buf = [0u8; REPORT_SIZE];
    loop {
        match device.read_timeout(&mut buf, READ_TIMEOUT_MS) {
            Ok(0) => {
                // Timeout with no report.
                if tx.is_closed() {
                    break;
                }
            }
            Ok(n) => {
                let report = Bytes::copy_from_slice(&buf[..n]);
                if tx.blocking_send(TransportEvent::DataReceived(report)).is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "HID read failed, closing link");
                let _ = tx.blocking_send(TransportEvent::Error(e.to_string()));
                let _ = tx.blocking_send(TransportEvent::Disconnected);
                break;
            }
        }
    }
}

impl Transport for HidTransport {
    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let device = Arc::clone(&self.device);
        // hidapi wants the report ID in front; 0 means "no report IDs".
        let mut report = Vec::with_capacity(bytes.len() + 1);
        report.push(0u8);
        report.extend_from_slice(bytes);

        tokio::task::spawn_blocking(move || {
            device
                .write(&report)
                .map(|_| ())
                .map_err(|e| TransportError::write_failed(e.to_string()))
        })
        .await
        .map_err(|e| TransportError::write_failed(format!("write task failed: {e}")))?
    }

    async fn next_event(&mut self) -> TransportEvent {
        if self.exhausted {
            return TransportEvent::Disconnected;
        }
        let event = self
            .event_rx
            .recv()
            .await
            .unwrap_or(TransportEvent::Disconnected);
        if matches!(event, TransportEvent::Disconnected) {
            self.exhausted = true;
        }
        event
    }
}

//! Barcode scanner driver surface.
//!
//! Wraps a [`DeviceLink`] running the HID codec. Configuration writes are
//! tag/sub-tag menu commands; the interesting traffic is unsolicited,
//! decode-data packets projected into [`ScanResult`]s.

use crate::LinkConfig;
use crate::engine::{DeviceLink, LinkEvent};
use crate::error::Result;
use cashlink_hardware::Transport;
use cashlink_protocol::commands::scanner;
use cashlink_protocol::{EventKind, HidCodec, MenuCommand};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{trace, warn};

/// One decoded barcode.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Symbology identifier as reported by the device.
    pub symbology: u8,
    /// Decoded barcode bytes.
    pub data: bytes::Bytes,
    /// When the scan entered the process.
    pub at: DateTime<Utc>,
}

/// A typed scanner event.
#[derive(Debug, Clone)]
pub enum ScannerEvent {
    /// A barcode was decoded.
    Scan(ScanResult),

    /// The transport failed; outstanding commands were errored.
    TransportError { message: String },

    /// The device is gone.
    Disconnected,
}

/// Driver handle for the barcode scanner.
#[derive(Debug, Clone)]
pub struct BarcodeScanner {
    link: DeviceLink,
}

impl BarcodeScanner {
    /// Wrap an existing link (must be running the HID codec).
    pub fn new(link: DeviceLink) -> Self {
        BarcodeScanner { link }
    }

    /// Spawn a link over `transport` with the HID codec.
    pub fn spawn<T: Transport + 'static>(transport: T, config: LinkConfig) -> Self {
        Self::new(DeviceLink::spawn(HidCodec::new(), transport, config))
    }

    /// The underlying link.
    pub fn link(&self) -> &DeviceLink {
        &self.link
    }

    /// Write a configuration menu command to the scanner.
    pub async fn configure(&self, menu: &MenuCommand) -> Result<()> {
        let command = scanner::configure(menu)?;
        self.link.submit(command).await.map(|_| ())
    }

    /// Subscribe to typed scanner events.
    pub async fn events(&self) -> ScannerEvents {
        ScannerEvents {
            rx: self.link.subscribe().await,
        }
    }
}

/// Stream of typed scanner events.
#[derive(Debug)]
pub struct ScannerEvents {
    rx: mpsc::Receiver<LinkEvent>,
}

impl ScannerEvents {
    /// Next event, or `None` once the link has shut down.
    pub async fn next(&mut self) -> Option<ScannerEvent> {
        loop {
            let event = self.rx.recv().await?;
            if let Some(projected) = project(event) {
                return Some(projected);
            }
        }
    }
}

/// Map a raw link event onto the scanner vocabulary.
fn project(event: LinkEvent) -> Option<ScannerEvent> {
    match event {
        LinkEvent::Device { kind, payload, at } => match kind {
            EventKind::ScanData => {
                // Payload layout: marker, symbology, barcode bytes.
                if payload.len() < 2 {
                    warn!(len = payload.len(), "scan packet too short");
                    return None;
                }
                Some(ScannerEvent::Scan(ScanResult {
                    symbology: payload[1],
                    data: payload.slice(2..),
                    at,
                }))
            }
            other => {
                trace!(kind = %other, "event ignored by scanner");
                None
            }
        },
        LinkEvent::TransportError { message } => Some(ScannerEvent::TransportError { message }),
        LinkEvent::Disconnected => Some(ScannerEvent::Disconnected),
    }
}

//! Serial transport backed by `serialport` (feature `transport-serial`).
//!
//! The note validator hangs off an 8N1 serial line. `serialport` exposes a
//! blocking port, so reads happen on a dedicated thread that pumps
//! [`TransportEvent`]s into a channel; writes go through the blocking pool
//! on a cloned handle of the same TTY.

use crate::error::{Result, TransportError};
use crate::traits::{Transport, TransportEvent};
use bytes::Bytes;
use serialport::{DataBits, FlowControl, Parity, StopBits, TTYPort};
use std::io::{Read, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Default baud rate for the validator link.
pub const DEFAULT_BAUD_RATE: u32 = 9_600;

/// Blocking read timeout; also bounds how fast the reader thread notices
/// that the transport side has been dropped.
const READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Read chunk size.
const READ_CHUNK: usize = 256;

/// Inbound event channel depth.
const EVENT_CHANNEL_DEPTH: usize = 32;

/// A serial device transport.
pub struct SerialTransport {
    port: Arc<Mutex<TTYPort>>,
    event_rx: mpsc::Receiver<TransportEvent>,
    exhausted: bool,
    path: String,
}

impl SerialTransport {
    /// Open a serial device at the default baud rate.
    ///
    /// # Errors
    ///
    /// Returns an error if the device cannot be opened or cloned for the
    /// reader thread.
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with_baud(path, DEFAULT_BAUD_RATE)
    }

    /// Open a serial device at a specific baud rate (8N1, no flow control).
    pub fn open_with_baud(path: &str, baud: u32) -> Result<Self> {
        let port = serialport::new(path, baud)
            .flow_control(FlowControl::None)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .timeout(READ_TIMEOUT)
            .open_native()
            .map_err(|e| TransportError::unavailable(format!("{path}: {e}")))?;

        let reader = port
            .try_clone_native()
            .map_err(|e| TransportError::unavailable(format!("{path}: clone failed: {e}")))?;

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_DEPTH);
        std::thread::Builder::new()
            .name("cashlink-serial-rx".to_string())
            .spawn(move || read_loop(reader, event_tx))?;

        debug!(path, baud, "serial transport opened");
        Ok(SerialTransport {
            port: Arc::new(Mutex::new(port)),
            event_rx,
            exhausted: false,
            path: path.to_string(),
        })
    }
}

/// Reader thread: pump bytes until the device or the engine goes away.
fn read_loop(mut port: TTYPort, tx: mpsc::Sender<TransportEvent>) {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match port.read(&mut buf) {
            Ok(0) => {
                if tx.is_closed() {
                    break;
                }
            }
            Ok(n) => {
                let bytes = Bytes::copy_from_slice(&buf[..n]);
                if tx.blocking_send(TransportEvent::DataReceived(bytes)).is_err() {
                    break;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                // Idle line; only worth a check that anyone still listens.
                if tx.is_closed() {
                    break;
                }
            }
            Err(e) => {
                warn!(error = %e, "serial read failed, closing link");
                let _ = tx.blocking_send(TransportEvent::Error(e.to_string()));
                let _ = tx.blocking_send(TransportEvent::Disconnected);
                break;
            }
        }
    }
}

impl Transport for SerialTransport {
    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        let port = Arc::clone(&self.port);
        let owned = bytes.to_vec();
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || {
            let mut port = port
                .lock()
                .map_err(|_| TransportError::write_failed("serial port lock poisoned"))?;
            port.write_all(&owned)?;
            port.flush()?;
            Ok(())
        })
        .await
        .map_err(|e| TransportError::write_failed(format!("{path}: write task failed: {e}")))?
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

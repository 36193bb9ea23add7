//! Mock transport for testing and development.
//!
//! Follows the `(device, handle)` pattern: the transport side is handed to
//! the engine, the handle stays with the test and scripts the device:
//! pushing inbound bytes, injecting errors, capturing outbound writes.

use crate::error::{Result, TransportError};
use crate::traits::{Transport, TransportEvent};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// Channel depth for scripted inbound events.
const EVENT_CHANNEL_DEPTH: usize = 32;

/// Mock transport for tests.
///
/// # Examples
///
/// ```
/// use cashlink_hardware::{MockTransport, Transport, TransportEvent};
///
/// #[tokio::main]
/// async fn main() {
///     let (mut transport, mut handle) = MockTransport::new();
///
///     handle.push_bytes(&[0x02, 0x02, 0x10, 0x10]).await;
///     match transport.next_event().await {
///         TransportEvent::DataReceived(bytes) => assert_eq!(bytes.len(), 4),
///         other => panic!("unexpected: {other:?}"),
///     }
///
///     transport.write(&[0xaa]).await.unwrap();
///     assert_eq!(handle.next_write().await.unwrap().as_ref(), &[0xaa]);
/// }
/// ```
#[derive(Debug)]
pub struct MockTransport {
    event_rx: mpsc::Receiver<TransportEvent>,
    write_tx: mpsc::UnboundedSender<Bytes>,
    fail_writes: Arc<AtomicBool>,
    exhausted: bool,
}

/// Controller half of a [`MockTransport`].
#[derive(Debug)]
pub struct MockTransportHandle {
    event_tx: mpsc::Sender<TransportEvent>,
    write_rx: mpsc::UnboundedReceiver<Bytes>,
    fail_writes: Arc<AtomicBool>,
}

impl MockTransport {
    /// Create a transport/handle pair.
    pub fn new() -> (Self, MockTransportHandle) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_DEPTH);
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let fail_writes = Arc::new(AtomicBool::new(false));

        let transport = MockTransport {
            event_rx,
            write_tx,
            fail_writes: Arc::clone(&fail_writes),
            exhausted: false,
        };
        let handle = MockTransportHandle {
            event_tx,
            write_rx,
            fail_writes,
        };
        (transport, handle)
    }
}

impl Transport for MockTransport {
    async fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(TransportError::write_failed("injected write failure"));
        }
        self.write_tx
            .send(Bytes::copy_from_slice(bytes))
            .map_err(|_| TransportError::disconnected("mock handle dropped"))
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

impl MockTransportHandle {
    /// Script inbound bytes for the transport.
    pub async fn push_bytes(&self, bytes: &[u8]) {
        let _ = self
            .event_tx
            .send(TransportEvent::DataReceived(Bytes::copy_from_slice(bytes)))
            .await;
    }

    /// Script a recoverable transport error.
    pub async fn push_error(&self, message: impl Into<String>) {
        let _ = self
            .event_tx
            .send(TransportEvent::Error(message.into()))
            .await;
    }

    /// Script the device going away.
    pub async fn disconnect(&self) {
        let _ = self.event_tx.send(TransportEvent::Disconnected).await;
    }

    /// Wait for the next outbound write. `None` once the transport side is
    /// dropped and everything written has been drained.
    pub async fn next_write(&mut self) -> Option<Bytes> {
        self.write_rx.recv().await
    }

    /// Non-blocking probe for an outbound write.
    pub fn try_next_write(&mut self) -> Option<Bytes> {
        self.write_rx.try_recv().ok()
    }

    /// Make every subsequent write fail until cleared.
    pub fn set_write_failure(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_bytes_arrive_in_order() {
        let (mut transport, handle) = MockTransport::new();

        handle.push_bytes(&[0x01]).await;
        handle.push_bytes(&[0x02, 0x03]).await;

        match transport.next_event().await {
            TransportEvent::DataReceived(b) => assert_eq!(b.as_ref(), &[0x01]),
            other => panic!("unexpected: {other:?}"),
        }
        match transport.next_event().await {
            TransportEvent::DataReceived(b) => assert_eq!(b.as_ref(), &[0x02, 0x03]),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_writes_are_captured() {
        let (mut transport, mut handle) = MockTransport::new();

        transport.write(&[0xaa, 0xbb]).await.unwrap();
        assert_eq!(handle.next_write().await.unwrap().as_ref(), &[0xaa, 0xbb]);
        assert!(handle.try_next_write().is_none());
    }

    #[tokio::test]
    async fn test_write_failure_injection() {
        let (mut transport, handle) = MockTransport::new();

        handle.set_write_failure(true);
        let result = transport.write(&[0x01]).await;
        assert!(matches!(result, Err(TransportError::WriteFailed { .. })));

        handle.set_write_failure(false);
        assert!(transport.write(&[0x01]).await.is_ok());
    }

    #[tokio::test]
    async fn test_disconnect_is_sticky() {
        let (mut transport, handle) = MockTransport::new();

        handle.disconnect().await;
        assert!(matches!(
            transport.next_event().await,
            TransportEvent::Disconnected
        ));
        // Exhausted transports keep reporting Disconnected.
        assert!(matches!(
            transport.next_event().await,
            TransportEvent::Disconnected
        ));
    }

    #[tokio::test]
    async fn test_dropped_handle_reads_as_disconnect() {
        let (mut transport, handle) = MockTransport::new();
        drop(handle);

        assert!(matches!(
            transport.next_event().await,
            TransportEvent::Disconnected
        ));
        assert!(transport.write(&[0x01]).await.is_err());
    }
}

//! Transport trait definitions.
//!
//! These traits use native `async fn` methods (Edition 2024 RPITIT); for
//! generic use pass the concrete transport as a type parameter, the way the
//! engine does.

#![allow(async_fn_in_trait)]

use crate::error::Result;
use bytes::Bytes;

/// One occurrence on the inbound side of a transport.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// Bytes arrived. For stream transports this is whatever the read
    /// returned; for packet transports it is one whole report.
    DataReceived(Bytes),

    /// A recoverable transport-level error. The link may keep operating.
    Error(String),

    /// The device is gone. No further events will follow.
    Disconnected,
}

/// Raw device transport: byte/packet writes plus an inbound event stream.
///
/// A transport is exclusively owned by a single engine task, which is the
/// only caller of both methods.
///
/// # Examples
///
/// ```no_run
/// use cashlink_hardware::{Transport, TransportEvent};
///
/// async fn drain<T: Transport>(transport: &mut T) {
///     loop {
///         match transport.next_event().await {
///             TransportEvent::DataReceived(bytes) => println!("{} bytes", bytes.len()),
///             TransportEvent::Error(e) => eprintln!("transport error: {e}"),
///             TransportEvent::Disconnected => break,
///         }
///     }
/// }
/// ```
pub trait Transport: Send {
    /// Write raw bytes to the device.
    ///
    /// # Errors
    ///
    /// Returns an error if the device rejected the write or is gone.
    fn write(&mut self, bytes: &[u8]) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Wait for the next inbound event.
    ///
    /// After [`TransportEvent::Disconnected`] has been returned the
    /// transport is exhausted; implementations keep returning
    /// `Disconnected` rather than blocking forever.
    fn next_event(&mut self) -> impl std::future::Future<Output = TransportEvent> + Send;
}

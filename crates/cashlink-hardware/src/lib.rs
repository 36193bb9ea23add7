//! Transport abstraction for the kiosk payment peripherals.
//!
//! The protocol engine talks to a device through the [`Transport`] trait:
//! raw byte/packet writes plus an inbound event stream of received data,
//! errors, and disconnects. The engine never assumes message boundaries
//! beyond what the frame codecs recover from length fields; a transport
//! may deliver one byte at a time (serial) or a whole report per event
//! (HID) and the stack behaves identically.
//!
//! # Implementations
//!
//! - [`mock::MockTransport`]: channel-backed pair of (transport, handle)
//!   for development and tests; the handle scripts inbound traffic and
//!   captures outbound writes.
//! - `serial::SerialTransport` (feature `transport-serial`): a
//!   `serialport` device with a blocking reader thread.
//! - `hid::HidTransport` (feature `transport-hid`): a `hidapi` device
//!   delivering whole input reports.
//!
//! A transport instance is exclusively owned by one engine task; none of
//! the traits here require `Sync`.

pub mod error;
pub mod mock;
pub mod traits;

#[cfg(feature = "transport-hid")]
pub mod hid;
#[cfg(feature = "transport-serial")]
pub mod serial;

pub use error::{Result, TransportError};
pub use mock::{MockTransport, MockTransportHandle};
pub use traits::{Transport, TransportEvent};

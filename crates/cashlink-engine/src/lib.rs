//! Polled half-duplex device-link engine for the kiosk payment
//! peripherals.
//!
//! This crate is the dispatch layer between callers and the wire codecs:
//!
//! - [`DeviceLink`]: a handle to a single-task engine enforcing
//!   at-most-one-command-in-flight with a FIFO backlog, matching replies
//!   to requests positionally (the wire formats carry no correlation
//!   identifiers) and routing unsolicited events to a subscriber sink.
//! - A polling scheduler that keeps the link alive with status commands
//!   while idle, self-suppressing around real traffic with a debounce.
//! - [`NoteAcceptor`] and [`BarcodeScanner`]: thin typed driver surfaces
//!   over the two protocol variants.
//!
//! # Example
//!
//! ```no_run
//! use cashlink_engine::{LinkConfig, NoteAcceptor, AcceptorEvent};
//! use cashlink_hardware::MockTransport;
//! use std::time::Duration;
//!
//! # async fn example() -> cashlink_engine::Result<()> {
//! let (transport, _handle) = MockTransport::new();
//! let acceptor = NoteAcceptor::spawn(transport, LinkConfig::default());
//!
//! // Startup handshake: one bounded wait for the denomination table.
//! let table = acceptor.wait_ready(Duration::from_secs(5)).await?;
//! println!("{} note channels", table.len());
//! acceptor.enable_all().await?;
//!
//! let mut events = acceptor.events().await;
//! while let Some(event) = events.next().await {
//!     if let AcceptorEvent::NoteInEscrow { value, .. } = event {
//!         println!("note in escrow: {value}");
//!         acceptor.accept_note().await?;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Degradation
//!
//! Nothing in this crate is fatal to the process. Malformed frames error
//! only the in-flight request; timeouts free the slot; a disconnect fails
//! everything outstanding and stops the engine, and the handles report
//! [`LinkError::LinkClosed`] from then on. Reconnection is the caller's
//! policy.

pub mod acceptor;
pub mod config;
mod dispatcher;
pub mod engine;
pub mod error;
mod poller;
pub mod scanner;

pub use acceptor::{AcceptorEvent, AcceptorEvents, NoteAcceptor};
pub use config::LinkConfig;
pub use engine::{DeviceLink, LinkEvent};
pub use error::{LinkError, Result};
pub use scanner::{BarcodeScanner, ScanResult, ScannerEvent, ScannerEvents};

//! Note validator driver surface.
//!
//! Wraps a [`DeviceLink`] running the serial codec and projects raw link
//! events into typed acceptor events. The denomination table gates the
//! enable path: channels must not be enabled before the table has been
//! decoded, because an acceptance event for an unknown channel could not
//! be valued.

use crate::engine::{DeviceLink, LinkEvent};
use crate::error::{LinkError, Result};
use crate::LinkConfig;
use cashlink_core::{ChannelIndex, Denomination};
use cashlink_hardware::Transport;
use cashlink_protocol::commands::acceptor;
use cashlink_protocol::table::DenominationTable;
use cashlink_protocol::{EventKind, SerialCodec};
use chrono::{DateTime, Utc};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{trace, warn};

/// Highest channel representable in the enable mask.
const MAX_MASK_CHANNEL: u8 = 15;

/// A typed note validator event.
#[derive(Debug, Clone)]
pub enum AcceptorEvent {
    /// A note is held in escrow, valued against the table.
    NoteInEscrow {
        channel: ChannelIndex,
        value: Denomination,
        at: DateTime<Utc>,
    },

    /// A note hit the sensors on a channel with no known value: soft
    /// rejection, the note should be returned by policy.
    UnsupportedChannel {
        channel: ChannelIndex,
        at: DateTime<Utc>,
    },

    /// The escrowed note was stacked into the cashbox.
    NoteStacked { at: DateTime<Utc> },

    /// The escrowed note was returned.
    NoteReturned { at: DateTime<Utc> },

    /// The note path is jammed.
    Jam { at: DateTime<Utc> },

    /// The cashbox was removed.
    CashboxRemoved { at: DateTime<Utc> },

    /// The transport failed; outstanding commands were errored.
    TransportError { message: String },

    /// The device is gone.
    Disconnected,
}

/// Driver handle for the note validator.
#[derive(Debug, Clone)]
pub struct NoteAcceptor {
    link: DeviceLink,
}

impl NoteAcceptor {
    /// Wrap an existing link (must be running the serial codec).
    pub fn new(link: DeviceLink) -> Self {
        NoteAcceptor { link }
    }

    /// Spawn a link over `transport` with the serial codec.
    pub fn spawn<T: Transport + 'static>(transport: T, config: LinkConfig) -> Self {
        Self::new(DeviceLink::spawn(SerialCodec::new(), transport, config))
    }

    /// The underlying link.
    pub fn link(&self) -> &DeviceLink {
        &self.link
    }

    /// Whether the denomination table has been received.
    pub fn is_ready(&self) -> bool {
        self.link.is_ready()
    }

    /// Snapshot of the denomination table.
    pub fn table(&self) -> Option<DenominationTable> {
        self.link.table()
    }

    /// Bounded wait for the denomination table (the startup handshake:
    /// the device pushes the table in answer to the first status poll).
    pub async fn wait_ready(&self, timeout: Duration) -> Result<DenominationTable> {
        self.link.wait_ready(timeout).await
    }

    /// Enable acceptance on every channel the table knows a value for.
    ///
    /// # Errors
    ///
    /// [`LinkError::NotReady`] before the table has been decoded.
    pub async fn enable_all(&self) -> Result<()> {
        let table = self.link.table().ok_or(LinkError::NotReady)?;
        let mask = table
            .iter()
            .filter(|(channel, _)| channel.as_u8() <= MAX_MASK_CHANNEL)
            .fold(0u16, |mask, (channel, _)| mask | 1 << channel.as_u8());
        self.link
            .submit(acceptor::enable_channels(mask))
            .await
            .map(|_| ())
    }

    /// Enable acceptance on an explicit channel mask.
    ///
    /// # Errors
    ///
    /// [`LinkError::NotReady`] before the table has been decoded.
    pub async fn enable_channels(&self, mask: u16) -> Result<()> {
        if !self.link.is_ready() {
            return Err(LinkError::NotReady);
        }
        self.link
            .submit(acceptor::enable_channels(mask))
            .await
            .map(|_| ())
    }

    /// Disable acceptance.
    pub async fn disable(&self) -> Result<()> {
        self.link.submit(acceptor::disable()).await.map(|_| ())
    }

    /// Stack the note currently held in escrow.
    pub async fn accept_note(&self) -> Result<()> {
        self.link.submit(acceptor::accept_note()).await.map(|_| ())
    }

    /// Return the note currently held in escrow.
    pub async fn return_note(&self) -> Result<()> {
        self.link.submit(acceptor::return_note()).await.map(|_| ())
    }

    /// Subscribe to typed acceptor events.
    pub async fn events(&self) -> AcceptorEvents {
        AcceptorEvents {
            rx: self.link.subscribe().await,
            link: self.link.clone(),
        }
    }
}

/// Stream of typed acceptor events.
#[derive(Debug)]
pub struct AcceptorEvents {
    rx: mpsc::Receiver<LinkEvent>,
    link: DeviceLink,
}

impl AcceptorEvents {
    /// Next event, or `None` once the link has shut down.
    pub async fn next(&mut self) -> Option<AcceptorEvent> {
        loop {
            let event = self.rx.recv().await?;
            if let Some(projected) = self.project(event) {
                return Some(projected);
            }
        }
    }

    /// Map a raw link event onto the acceptor vocabulary; `None` means the
    /// event is not for us and the stream keeps reading.
    fn project(&self, event: LinkEvent) -> Option<AcceptorEvent> {
        match event {
            LinkEvent::Device { kind, payload, at } => match kind {
                EventKind::NoteEscrow => {
                    let Some(&index) = payload.first() else {
                        warn!("escrow event without channel byte");
                        return None;
                    };
                    let channel = ChannelIndex(index);
                    match self.link.table().and_then(|t| t.get(channel)) {
                        Some(value) => Some(AcceptorEvent::NoteInEscrow { channel, value, at }),
                        None => {
                            // Known-shape event, unknown value: soft
                            // rejection, not a fault.
                            warn!(%channel, "escrow event for unvalued channel");
                            Some(AcceptorEvent::UnsupportedChannel { channel, at })
                        }
                    }
                }
                EventKind::NoteStacked => Some(AcceptorEvent::NoteStacked { at }),
                EventKind::NoteReturned => Some(AcceptorEvent::NoteReturned { at }),
                EventKind::NoteJam => Some(AcceptorEvent::Jam { at }),
                EventKind::CashboxRemoved => Some(AcceptorEvent::CashboxRemoved { at }),
                other => {
                    trace!(kind = %other, "event ignored by acceptor");
                    None
                }
            },
            LinkEvent::TransportError { message } => {
                Some(AcceptorEvent::TransportError { message })
            }
            LinkEvent::Disconnected => Some(AcceptorEvent::Disconnected),
        }
    }
}

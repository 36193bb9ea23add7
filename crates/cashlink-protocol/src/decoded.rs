//! Classification of inbound wire units.

use bytes::Bytes;
use cashlink_core::OpCode;
use std::fmt;

/// Kind of an unsolicited device event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum EventKind {
    /// A note passed the sensors and is held in escrow; payload carries the
    /// bill-table channel index.
    NoteEscrow,
    /// The escrowed note was moved to the cashbox.
    NoteStacked,
    /// The escrowed note was returned to the customer.
    NoteReturned,
    /// The transport path is jammed.
    NoteJam,
    /// The cashbox was removed.
    CashboxRemoved,
    /// The scanner decoded a barcode; payload carries symbology + data.
    ScanData,
    /// A device event this build does not interpret.
    Other(u8),
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::NoteEscrow => write!(f, "note-escrow"),
            EventKind::NoteStacked => write!(f, "note-stacked"),
            EventKind::NoteReturned => write!(f, "note-returned"),
            EventKind::NoteJam => write!(f, "note-jam"),
            EventKind::CashboxRemoved => write!(f, "cashbox-removed"),
            EventKind::ScanData => write!(f, "scan-data"),
            EventKind::Other(code) => write!(f, "event-{code:#04x}"),
        }
    }
}

/// One inbound wire unit after codec classification.
///
/// Every frame a codec accepts lands in exactly one of these variants. The
/// dispatcher routes on the variant alone and never re-inspects payload
/// bytes; a frame the codec cannot make sense of is `Malformed`, which is
/// surfaced to the in-flight request (if any) rather than crashing the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedFrame {
    /// A solicited reply. The half-duplex link is strictly ordered, so it
    /// answers the oldest in-flight command.
    Reply { code: OpCode, payload: Bytes },

    /// An unsolicited device event; never consumes the dispatch slot.
    Event { kind: EventKind, payload: Bytes },

    /// The reserved bill-table payload class, consumed by the table
    /// decoder instead of the dispatcher.
    Table(Bytes),

    /// Envelope, length, or trailer violation. The link stays open.
    Malformed { reason: String },
}

impl DecodedFrame {
    /// Build a malformed frame from any displayable reason.
    pub fn malformed(reason: impl Into<String>) -> Self {
        DecodedFrame::Malformed {
            reason: reason.into(),
        }
    }
}

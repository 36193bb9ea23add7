//! Note validator operations (serial link).

use crate::command::{Command, ResponseShape};

/// Status poll, also the poll injected by the scheduler while idle.
pub const CODE_POLL: u8 = 0x10;
/// Enable acceptance on a set of bill-table channels.
pub const CODE_ENABLE: u8 = 0x11;
/// Disable acceptance entirely.
pub const CODE_DISABLE: u8 = 0x12;
/// Stack the note currently held in escrow.
pub const CODE_ACCEPT: u8 = 0x13;
/// Return the note currently held in escrow.
pub const CODE_RETURN: u8 = 0x14;

/// Event code: note entered escrow (payload = channel index).
pub const EVENT_NOTE_ESCROW: u8 = 0x81;
/// Event code: escrowed note stacked into the cashbox.
pub const EVENT_NOTE_STACKED: u8 = 0x82;
/// Event code: escrowed note returned to the customer.
pub const EVENT_NOTE_RETURNED: u8 = 0x83;
/// Event code: transport jam.
pub const EVENT_NOTE_JAM: u8 = 0x84;
/// Event code: cashbox removed.
pub const EVENT_CASHBOX_REMOVED: u8 = 0x85;

/// Build the idle status poll.
pub fn poll() -> Command {
    Command::bare(CODE_POLL, ResponseShape::Status)
}

/// Enable acceptance for the channels set in `mask` (bit N = channel N,
/// big-endian on the wire).
pub fn enable_channels(mask: u16) -> Command {
    Command::new(CODE_ENABLE, mask.to_be_bytes().to_vec(), ResponseShape::Ack)
}

/// Disable acceptance.
pub fn disable() -> Command {
    Command::bare(CODE_DISABLE, ResponseShape::Ack)
}

/// Stack the escrowed note.
pub fn accept_note() -> Command {
    Command::bare(CODE_ACCEPT, ResponseShape::Ack)
}

/// Return the escrowed note.
pub fn return_note() -> Command {
    Command::bare(CODE_RETURN, ResponseShape::Ack)
}

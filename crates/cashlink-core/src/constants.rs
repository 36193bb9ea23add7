//! Wire-level constants shared by both device protocols.
//!
//! Two peripherals speak through this crate family: a note validator on a
//! serial byte stream and a barcode scanner on a packetized HID channel.
//! Both links are half-duplex with no correlation identifiers, so every
//! constant here describes framing, not addressing.
//!
//! # Serial envelope (note validator)
//!
//! ```text
//! SYNC  LEN  CODE  DATA...  CHK
//! 0x02   n   (n bytes follow LEN, CHK = XOR of CODE and DATA)
//! ```
//!
//! # HID envelope (barcode scanner)
//!
//! ```text
//! [report_kind, length, payload(length bytes)]
//! ```
//!
//! Inbound packets must carry [`HID_REPORT_RECV`]; anything else is rejected
//! as malformed before the payload is even looked at.

// ============================================================================
// Serial envelope (Variant A)
// ============================================================================

/// Sync byte opening every serial frame, host-to-device and device-to-host.
pub const SERIAL_SYNC: u8 = 0x02;

/// Smallest well-formed serial frame: sync + length + code + checksum.
pub const SERIAL_MIN_FRAME: usize = 4;

/// Smallest value the length byte may declare (code + checksum).
pub const SERIAL_MIN_LEN: u8 = 2;

/// Largest payload a serial frame can carry (length byte covers
/// code + data + checksum, and must fit in a u8).
pub const SERIAL_MAX_DATA: usize = u8::MAX as usize - SERIAL_MIN_LEN as usize;

/// Response code reserved for the bill-table payload class.
///
/// The validator answers the first status poll after a reset with this
/// frame; it is consumed by the table decoder, never matched to a pending
/// request.
pub const CODE_BILL_TABLE: u8 = 0x42;

/// High bit marking a device-initiated event code on the serial link.
pub const EVENT_CODE_BIT: u8 = 0x80;

// ============================================================================
// HID envelope (Variant B)
// ============================================================================

/// Report kind byte for host-to-device packets.
pub const HID_REPORT_SEND: u8 = 0x04;

/// Report kind byte required on device-to-host packets.
pub const HID_REPORT_RECV: u8 = 0x02;

/// Byte count of the HID envelope header (report kind + length).
pub const HID_HEADER: usize = 2;

/// First payload byte of an unsolicited decode-data (scan result) packet.
pub const HID_DECODE_DATA: u8 = 0x33;

// ============================================================================
// Menu command body (tag/sub-tag encoding inside HID payloads)
// ============================================================================

/// Opens a menu command body.
pub const MENU_START: u8 = 0x02;

/// Command prefix following [`MENU_START`].
pub const MENU_PREFIX: u8 = b'C';

/// Closes a menu command body.
pub const MENU_END: u8 = 0x03;

/// Delimiter introducing a full `tag + sub-tag` entry.
pub const MENU_DELIM_TAG: u8 = b';';

/// Delimiter introducing a sub-tag entry that reuses the previous tag.
pub const MENU_DELIM_SUB: u8 = b',';

/// Width of a menu tag in bytes.
pub const MENU_TAG_LEN: usize = 2;

/// Width of a menu sub-tag in bytes.
pub const MENU_SUB_TAG_LEN: usize = 2;

// ============================================================================
// Bill table records
// ============================================================================

/// Fixed stride of one bill-table record:
/// `[mantissa, country(3 ASCII bytes), exponent]`.
pub const TABLE_RECORD_STRIDE: usize = 5;

/// Sign flag in the exponent byte: set means the exponent is negative.
pub const EXPONENT_SIGN_BIT: u8 = 0x80;

// ============================================================================
// Timing defaults
// ============================================================================

/// Default status-poll interval in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 200;

/// Default per-command reply timeout in milliseconds.
pub const DEFAULT_COMMAND_TIMEOUT_MS: u64 = 1_000;

/// Default buffer depth for the unsolicited-event channel.
pub const DEFAULT_EVENT_BUFFER: usize = 32;

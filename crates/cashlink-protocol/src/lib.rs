//! Wire codecs for the kiosk payment peripherals.
//!
//! Two protocol variants share this crate:
//!
//! - **Serial** ([`SerialCodec`]): the note validator's length/checksum
//!   envelope on a raw byte stream.
//! - **HID** ([`HidCodec`]): the barcode scanner's packetized report
//!   envelope, whose payloads are either binary scan results or ASCII
//!   tag/sub-tag menu commands ([`menu`]).
//!
//! Both codecs produce [`DecodedFrame`]s: a tagged classification of every
//! inbound unit into a reply, an unsolicited event, the reserved bill-table
//! payload class, or a malformed frame. Classification happens here, in one
//! place, so the dispatch layer never inspects payload bytes to guess what
//! a frame means.

pub mod command;
pub mod commands;
pub mod decoded;
pub mod hid;
pub mod link;
pub mod menu;
pub mod serial;
pub mod table;

pub use command::{Command, ResponseShape};
pub use decoded::{DecodedFrame, EventKind};
pub use hid::HidCodec;
pub use link::LinkProtocol;
pub use menu::{MenuCommand, MenuEntry};
pub use serial::SerialCodec;
pub use table::DenominationTable;

//! Barcode scanner operations (HID link).

use crate::command::{Command, ResponseShape};
use crate::menu::MenuCommand;
use cashlink_core::Result;

/// First body byte of a status request, also echoed in the status reply.
pub const BODY_STATUS_REQUEST: u8 = 0x30;
/// First body byte of a status reply.
pub const BODY_STATUS_REPLY: u8 = 0x31;

/// Build the idle status request.
pub fn status_request() -> Command {
    Command::new(
        BODY_STATUS_REQUEST,
        vec![BODY_STATUS_REQUEST],
        ResponseShape::Status,
    )
}

/// Build a configuration write from a menu command.
///
/// # Errors
///
/// Returns an error if the menu body violates the tag/sub-tag grammar.
pub fn configure(menu: &MenuCommand) -> Result<Command> {
    let body = menu.encode()?;
    let code = body[0];
    Ok(Command::new(code, body, ResponseShape::Ack))
}

//! Logical commands issued to a device.

use bytes::Bytes;
use cashlink_core::OpCode;
use std::fmt;

/// Shape of the reply a command expects.
///
/// The wire formats carry no correlation identifiers, so this is not used
/// for matching; it tells the caller how to project the reply payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// No meaningful payload, only an acknowledgement.
    Ack,
    /// A one-byte (or short) status payload.
    Status,
    /// An arbitrary data payload.
    Data,
}

/// A logical operation bound for the device.
///
/// Immutable once built: the dispatcher clones and encodes it but never
/// modifies it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    code: OpCode,
    payload: Bytes,
    response: ResponseShape,
}

impl Command {
    /// Create a new command.
    pub fn new(code: impl Into<OpCode>, payload: impl Into<Bytes>, response: ResponseShape) -> Self {
        Command {
            code: code.into(),
            payload: payload.into(),
            response,
        }
    }

    /// Create a command with an empty payload.
    pub fn bare(code: impl Into<OpCode>, response: ResponseShape) -> Self {
        Self::new(code, Bytes::new(), response)
    }

    /// Operation code.
    #[must_use]
    pub fn code(&self) -> OpCode {
        self.code
    }

    /// Encoded payload bytes.
    #[must_use]
    pub fn payload(&self) -> &Bytes {
        &self.payload
    }

    /// Expected reply shape.
    #[must_use]
    pub fn response(&self) -> ResponseShape {
        self.response
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Command[code={}, payload={}B, response={:?}]",
            self.code,
            self.payload.len(),
            self.response
        )
    }
}

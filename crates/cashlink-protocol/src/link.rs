//! Protocol-variant abstraction consumed by the link engine.

use crate::{Command, DecodedFrame};
use bytes::BytesMut;
use cashlink_core::Result;

/// One protocol variant: the bidirectional mapping between logical
/// commands and wire bytes, plus the variant's idle-status poll.
///
/// Implementations are driven from a single engine task, so they may keep
/// internal decode state without synchronization. `decode` is called in a
/// loop until it returns `None`; implementations must consume from `src`
/// exactly the bytes belonging to the frames they return.
pub trait LinkProtocol: Send {
    /// Append the wire encoding of `command` to `dst`.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be represented in the
    /// envelope (oversized payload).
    fn encode(&mut self, command: &Command, dst: &mut BytesMut) -> Result<()>;

    /// Extract the next frame from `src`, if one is complete.
    ///
    /// Returns `None` when more bytes are needed. Wire violations are
    /// reported in-band as [`DecodedFrame::Malformed`], never as a panic or
    /// error: the link must survive a corrupt frame.
    fn decode(&mut self, src: &mut BytesMut) -> Option<DecodedFrame>;

    /// The lightweight status command injected by the polling scheduler
    /// while the link is idle.
    fn poll_command(&self) -> Command;
}

//! Serial length/checksum codec for the note validator (Variant A).
//!
//! # Wire format
//!
//! ```text
//! SYNC  LEN  CODE  DATA...      CHK
//! 0x02   n   [------ n bytes ------]
//! ```
//!
//! `LEN` counts every byte after itself: the code, the data, and the
//! one-byte XOR checksum of code + data. The smallest frame is therefore
//! four bytes. Bytes before a sync marker are line noise and are discarded.
//!
//! # Classification
//!
//! Inbound codes split into three classes:
//!
//! - [`CODE_BILL_TABLE`]: the bill-table response, fetched by the device
//!   as a side effect of the first status poll after reset. It is routed to
//!   the table decoder, not to a pending request.
//! - codes with [`EVENT_CODE_BIT`] set: unsolicited validator events
//!   (escrow, stacked, returned, jam, cashbox removed).
//! - everything else: the reply to the oldest in-flight command.
//!
//! The codec implements [`Decoder`]/[`Encoder`] so it can be layered onto
//! any `AsyncRead + AsyncWrite` transport with `tokio_util::codec::Framed`,
//! and [`LinkProtocol`] for the engine's byte-event path.

use crate::command::Command;
use crate::commands::acceptor;
use crate::decoded::{DecodedFrame, EventKind};
use crate::link::LinkProtocol;
use bytes::{Buf, BufMut, Bytes, BytesMut};
use cashlink_core::constants::{
    CODE_BILL_TABLE, EVENT_CODE_BIT, SERIAL_MAX_DATA, SERIAL_MIN_LEN, SERIAL_SYNC,
};
use cashlink_core::{Error, OpCode, Result};
use tokio_util::codec::{Decoder, Encoder};

/// Stateless serial codec.
///
/// All decode state lives in the caller's buffer: a partial frame simply
/// stays buffered until more bytes arrive.
///
/// # Example
///
/// ```
/// use bytes::BytesMut;
/// use cashlink_protocol::{DecodedFrame, SerialCodec};
///
/// let mut codec = SerialCodec::new();
/// let mut buf = BytesMut::from(&[0x02, 0x03, 0x10, 0x07, 0x17][..]);
///
/// match codec.decode_frame(&mut buf) {
///     Some(DecodedFrame::Reply { code, payload }) => {
///         assert_eq!(code.as_u8(), 0x10);
///         assert_eq!(payload.as_ref(), &[0x07]);
///     }
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialCodec;

impl SerialCodec {
    /// Create a new serial codec.
    pub fn new() -> Self {
        SerialCodec
    }

    /// Append the framed encoding of `command` to `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if the payload does not fit the
    /// one-byte length field.
    pub fn encode_frame(&self, command: &Command, dst: &mut BytesMut) -> Result<()> {
        let data = command.payload();
        if data.len() > SERIAL_MAX_DATA {
            return Err(Error::PayloadTooLarge {
                len: data.len(),
                max: SERIAL_MAX_DATA,
            });
        }

        let code = command.code().as_u8();
        let checksum = data.iter().fold(code, |acc, &b| acc ^ b);

        dst.reserve(4 + data.len());
        dst.put_u8(SERIAL_SYNC);
        dst.put_u8((SERIAL_MIN_LEN as usize + data.len()) as u8);
        dst.put_u8(code);
        dst.put_slice(data);
        dst.put_u8(checksum);
        Ok(())
    }

    /// Extract the next complete frame from `src`.
    ///
    /// Returns `None` while the envelope is still truncated (the bytes stay
    /// buffered). A bad declared length or trailer mismatch consumes the
    /// offending bytes and yields [`DecodedFrame::Malformed`], leaving the
    /// codec resynchronized on the following bytes.
    pub fn decode_frame(&self, src: &mut BytesMut) -> Option<DecodedFrame> {
        // Discard noise before the sync marker.
        match src.iter().position(|&b| b == SERIAL_SYNC) {
            Some(0) => {}
            Some(pos) => src.advance(pos),
            None => {
                src.clear();
                return None;
            }
        }

        if src.len() < 2 {
            return None;
        }

        let declared = src[1];
        if declared < SERIAL_MIN_LEN {
            // Skip the sync byte so the scan resumes past this frame start.
            src.advance(1);
            return Some(DecodedFrame::malformed(format!(
                "declared length {declared} below minimum {SERIAL_MIN_LEN}"
            )));
        }

        let total = 2 + declared as usize;
        if src.len() < total {
            return None;
        }

        let frame = src.split_to(total);
        let body = &frame[2..total - 1];
        let trailer = frame[total - 1];
        let computed = body.iter().fold(0u8, |acc, &b| acc ^ b);
        if computed != trailer {
            return Some(DecodedFrame::malformed(format!(
                "checksum mismatch: expected {computed:#04x}, got {trailer:#04x}"
            )));
        }

        let code = frame[2];
        let payload = Bytes::copy_from_slice(&frame[3..total - 1]);
        Some(classify(code, payload))
    }
}

/// Route an accepted frame to its class.
fn classify(code: u8, payload: Bytes) -> DecodedFrame {
    if code == CODE_BILL_TABLE {
        DecodedFrame::Table(payload)
    } else if code & EVENT_CODE_BIT != 0 {
        DecodedFrame::Event {
            kind: event_kind(code),
            payload,
        }
    } else {
        DecodedFrame::Reply {
            code: OpCode(code),
            payload,
        }
    }
}

/// Map a validator event code to its kind.
fn event_kind(code: u8) -> EventKind {
    match code {
        acceptor::EVENT_NOTE_ESCROW => EventKind::NoteEscrow,
        acceptor::EVENT_NOTE_STACKED => EventKind::NoteStacked,
        acceptor::EVENT_NOTE_RETURNED => EventKind::NoteReturned,
        acceptor::EVENT_NOTE_JAM => EventKind::NoteJam,
        acceptor::EVENT_CASHBOX_REMOVED => EventKind::CashboxRemoved,
        other => EventKind::Other(other),
    }
}

impl Decoder for SerialCodec {
    type Item = DecodedFrame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        Ok(self.decode_frame(src))
    }
}

impl Encoder<Command> for SerialCodec {
    type Error = Error;

    fn encode(&mut self, item: Command, dst: &mut BytesMut) -> Result<()> {
        self.encode_frame(&item, dst)
    }
}

impl LinkProtocol for SerialCodec {
    fn encode(&mut self, command: &Command, dst: &mut BytesMut) -> Result<()> {
        self.encode_frame(command, dst)
    }

    fn decode(&mut self, src: &mut BytesMut) -> Option<DecodedFrame> {
        self.decode_frame(src)
    }

    fn poll_command(&self) -> Command {
        acceptor::poll()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ResponseShape;

    fn encode(command: &Command) -> BytesMut {
        let mut dst = BytesMut::new();
        SerialCodec::new().encode_frame(command, &mut dst).unwrap();
        dst
    }

    #[test]
    fn test_encode_bare_command() {
        let wire = encode(&Command::bare(0x10u8, ResponseShape::Status));
        assert_eq!(wire.as_ref(), &[0x02, 0x02, 0x10, 0x10]);
    }

    #[test]
    fn test_encode_command_with_data() {
        let wire = encode(&Command::new(0x13u8, vec![0x05], ResponseShape::Ack));
        // checksum = 0x13 ^ 0x05 = 0x16
        assert_eq!(wire.as_ref(), &[0x02, 0x03, 0x13, 0x05, 0x16]);
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let cmd = Command::new(0x11u8, vec![0u8; SERIAL_MAX_DATA + 1], ResponseShape::Ack);
        let mut dst = BytesMut::new();
        let result = SerialCodec::new().encode_frame(&cmd, &mut dst);
        assert!(matches!(result, Err(Error::PayloadTooLarge { .. })));
    }

    #[test]
    fn test_decode_reply_roundtrip() {
        let codec = SerialCodec::new();
        let mut wire = encode(&Command::new(0x10u8, vec![0x01, 0x02], ResponseShape::Data));

        match codec.decode_frame(&mut wire) {
            Some(DecodedFrame::Reply { code, payload }) => {
                assert_eq!(code.as_u8(), 0x10);
                assert_eq!(payload.as_ref(), &[0x01, 0x02]);
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(wire.is_empty());
    }

    #[test]
    fn test_decode_partial_frame_waits() {
        let codec = SerialCodec::new();
        let mut buf = BytesMut::from(&[0x02, 0x05, 0x10][..]);

        assert!(codec.decode_frame(&mut buf).is_none());
        // Bytes stay buffered for the rest of the frame.
        assert_eq!(buf.len(), 3);

        buf.extend_from_slice(&[0xaa, 0xbb, 0xcc, 0x10 ^ 0xaa ^ 0xbb ^ 0xcc]);
        match codec.decode_frame(&mut buf) {
            Some(DecodedFrame::Reply { payload, .. }) => {
                assert_eq!(payload.as_ref(), &[0xaa, 0xbb, 0xcc]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_decode_discards_garbage_before_sync() {
        let codec = SerialCodec::new();
        let mut buf = BytesMut::from(&[0xff, 0x7e, 0x00][..]);
        buf.extend_from_slice(&encode(&Command::bare(0x10u8, ResponseShape::Status)));

        match codec.decode_frame(&mut buf) {
            Some(DecodedFrame::Reply { code, .. }) => assert_eq!(code.as_u8(), 0x10),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_decode_checksum_mismatch_is_malformed() {
        let codec = SerialCodec::new();
        let mut buf = BytesMut::from(&[0x02, 0x02, 0x10, 0x99][..]);

        match codec.decode_frame(&mut buf) {
            Some(DecodedFrame::Malformed { reason }) => {
                assert!(reason.contains("checksum mismatch"));
            }
            other => panic!("unexpected: {other:?}"),
        }
        // The bad frame was consumed; the codec accepts the next one.
        buf.extend_from_slice(&[0x02, 0x02, 0x10, 0x10]);
        assert!(matches!(
            codec.decode_frame(&mut buf),
            Some(DecodedFrame::Reply { .. })
        ));
    }

    #[test]
    fn test_decode_undersized_declared_length_resyncs() {
        let codec = SerialCodec::new();
        let mut buf = BytesMut::from(&[0x02, 0x01][..]);

        match codec.decode_frame(&mut buf) {
            Some(DecodedFrame::Malformed { reason }) => {
                assert!(reason.contains("below minimum"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_decode_classifies_bill_table() {
        let codec = SerialCodec::new();
        let records = [5u8, b'U', b'S', b'D', 0x82];
        let mut buf = BytesMut::new();
        codec
            .encode_frame(
                &Command::new(CODE_BILL_TABLE, records.to_vec(), ResponseShape::Data),
                &mut buf,
            )
            .unwrap();

        match codec.decode_frame(&mut buf) {
            Some(DecodedFrame::Table(payload)) => assert_eq!(payload.as_ref(), &records),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_decode_classifies_events() {
        let codec = SerialCodec::new();
        let mut buf = BytesMut::new();
        codec
            .encode_frame(
                &Command::new(acceptor::EVENT_NOTE_ESCROW, vec![0x02], ResponseShape::Ack),
                &mut buf,
            )
            .unwrap();

        match codec.decode_frame(&mut buf) {
            Some(DecodedFrame::Event { kind, payload }) => {
                assert_eq!(kind, EventKind::NoteEscrow);
                assert_eq!(payload.as_ref(), &[0x02]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_decode_unknown_event_code() {
        let codec = SerialCodec::new();
        let mut buf = BytesMut::new();
        codec
            .encode_frame(&Command::bare(0x9fu8, ResponseShape::Ack), &mut buf)
            .unwrap();

        match codec.decode_frame(&mut buf) {
            Some(DecodedFrame::Event { kind, .. }) => assert_eq!(kind, EventKind::Other(0x9f)),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_decode_multiple_frames_in_buffer() {
        let codec = SerialCodec::new();
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&encode(&Command::bare(0x10u8, ResponseShape::Status)));
        buf.extend_from_slice(&encode(&Command::bare(0x11u8, ResponseShape::Ack)));

        let first = codec.decode_frame(&mut buf);
        let second = codec.decode_frame(&mut buf);
        assert!(matches!(
            first,
            Some(DecodedFrame::Reply { code, .. }) if code.as_u8() == 0x10
        ));
        assert!(matches!(
            second,
            Some(DecodedFrame::Reply { code, .. }) if code.as_u8() == 0x11
        ));
        assert!(codec.decode_frame(&mut buf).is_none());
    }

    #[test]
    fn test_decode_pure_garbage_clears_buffer() {
        let codec = SerialCodec::new();
        let mut buf = BytesMut::from(&[0xde, 0xad, 0xbe, 0xef][..]);

        assert!(codec.decode_frame(&mut buf).is_none());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_tokio_codec_face() {
        let mut codec = SerialCodec::new();
        let mut buf = BytesMut::new();
        Encoder::encode(
            &mut codec,
            Command::bare(0x10u8, ResponseShape::Status),
            &mut buf,
        )
        .unwrap();

        let decoded = Decoder::decode(&mut codec, &mut buf).unwrap();
        assert!(matches!(decoded, Some(DecodedFrame::Reply { .. })));
    }
}

//! Packetized HID codec for the barcode scanner (Variant B).
//!
//! # Wire format
//!
//! ```text
//! [report_kind, length, payload(length bytes)]
//! ```
//!
//! Reports arrive whole (the transport delivers one packet per event), so
//! unlike the serial codec there is no cross-packet reassembly. The inbound
//! report kind must equal [`HID_REPORT_RECV`] or the packet is rejected; a
//! declared length exceeding the bytes actually present is likewise
//! malformed (truncated report).
//!
//! # Classification
//!
//! A payload opening with [`HID_DECODE_DATA`] is an unsolicited scan result
//! (`Event { ScanData }`, payload = marker + symbology + barcode bytes);
//! any other payload is the reply to the oldest in-flight command.

use crate::command::Command;
use crate::commands::scanner;
use crate::decoded::{DecodedFrame, EventKind};
use crate::link::LinkProtocol;
use bytes::{BufMut, Bytes, BytesMut};
use cashlink_core::constants::{HID_DECODE_DATA, HID_HEADER, HID_REPORT_RECV, HID_REPORT_SEND};
use cashlink_core::{Error, OpCode, Result};

/// Stateless HID packet codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct HidCodec;

impl HidCodec {
    /// Create a new HID codec.
    pub fn new() -> Self {
        HidCodec
    }

    /// Append the enveloped encoding of `command` to `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PayloadTooLarge`] if the payload does not fit the
    /// one-byte length field.
    pub fn encode_packet(&self, command: &Command, dst: &mut BytesMut) -> Result<()> {
        let payload = command.payload();
        if payload.len() > u8::MAX as usize {
            return Err(Error::PayloadTooLarge {
                len: payload.len(),
                max: u8::MAX as usize,
            });
        }

        dst.reserve(HID_HEADER + payload.len());
        dst.put_u8(HID_REPORT_SEND);
        dst.put_u8(payload.len() as u8);
        dst.put_slice(payload);
        Ok(())
    }

    /// Decode one whole report from `src`.
    ///
    /// The entire buffer is consumed either way: reports are unit-delivered
    /// and bytes past the declared length are report padding.
    pub fn decode_packet(&self, src: &mut BytesMut) -> Option<DecodedFrame> {
        if src.is_empty() {
            return None;
        }
        let report = src.split_to(src.len());

        if report.len() < HID_HEADER {
            return Some(DecodedFrame::malformed(format!(
                "envelope truncated: {} bytes, need {HID_HEADER}",
                report.len()
            )));
        }

        let kind = report[0];
        if kind != HID_REPORT_RECV {
            return Some(DecodedFrame::malformed(format!(
                "unexpected report kind {kind:#04x}, expected {HID_REPORT_RECV:#04x}"
            )));
        }

        let declared = report[1] as usize;
        let available = report.len() - HID_HEADER;
        if declared > available {
            return Some(DecodedFrame::malformed(format!(
                "declared length {declared} exceeds available {available} bytes"
            )));
        }

        let payload = Bytes::copy_from_slice(&report[HID_HEADER..HID_HEADER + declared]);
        Some(classify(payload))
    }
}

/// Route an accepted payload to its class.
fn classify(payload: Bytes) -> DecodedFrame {
    match payload.first() {
        None => DecodedFrame::malformed("empty payload"),
        Some(&HID_DECODE_DATA) => DecodedFrame::Event {
            kind: EventKind::ScanData,
            payload,
        },
        Some(&first) => DecodedFrame::Reply {
            code: OpCode(first),
            payload,
        },
    }
}

impl LinkProtocol for HidCodec {
    fn encode(&mut self, command: &Command, dst: &mut BytesMut) -> Result<()> {
        self.encode_packet(command, dst)
    }

    fn decode(&mut self, src: &mut BytesMut) -> Option<DecodedFrame> {
        self.decode_packet(src)
    }

    fn poll_command(&self) -> Command {
        scanner::status_request()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::ResponseShape;

    fn decode(bytes: &[u8]) -> Option<DecodedFrame> {
        HidCodec::new().decode_packet(&mut BytesMut::from(bytes))
    }

    #[test]
    fn test_encode_packet() {
        let mut dst = BytesMut::new();
        HidCodec::new()
            .encode_packet(
                &Command::new(0x30u8, vec![0x30, 0x01], ResponseShape::Status),
                &mut dst,
            )
            .unwrap();
        assert_eq!(dst.as_ref(), &[HID_REPORT_SEND, 0x02, 0x30, 0x01]);
    }

    #[test]
    fn test_encode_rejects_oversized_payload() {
        let cmd = Command::new(0x30u8, vec![0u8; 256], ResponseShape::Ack);
        let result = HidCodec::new().encode_packet(&cmd, &mut BytesMut::new());
        assert!(matches!(result, Err(Error::PayloadTooLarge { .. })));
    }

    #[test]
    fn test_decode_reply() {
        match decode(&[HID_REPORT_RECV, 0x02, 0x31, 0x00]) {
            Some(DecodedFrame::Reply { code, payload }) => {
                assert_eq!(code.as_u8(), 0x31);
                assert_eq!(payload.as_ref(), &[0x31, 0x00]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_decode_scan_event() {
        // marker + symbology + "4711"
        match decode(&[HID_REPORT_RECV, 0x06, 0x33, 0x08, b'4', b'7', b'1', b'1']) {
            Some(DecodedFrame::Event { kind, payload }) => {
                assert_eq!(kind, EventKind::ScanData);
                assert_eq!(&payload[2..], b"4711");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_wrong_report_kind() {
        match decode(&[0x07, 0x01, 0x31]) {
            Some(DecodedFrame::Malformed { reason }) => {
                assert!(reason.contains("report kind"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_decode_rejects_declared_length_overrun() {
        match decode(&[HID_REPORT_RECV, 0x20, 0x31, 0x00]) {
            Some(DecodedFrame::Malformed { reason }) => {
                assert!(reason.contains("declared length 32"));
                assert!(reason.contains("available 2"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_decode_ignores_report_padding() {
        // Declared length 2, followed by zero padding up to the report size.
        let mut report = vec![HID_REPORT_RECV, 0x02, 0x31, 0x07];
        report.extend_from_slice(&[0u8; 12]);
        match decode(&report) {
            Some(DecodedFrame::Reply { payload, .. }) => {
                assert_eq!(payload.as_ref(), &[0x31, 0x07]);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_decode_truncated_envelope() {
        match decode(&[HID_REPORT_RECV]) {
            Some(DecodedFrame::Malformed { reason }) => {
                assert!(reason.contains("envelope truncated"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_decode_empty_buffer() {
        assert!(decode(&[]).is_none());
    }

    #[test]
    fn test_decode_consumes_whole_buffer() {
        let mut src = BytesMut::from(&[HID_REPORT_RECV, 0x01, 0x31][..]);
        let codec = HidCodec::new();
        assert!(codec.decode_packet(&mut src).is_some());
        assert!(src.is_empty());
        assert!(codec.decode_packet(&mut src).is_none());
    }

    #[test]
    fn test_decode_zero_length_payload_is_malformed() {
        match decode(&[HID_REPORT_RECV, 0x00]) {
            Some(DecodedFrame::Malformed { reason }) => {
                assert_eq!(reason, "empty payload");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}

//! Property-based tests for the wire codecs.
//!
//! These tests use proptest to generate random valid inputs and verify
//! that the codec invariants hold across the whole input space: framed
//! commands decode back to their payloads, the tag-compression encoding is
//! symmetric, and denomination ordering agrees with rational arithmetic.

use bytes::BytesMut;
use cashlink_core::constants::SERIAL_MAX_DATA;
use cashlink_core::{Denomination, StorageClass};
use cashlink_protocol::{
    Command, DecodedFrame, HidCodec, MenuCommand, MenuEntry, ResponseShape, SerialCodec,
};
use proptest::prelude::*;

/// Strategy for command codes that classify as replies on the serial link
/// (no event bit, not the bill-table class).
fn reply_code() -> impl Strategy<Value = u8> {
    (0u8..0x80).prop_filter("reserved bill-table code", |&c| c != 0x42)
}

/// Strategy for serial payloads within the envelope limit.
fn serial_payload() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..SERIAL_MAX_DATA.min(64))
}

/// Strategy for a two-byte ASCII alphanumeric tag.
fn menu_tag() -> impl Strategy<Value = [u8; 2]> {
    let alnum = prop::sample::select(
        (b'0'..=b'9')
            .chain(b'A'..=b'Z')
            .chain(b'a'..=b'z')
            .collect::<Vec<u8>>(),
    );
    (alnum.clone(), alnum).prop_map(|(a, b)| [a, b])
}

/// Strategy for entry data: graphic ASCII free of the entry delimiters.
fn menu_data() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop::sample::select(
            (0x21u8..=0x7e)
                .filter(|&b| b != b';' && b != b',')
                .collect::<Vec<u8>>(),
        ),
        0..8,
    )
}

/// Strategy for a full menu command with up to eight entries.
fn menu_command() -> impl Strategy<Value = MenuCommand> {
    let entry = (menu_tag(), menu_tag(), menu_data())
        .prop_map(|(tag, sub, data)| MenuEntry::new(tag, sub, data).unwrap());
    let storage = prop_oneof![Just(StorageClass::Volatile), Just(StorageClass::Permanent)];
    (storage, prop::collection::vec(entry, 0..8))
        .prop_map(|(storage, entries)| MenuCommand::new(storage, entries))
}

proptest! {
    /// Property: a serial frame echoed by the device decodes back to the
    /// command's code and payload.
    #[test]
    fn prop_serial_echo_roundtrip(code in reply_code(), payload in serial_payload()) {
        let codec = SerialCodec::new();
        let command = Command::new(code, payload.clone(), ResponseShape::Data);

        let mut wire = BytesMut::new();
        codec.encode_frame(&command, &mut wire).unwrap();

        match codec.decode_frame(&mut wire) {
            Some(DecodedFrame::Reply { code: decoded, payload: body }) => {
                prop_assert_eq!(decoded.as_u8(), code);
                prop_assert_eq!(body.as_ref(), payload.as_slice());
            }
            other => prop_assert!(false, "unexpected frame: {:?}", other),
        }
        prop_assert!(wire.is_empty());
    }

    /// Property: leading garbage never corrupts the frame that follows it.
    #[test]
    fn prop_serial_decode_survives_leading_noise(
        noise in prop::collection::vec(any::<u8>().prop_filter("sync byte", |&b| b != 0x02), 0..16),
        code in reply_code(),
        payload in serial_payload(),
    ) {
        let codec = SerialCodec::new();
        let command = Command::new(code, payload.clone(), ResponseShape::Data);

        let mut wire = BytesMut::from(noise.as_slice());
        codec.encode_frame(&command, &mut wire).unwrap();

        match codec.decode_frame(&mut wire) {
            Some(DecodedFrame::Reply { code: decoded, payload: body }) => {
                prop_assert_eq!(decoded.as_u8(), code);
                prop_assert_eq!(body.as_ref(), payload.as_slice());
            }
            other => prop_assert!(false, "unexpected frame: {:?}", other),
        }
    }

    /// Property: the tag-compression encoding is symmetric, decode is the
    /// exact inverse of encode, whatever the tag sharing pattern.
    #[test]
    fn prop_menu_roundtrip(menu in menu_command()) {
        let wire = menu.encode().unwrap();
        let decoded = MenuCommand::decode(&wire).unwrap();
        prop_assert_eq!(decoded, menu);
    }

    /// Property: compression only ever removes bytes, and only for adjacent
    /// entries sharing a tag.
    #[test]
    fn prop_menu_compression_is_lossless_and_minimal(menu in menu_command()) {
        let wire = menu.encode().unwrap();

        let shared_tags = menu
            .entries()
            .windows(2)
            .filter(|pair| pair[0].tag() == pair[1].tag())
            .count();
        let full_entries = menu.entries().len() - shared_tags;

        // Every full entry carries ';' + tag, every compressed one just ','.
        let expected_len: usize = 5
            + menu.entries().iter().map(|e| 2 + e.data().len()).sum::<usize>()
            + full_entries * 3
            + shared_tags;
        prop_assert_eq!(wire.len(), expected_len);
    }

    /// Property: a HID echo of an outbound packet decodes back to the
    /// payload once the report kind is the inbound constant.
    #[test]
    fn prop_hid_echo_roundtrip(payload in prop::collection::vec(any::<u8>(), 1..64)) {
        prop_assume!(payload[0] != 0x33); // scan-data marker classifies as event

        let codec = HidCodec::new();
        let command = Command::new(payload[0], payload.clone(), ResponseShape::Data);

        let mut wire = BytesMut::new();
        codec.encode_packet(&command, &mut wire).unwrap();
        // Device echo: same envelope, inbound report kind.
        let mut echo = BytesMut::from(wire.as_ref());
        echo[0] = 0x02;

        match codec.decode_packet(&mut echo) {
            Some(DecodedFrame::Reply { payload: body, .. }) => {
                prop_assert_eq!(body.as_ref(), payload.as_slice());
            }
            other => prop_assert!(false, "unexpected frame: {:?}", other),
        }
    }

    /// Property: denomination ordering agrees with exact rational
    /// arithmetic computed in wide integers.
    #[test]
    fn prop_denomination_ordering_is_exact(
        m1 in 1u8..=255,
        e1 in -8i8..=8,
        m2 in 1u8..=255,
        e2 in -8i8..=8,
    ) {
        let a = Denomination::new(m1, e1).unwrap();
        let b = Denomination::new(m2, e2).unwrap();

        // Scale both onto the 10^-8 grid: exponent range is bounded so the
        // products stay well inside u128.
        let scaled = |m: u8, e: i8| u128::from(m) * 10u128.pow((e + 8) as u32);
        prop_assert_eq!(a.cmp(&b), scaled(m1, e1).cmp(&scaled(m2, e2)));
    }
}

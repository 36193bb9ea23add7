//! Integration tests for the serial codec layered onto async I/O.
//!
//! The codec implements the tokio-util `Decoder`/`Encoder` traits, so it
//! can be dropped onto any `AsyncRead + AsyncWrite` transport with
//! `Framed`. These tests run it over an in-memory duplex pipe and verify
//! that framing survives arbitrary write fragmentation.

use bytes::Bytes;
use cashlink_protocol::commands::acceptor;
use cashlink_protocol::{Command, DecodedFrame, ResponseShape, SerialCodec};
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio_util::codec::{FramedRead, FramedWrite};

#[tokio::test]
async fn framed_write_produces_the_wire_envelope() {
    let (tx, mut rx) = tokio::io::duplex(256);
    let mut framed = FramedWrite::new(tx, SerialCodec::new());

    framed.send(acceptor::poll()).await.unwrap();
    framed
        .send(Command::new(0x13u8, vec![0x05], ResponseShape::Ack))
        .await
        .unwrap();
    drop(framed);

    let mut wire = Vec::new();
    rx.read_to_end(&mut wire).await.unwrap();
    assert_eq!(
        wire,
        vec![0x02, 0x02, 0x10, 0x10, 0x02, 0x03, 0x13, 0x05, 0x16]
    );
}

#[tokio::test]
async fn framed_read_reassembles_fragmented_frames() {
    let (mut tx, rx) = tokio::io::duplex(256);
    let mut framed = FramedRead::new(rx, SerialCodec::new());

    // A reply and an event, dribbled one byte at a time.
    let stream: Vec<u8> = vec![
        0x02, 0x04, 0x10, 0x01, 0x00, 0x11, // reply to 0x10, payload 01 00
        0x02, 0x03, 0x81, 0x02, 0x83, // escrow event, channel 2
    ];
    let writer = tokio::spawn(async move {
        for byte in stream {
            tx.write_all(&[byte]).await.unwrap();
        }
        tx.shutdown().await.unwrap();
    });

    let frames: Vec<DecodedFrame> = framed
        .by_ref()
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .map(Result::unwrap)
        .collect();
    writer.await.unwrap();

    assert_eq!(frames.len(), 2);
    match &frames[0] {
        DecodedFrame::Reply { code, payload } => {
            assert_eq!(code.as_u8(), 0x10);
            assert_eq!(payload, &Bytes::from_static(&[0x01, 0x00]));
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert!(matches!(frames[1], DecodedFrame::Event { .. }));
}

#[tokio::test]
async fn framed_read_surfaces_malformed_frames_in_band() {
    let (mut tx, rx) = tokio::io::duplex(256);
    let mut framed = FramedRead::new(rx, SerialCodec::new());

    // Bad trailer first, then a clean frame.
    tx.write_all(&[0x02, 0x02, 0x10, 0x99]).await.unwrap();
    tx.write_all(&[0x02, 0x02, 0x11, 0x11]).await.unwrap();
    tx.shutdown().await.unwrap();

    let first = framed.next().await.unwrap().unwrap();
    assert!(matches!(first, DecodedFrame::Malformed { .. }));

    let second = framed.next().await.unwrap().unwrap();
    assert!(matches!(
        second,
        DecodedFrame::Reply { code, .. } if code.as_u8() == 0x11
    ));

    assert!(framed.next().await.is_none());
}

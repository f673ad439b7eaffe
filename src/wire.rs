//! Wire protocol frames.
//!
//! Every exchange between two routers is a [`Frame`]: zero or more
//! subscription announces plus zero or more published messages, encoded
//! as standard protobuf so the bytes interoperate with any other
//! implementation speaking the same protocol ID. Frames travel over a
//! byte stream with a u32 big-endian length prefix.
//!
//! ## Schema
//!
//! | Record | Field | Tag |
//! |--------|-------|-----|
//! | `Frame` | `subscriptions` (repeated `SubOpts`) | 1 |
//! | `Frame` | `publish` (repeated `WireMessage`) | 2 |
//! | `SubOpts` | `subscribe` (optional bool) | 1 |
//! | `SubOpts` | `topic_id` (optional string) | 2 |
//! | `WireMessage` | `from` (optional bytes) | 1 |
//! | `WireMessage` | `data` (optional bytes) | 2 |
//! | `WireMessage` | `seqno` (optional bytes) | 3 |
//! | `WireMessage` | `topic_ids` (repeated string) | 4 |
//!
//! The tags are fixed by the protocol and must not change.

use std::io;

use prost::Message as _;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::floodsub::Message;
use crate::identity::PeerId;

/// Hard bound on a single encoded frame.
/// SECURITY: a peer-supplied length prefix is never trusted beyond this.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// One wire exchange: announces and/or message publications.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Frame {
    #[prost(message, repeated, tag = "1")]
    pub subscriptions: Vec<SubOpts>,
    #[prost(message, repeated, tag = "2")]
    pub publish: Vec<WireMessage>,
}

/// A subscribe/unsubscribe notification for one topic.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SubOpts {
    #[prost(bool, optional, tag = "1")]
    pub subscribe: Option<bool>,
    #[prost(string, optional, tag = "2")]
    pub topic_id: Option<String>,
}

/// A published message as it appears on the wire.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct WireMessage {
    #[prost(bytes = "vec", optional, tag = "1")]
    pub from: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "2")]
    pub data: Option<Vec<u8>>,
    #[prost(bytes = "vec", optional, tag = "3")]
    pub seqno: Option<Vec<u8>>,
    #[prost(string, repeated, tag = "4")]
    pub topic_ids: Vec<String>,
}

impl Frame {
    /// A frame announcing one local topic change.
    pub(crate) fn announce(topic: &str, subscribe: bool) -> Self {
        Self {
            subscriptions: vec![SubOpts {
                subscribe: Some(subscribe),
                topic_id: Some(topic.to_string()),
            }],
            publish: Vec::new(),
        }
    }

    /// The hello frame sent to a freshly connected peer: every currently
    /// subscribed topic, as subscribes.
    pub(crate) fn hello<'a>(topics: impl Iterator<Item = &'a str>) -> Self {
        Self {
            subscriptions: topics
                .map(|t| SubOpts {
                    subscribe: Some(true),
                    topic_id: Some(t.to_string()),
                })
                .collect(),
            publish: Vec::new(),
        }
    }

    /// A frame carrying one message.
    pub(crate) fn publication(msg: &Message) -> Self {
        Self {
            subscriptions: Vec::new(),
            publish: vec![WireMessage::from_message(msg)],
        }
    }
}

impl WireMessage {
    pub(crate) fn from_message(msg: &Message) -> Self {
        Self {
            from: Some(msg.from.as_bytes().to_vec()),
            data: Some(msg.data.clone()),
            seqno: Some(msg.seqno.clone()),
            topic_ids: msg.topics.clone(),
        }
    }

    /// Validate and convert into a routable [`Message`].
    ///
    /// Returns `None` for structurally unusable messages: missing or
    /// wrong-length origin, missing seqno, or no non-empty topic.
    pub(crate) fn into_message(self) -> Option<Message> {
        let from = PeerId::from_wire(self.from.as_deref().unwrap_or(&[]))?;
        let seqno = self.seqno.filter(|s| !s.is_empty())?;
        let topics: Vec<String> = self
            .topic_ids
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect();
        if topics.is_empty() {
            return None;
        }
        Some(Message {
            from,
            seqno,
            data: self.data.unwrap_or_default(),
            topics,
        })
    }
}

/// Write one length-prefixed frame.
pub(crate) async fn write_frame<W>(writer: &mut W, frame: &Frame) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let bytes = frame.encode_to_vec();
    if bytes.len() > MAX_FRAME_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame of {} bytes exceeds limit {}", bytes.len(), MAX_FRAME_SIZE),
        ));
    }
    writer.write_all(&(bytes.len() as u32).to_be_bytes()).await?;
    writer.write_all(&bytes).await?;
    writer.flush().await
}

/// Read one length-prefixed frame body.
///
/// `Ok(None)` means the stream closed cleanly at a frame boundary. An
/// oversized length prefix is a transport error; the caller should end
/// the connection rather than attempt to resynchronize.
pub(crate) async fn read_frame_bytes<R>(reader: &mut R) -> io::Result<Option<Vec<u8>>>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e),
    }
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("peer announced {} byte frame (max {})", len, MAX_FRAME_SIZE),
        ));
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf).await?;
    Ok(Some(buf))
}

#[cfg(test)]
mod tests {
    use prost::Message as _;

    use super::*;

    fn sample_message() -> Message {
        Message {
            from: PeerId::from_bytes([1u8; 32]),
            seqno: vec![0, 0, 0, 0, 0, 0, 0, 42],
            data: b"hello world".to_vec(),
            topics: vec!["foobar".to_string()],
        }
    }

    #[test]
    fn message_round_trip_preserves_all_fields() {
        let msg = sample_message();
        let encoded = Frame::publication(&msg).encode_to_vec();
        let decoded = Frame::decode(encoded.as_slice()).expect("decode failed");

        assert!(decoded.subscriptions.is_empty());
        assert_eq!(decoded.publish.len(), 1);
        let got = decoded.publish[0].clone().into_message().expect("invalid message");
        assert_eq!(got.from, msg.from);
        assert_eq!(got.seqno, msg.seqno);
        assert_eq!(got.data, msg.data);
        assert_eq!(got.topics, msg.topics);
    }

    #[test]
    fn announce_frame_round_trip() {
        let frame = Frame::announce("cats", true);
        let decoded = Frame::decode(frame.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.subscriptions.len(), 1);
        assert_eq!(decoded.subscriptions[0].subscribe, Some(true));
        assert_eq!(decoded.subscriptions[0].topic_id.as_deref(), Some("cats"));

        let frame = Frame::announce("cats", false);
        let decoded = Frame::decode(frame.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.subscriptions[0].subscribe, Some(false));
    }

    /// The encoding is fixed by the protocol; these bytes must never
    /// change or interoperability with other implementations breaks.
    #[test]
    fn golden_encoding() {
        let frame = Frame {
            subscriptions: vec![SubOpts {
                subscribe: Some(true),
                topic_id: Some("foo".to_string()),
            }],
            publish: vec![WireMessage {
                from: Some(b"pk".to_vec()),
                data: Some(b"hi".to_vec()),
                seqno: Some(vec![0, 1]),
                topic_ids: vec!["t".to_string()],
            }],
        };
        let expected: &[u8] = &[
            // subscriptions[0]: subscribe=true, topic_id="foo"
            0x0a, 0x07, 0x08, 0x01, 0x12, 0x03, b'f', b'o', b'o',
            // publish[0]: from="pk", data="hi", seqno=[0,1], topic_ids=["t"]
            0x12, 0x0f, //
            0x0a, 0x02, b'p', b'k', //
            0x12, 0x02, b'h', b'i', //
            0x1a, 0x02, 0x00, 0x01, //
            0x22, 0x01, b't',
        ];
        assert_eq!(frame.encode_to_vec(), expected);
    }

    #[test]
    fn malformed_bytes_rejected() {
        assert!(Frame::decode(&[0xff, 0xff, 0xff][..]).is_err());
    }

    #[test]
    fn empty_frame_decodes_to_default() {
        let frame = Frame::decode(&[][..]).unwrap();
        assert!(frame.subscriptions.is_empty());
        assert!(frame.publish.is_empty());
    }

    #[test]
    fn invalid_messages_filtered_on_conversion() {
        // Missing origin.
        let wmsg = WireMessage {
            from: None,
            data: Some(vec![1]),
            seqno: Some(vec![1]),
            topic_ids: vec!["t".into()],
        };
        assert!(wmsg.into_message().is_none());

        // Wrong-length origin.
        let wmsg = WireMessage {
            from: Some(vec![1, 2, 3]),
            data: Some(vec![1]),
            seqno: Some(vec![1]),
            topic_ids: vec!["t".into()],
        };
        assert!(wmsg.into_message().is_none());

        // Missing seqno.
        let wmsg = WireMessage {
            from: Some(vec![9u8; 32]),
            data: Some(vec![1]),
            seqno: None,
            topic_ids: vec!["t".into()],
        };
        assert!(wmsg.into_message().is_none());

        // Only empty topics.
        let wmsg = WireMessage {
            from: Some(vec![9u8; 32]),
            data: Some(vec![1]),
            seqno: Some(vec![1]),
            topic_ids: vec!["".into()],
        };
        assert!(wmsg.into_message().is_none());

        // Empty data is fine.
        let wmsg = WireMessage {
            from: Some(vec![9u8; 32]),
            data: None,
            seqno: Some(vec![1]),
            topic_ids: vec!["t".into()],
        };
        let msg = wmsg.into_message().expect("empty payload should be valid");
        assert!(msg.data.is_empty());
    }

    #[tokio::test]
    async fn framed_stream_round_trip() {
        let (mut a, mut b) = tokio::io::duplex(4096);
        let frame = Frame::publication(&sample_message());

        write_frame(&mut a, &frame).await.unwrap();
        write_frame(&mut a, &Frame::announce("foo", true)).await.unwrap();
        drop(a);

        let first = read_frame_bytes(&mut b).await.unwrap().expect("first frame");
        assert_eq!(Frame::decode(first.as_slice()).unwrap(), frame);
        let second = read_frame_bytes(&mut b).await.unwrap().expect("second frame");
        assert_eq!(
            Frame::decode(second.as_slice()).unwrap(),
            Frame::announce("foo", true)
        );
        // Clean EOF at a frame boundary.
        assert!(read_frame_bytes(&mut b).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_length_prefix_is_an_error() {
        let (mut a, mut b) = tokio::io::duplex(64);
        let len = (MAX_FRAME_SIZE as u32 + 1).to_be_bytes();
        tokio::io::AsyncWriteExt::write_all(&mut a, &len).await.unwrap();
        let err = read_frame_bytes(&mut b).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[tokio::test]
    async fn truncated_body_is_an_error() {
        let (mut a, mut b) = tokio::io::duplex(64);
        tokio::io::AsyncWriteExt::write_all(&mut a, &8u32.to_be_bytes())
            .await
            .unwrap();
        tokio::io::AsyncWriteExt::write_all(&mut a, &[1, 2, 3]).await.unwrap();
        drop(a);
        assert!(read_frame_bytes(&mut b).await.is_err());
    }
}

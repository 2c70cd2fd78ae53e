use crate::broker::topic::Topic;
use crate::utils::error::{Error, Result};

/// Fixed wire size of a header, identical for every message type.
pub const HEADER_LEN: usize = 10;

/// Message type tags as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageType {
    Heartbeat,
    Subscribe,
    Publish,
    Error,
}

impl MessageType {
    /// The literal tag byte for this type.
    pub const fn tag(self) -> u8 {
        match self {
            MessageType::Heartbeat => b'H',
            MessageType::Subscribe => b'S',
            MessageType::Publish => b'P',
            MessageType::Error => b'E',
        }
    }

    /// Map a tag byte back to a message type.
    ///
    /// `None` for tags this version does not know; both broker and
    /// subscriber skip those datagrams instead of treating them as
    /// malformed.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'H' => Some(MessageType::Heartbeat),
            b'S' => Some(MessageType::Subscribe),
            b'P' => Some(MessageType::Publish),
            b'E' => Some(MessageType::Error),
            _ => None,
        }
    }
}

/// A decoded wire header.
///
/// On the wire a header is always 10 bytes: one reserved byte (zero, kept
/// for future versioning), the type tag, and an 8-byte body. The tag alone
/// decides whether the body holds a topic or a little-endian millisecond
/// timestamp; no variant carries both.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Header {
    /// Client to broker: a liveness claim, no payload. Broker to client:
    /// the liveness ack, with the session's stored topic as the payload.
    Heartbeat { timestamp_ms: i64 },
    /// Client to broker: replace the sender's subscription. No payload.
    Subscribe { topic: Topic },
    /// Topic-routed payload bytes, in either direction.
    Publish { topic: Topic },
    /// Reserved on the wire; never emitted by this implementation.
    Error,
}

impl Header {
    /// The wire tag this header carries.
    pub fn message_type(&self) -> MessageType {
        match self {
            Header::Heartbeat { .. } => MessageType::Heartbeat,
            Header::Subscribe { .. } => MessageType::Subscribe,
            Header::Publish { .. } => MessageType::Publish,
            Header::Error => MessageType::Error,
        }
    }

    /// Encode this header followed by `payload` into one datagram.
    ///
    /// No length prefix: the datagram boundary is the framing.
    pub fn encode(&self, payload: &[u8]) -> Vec<u8> {
        let mut datagram = Vec::with_capacity(HEADER_LEN + payload.len());
        datagram.push(0); // reserved
        datagram.push(self.message_type().tag());
        match self {
            Header::Heartbeat { timestamp_ms } => {
                datagram.extend_from_slice(&timestamp_ms.to_le_bytes());
            }
            Header::Subscribe { topic } | Header::Publish { topic } => {
                datagram.extend_from_slice(topic.as_bytes());
            }
            Header::Error => datagram.extend_from_slice(&[0u8; Topic::LEN]),
        }
        datagram.extend_from_slice(payload);
        datagram
    }

    /// Decode the header at the front of `datagram`.
    ///
    /// Fails only when the datagram cannot hold a full header; an
    /// unrecognized tag decodes to `Ok(None)` so callers can drop the
    /// datagram without treating it as malformed.
    pub fn decode(datagram: &[u8]) -> Result<Option<Header>> {
        if datagram.len() < HEADER_LEN {
            return Err(Error::MalformedHeader(datagram.len()));
        }

        let mut body = [0u8; Topic::LEN];
        body.copy_from_slice(&datagram[2..HEADER_LEN]);

        let header = match MessageType::from_tag(datagram[1]) {
            Some(MessageType::Heartbeat) => Header::Heartbeat {
                timestamp_ms: i64::from_le_bytes(body),
            },
            Some(MessageType::Subscribe) => Header::Subscribe {
                topic: Topic::from_bytes(body),
            },
            Some(MessageType::Publish) => Header::Publish {
                topic: Topic::from_bytes(body),
            },
            Some(MessageType::Error) => Header::Error,
            None => return Ok(None),
        };

        Ok(Some(header))
    }
}

/// Everything after the fixed header: the opaque payload, possibly empty.
///
/// The codec never interprets these bytes; consumers that expect a
/// particular shape (the subscriber's heartbeat-ack topic) validate the
/// length themselves.
pub fn payload(datagram: &[u8]) -> Result<&[u8]> {
    if datagram.len() < HEADER_LEN {
        return Err(Error::MalformedHeader(datagram.len()));
    }
    Ok(&datagram[HEADER_LEN..])
}

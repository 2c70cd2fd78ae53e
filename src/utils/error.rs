//! The `error` module defines the error types used within the `gust`
//! application.
//!
//! Everything fallible in the broker, the clients, and the wire codec
//! reports through the single [`Error`] enum, so the CLI can map failures
//! onto its exit-code convention in one place.

use std::net::SocketAddr;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// gust error types
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Datagram shorter than the fixed wire header
    #[error("malformed message: {0} bytes is shorter than the 10-byte header")]
    MalformedHeader(usize),

    /// Broker heartbeat carried a payload that is not an 8-byte topic
    #[error("malformed heartbeat: expected an 8-byte topic payload, got {0} bytes")]
    MalformedHeartbeat(usize),

    /// Datagram arrived from an address other than the configured broker
    #[error("unexpected sender: datagram from {actual}, expected broker at {expected}")]
    UnexpectedSender {
        /// The configured broker address
        expected: SocketAddr,
        /// Where the datagram actually came from
        actual: SocketAddr,
    },

    /// I/O failure on the socket
    #[error("transport error: {0}")]
    Transport(#[from] std::io::Error),

    /// The socket accepted fewer bytes than the whole datagram
    #[error("short send: {sent} of {len} bytes accepted")]
    ShortSend {
        /// Bytes the socket reported as sent
        sent: usize,
        /// Length of the datagram we tried to send
        len: usize,
    },

    /// Endpoint string did not parse as `<ipv4>:<port>`
    #[error("invalid endpoint '{0}': expected <ipv4>:<port>")]
    InvalidEndpoint(String),

    /// Topic string violated the topic grammar
    #[error("invalid topic '{topic}': {reason}")]
    InvalidTopic {
        /// The offending source string
        topic: String,
        /// Which grammar rule it broke
        reason: String,
    },
}

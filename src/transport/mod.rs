//! The `transport` module is responsible for network communication between
//! brokers and clients, carried as raw UDP datagrams.
//!
//! It defines the fixed binary wire format shared by both sides and wraps
//! the UDP socket with the send/receive conventions the rest of the crate
//! relies on. Datagram boundaries are message boundaries; there is no
//! framing beyond that.

pub mod message;
pub mod udp;

//! The `client` module holds the two client roles of the protocol: a
//! fire-and-forget publisher and a polling subscriber.
//!
//! Both own their own UDP socket and talk to a single configured broker
//! address. The subscriber additionally runs the heartbeat state machine
//! that keeps its session alive and its subscription confirmed.

pub mod publisher;
pub mod subscriber;

pub use publisher::Publisher;
pub use subscriber::Subscriber;

#[cfg(test)]
mod tests;

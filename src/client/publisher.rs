use std::net::SocketAddr;

use tracing::debug;

use crate::broker::topic::Topic;
use crate::transport::message::Header;
use crate::transport::udp::UdpEndpoint;
use crate::utils::error::Result;

/// Fire-and-forget producer: encodes one publish and sends it to the
/// broker.
///
/// No retry, no buffering, no acknowledgment. Success means the transport
/// accepted the whole datagram in one call; whether anyone was subscribed
/// is invisible to the publisher.
#[derive(Debug)]
pub struct Publisher {
    endpoint: UdpEndpoint,
    broker: SocketAddr,
}

impl Publisher {
    /// Opens an ephemeral socket aimed at `broker`.
    pub async fn new(broker: SocketAddr) -> Result<Self> {
        Ok(Self {
            endpoint: UdpEndpoint::ephemeral().await?,
            broker,
        })
    }

    /// Sends one publish carrying `payload` under `topic`.
    pub async fn publish(&self, topic: Topic, payload: &[u8]) -> Result<()> {
        debug!("publishing {} bytes to {}", payload.len(), topic);
        self.endpoint
            .send_to(&Header::Publish { topic }.encode(payload), self.broker)
            .await
    }
}

use std::mem;
use std::net::SocketAddr;

use chrono::Utc;
use tracing::debug;

use crate::broker::topic::Topic;
use crate::transport::message::{self, Header};
use crate::transport::udp::{MAX_DATAGRAM_LEN, UdpEndpoint};
use crate::utils::error::{Error, Result};

/// Milliseconds between heartbeats to the broker. An unconfirmed
/// subscription is re-sent at the same cadence.
pub const HEARTBEAT_INTERVAL_MS: i64 = 3_000;

/// Milliseconds of ack silence after which the broker counts as gone.
pub const HEARTBEAT_TIMEOUT_MS: i64 = 10_000;

/// Consumer half of the protocol: heartbeat upkeep, subscription
/// confirmation, and filtered receives, all driven by polling.
///
/// Each [`poll`](Self::poll) reads the clock once, sends whatever that
/// snapshot says is due, makes one non-blocking receive attempt, and hands
/// back at most one payload; callers invoke it in a loop. Subscription
/// state is confirmed purely through heartbeat acks: the broker echoes the
/// topic it has stored, and [`subscribed`](Self::subscribed) only holds
/// while that echo matches the desired topic within the timeout. A broker
/// restart therefore shows up as an ack carrying the all-zero topic, and
/// the next due heartbeat re-sends the subscribe.
#[derive(Debug)]
pub struct Subscriber {
    endpoint: UdpEndpoint,
    broker: SocketAddr,
    desired: Topic,
    reported: Topic,
    last_heartbeat_ms: i64,
    next_heartbeat_ms: i64,
    recv_buf: Vec<u8>,
}

impl Subscriber {
    /// Opens an ephemeral socket aimed at `broker` and schedules an
    /// immediate heartbeat. Nothing goes on the wire until the first
    /// [`poll`](Self::poll).
    pub async fn new(broker: SocketAddr, topic: Topic) -> Result<Self> {
        Ok(Self {
            endpoint: UdpEndpoint::ephemeral().await?,
            broker,
            desired: topic,
            reported: Topic::default(),
            last_heartbeat_ms: 0,
            next_heartbeat_ms: 0,
            recv_buf: vec![0u8; MAX_DATAGRAM_LEN],
        })
    }

    /// Whether a broker ack arrived within the timeout.
    pub fn connected(&self) -> bool {
        self.connected_at(Utc::now().timestamp_millis())
    }

    /// Whether the broker's last ack confirmed the desired topic, recently
    /// enough to still count as connected.
    pub fn subscribed(&self) -> bool {
        self.subscribed_at(Utc::now().timestamp_millis())
    }

    fn connected_at(&self, now_ms: i64) -> bool {
        now_ms - self.last_heartbeat_ms < HEARTBEAT_TIMEOUT_MS
    }

    fn subscribed_at(&self, now_ms: i64) -> bool {
        self.connected_at(now_ms) && self.reported == self.desired
    }

    /// One cycle of the state machine.
    ///
    /// `Ok(Some(payload))` for a publish matching the desired topic;
    /// `Ok(None)` when nothing arrived or the datagram was internal
    /// protocol traffic. A datagram from anyone but the configured broker
    /// fails the call.
    pub async fn poll(&mut self) -> Result<Option<Vec<u8>>> {
        let now_ms = Utc::now().timestamp_millis();
        if now_ms >= self.next_heartbeat_ms {
            self.next_heartbeat_ms = now_ms + HEARTBEAT_INTERVAL_MS;
            self.send_heartbeat(now_ms).await?;
        }

        let mut buf = mem::take(&mut self.recv_buf);
        let polled = self.recv_one(&mut buf);
        self.recv_buf = buf;
        polled
    }

    async fn send_heartbeat(&self, now_ms: i64) -> Result<()> {
        self.endpoint
            .send_to(
                &Header::Heartbeat {
                    timestamp_ms: now_ms,
                }
                .encode(&[]),
                self.broker,
            )
            .await?;
        if !self.subscribed_at(now_ms) {
            debug!(
                "subscription unconfirmed, re-sending subscribe for {}",
                self.desired
            );
            self.endpoint
                .send_to(
                    &Header::Subscribe {
                        topic: self.desired,
                    }
                    .encode(&[]),
                    self.broker,
                )
                .await?;
        }
        Ok(())
    }

    fn recv_one(&mut self, buf: &mut [u8]) -> Result<Option<Vec<u8>>> {
        let Some((len, from)) = self.endpoint.try_recv_from(buf)? else {
            return Ok(None);
        };
        if from != self.broker {
            return Err(Error::UnexpectedSender {
                expected: self.broker,
                actual: from,
            });
        }

        let datagram = &buf[..len];
        let Some(header) = Header::decode(datagram)? else {
            return Ok(None);
        };
        match header {
            Header::Heartbeat { timestamp_ms } => {
                let payload = message::payload(datagram)?;
                let slots: [u8; Topic::LEN] = payload
                    .try_into()
                    .map_err(|_| Error::MalformedHeartbeat(payload.len()))?;
                self.reported = Topic::from_bytes(slots);
                self.last_heartbeat_ms = timestamp_ms;
                Ok(None)
            }
            Header::Publish { topic } => {
                if topic.matches(&self.desired) {
                    Ok(Some(message::payload(datagram)?.to_vec()))
                } else {
                    debug!("dropping publish for non-matching topic {}", topic);
                    Ok(None)
                }
            }
            _ => Ok(None),
        }
    }
}

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::mem;
use std::net::SocketAddr;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::broker::session::Session;
use crate::broker::topic::Topic;
use crate::transport::message::{self, Header, MessageType};
use crate::transport::udp::{MAX_DATAGRAM_LEN, UdpEndpoint};
use crate::utils::error::Result;

/// The routing core of the system: one bound socket plus a table of live
/// sessions, keyed by remote address.
///
/// Heartbeats keep a session alive and are acked with the session's stored
/// topic; subscribes replace the stored topic; publishes fan out to every
/// live session whose topic matches. Sessions expire lazily, only while a
/// publish scans the table. There is no background timer, so an idle broker
/// carries idle sessions indefinitely without cost.
#[derive(Debug)]
pub struct Broker {
    endpoint: UdpEndpoint,
    sessions: HashMap<SocketAddr, Session>,
    recv_buf: Vec<u8>,
    now_ms: i64,
}

impl Broker {
    /// Binds the broker socket and returns an idle broker.
    ///
    /// Nothing is processed until [`run`](Self::run) or
    /// [`step`](Self::step) is called.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let endpoint = UdpEndpoint::bind(addr).await?;
        info!("listening on {}", endpoint.local_addr()?);
        Ok(Self {
            endpoint,
            sessions: HashMap::new(),
            recv_buf: vec![0u8; MAX_DATAGRAM_LEN],
            now_ms: 0,
        })
    }

    /// The bound address, with the real port once bound to port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.endpoint.local_addr()
    }

    /// Number of sessions currently in the table, live or not yet reaped.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Serves until the caller drops the future or the socket fails.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.step().await?;
        }
    }

    /// Receives and processes exactly one datagram.
    ///
    /// The clock is read once per datagram and every decision in the
    /// dispatch uses that snapshot. Malformed traffic is logged and
    /// dropped; only a failure of the broker's own socket propagates.
    pub async fn step(&mut self) -> Result<()> {
        let mut buf = mem::take(&mut self.recv_buf);
        let received = self.endpoint.recv_from(&mut buf).await;
        let stepped = match received {
            Ok((len, from)) => {
                self.now_ms = Utc::now().timestamp_millis();
                if let Err(err) = self.dispatch(from, &buf[..len]).await {
                    warn!("[{}] dropped datagram: {}", from, err);
                }
                Ok(())
            }
            Err(err) => Err(err),
        };
        self.recv_buf = buf;
        stepped
    }

    async fn dispatch(&mut self, from: SocketAddr, datagram: &[u8]) -> Result<()> {
        let Some(header) = Header::decode(datagram)? else {
            debug!("[{}] ignoring unrecognized tag", from);
            return Ok(());
        };
        debug!(
            "[{}] > ({}) {} bytes",
            from,
            header.message_type().tag() as char,
            datagram.len()
        );

        match header {
            Header::Heartbeat { timestamp_ms } => self.handle_heartbeat(from, timestamp_ms).await,
            Header::Subscribe { topic } => {
                self.handle_subscribe(from, topic);
                Ok(())
            }
            Header::Publish { topic } => {
                self.handle_publish(topic, message::payload(datagram)?).await
            }
            Header::Error => Ok(()),
        }
    }

    /// Upserts the sender's session and acks with the clamped timestamp
    /// plus the stored topic, so the client can tell when its subscription
    /// was lost to a restart.
    async fn handle_heartbeat(&mut self, from: SocketAddr, claimed_ms: i64) -> Result<()> {
        let now_ms = self.now_ms;
        let session = match self.sessions.entry(from) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                info!("[{}] new session", from);
                vacant.insert(Session::default())
            }
        };
        let acked_ms = session.record_heartbeat(claimed_ms, now_ms);
        let ack = Header::Heartbeat {
            timestamp_ms: acked_ms,
        }
        .encode(session.topic.as_bytes());
        self.send(MessageType::Heartbeat, &ack, from).await
    }

    fn handle_subscribe(&mut self, from: SocketAddr, topic: Topic) {
        info!("[{}] subscribed to {}", from, topic);
        self.sessions.entry(from).or_default().topic = topic;
    }

    /// Walks the whole table once: expired sessions are dropped, every
    /// other session with a matching topic gets a copy of the publish.
    async fn handle_publish(&mut self, topic: Topic, payload: &[u8]) -> Result<()> {
        let now_ms = self.now_ms;
        self.sessions.retain(|addr, session| {
            if session.is_stale(now_ms) {
                info!("[{}] timed out", addr);
                return false;
            }
            true
        });

        let datagram = Header::Publish { topic }.encode(payload);
        let matching: Vec<SocketAddr> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.topic.matches(&topic))
            .map(|(addr, _)| *addr)
            .collect();
        for to in matching {
            self.send(MessageType::Publish, &datagram, to).await?;
        }
        Ok(())
    }

    async fn send(&self, ty: MessageType, datagram: &[u8], to: SocketAddr) -> Result<()> {
        debug!("[{}] < ({}) {} bytes", to, ty.tag() as char, datagram.len());
        self.endpoint.send_to(datagram, to).await
    }
}

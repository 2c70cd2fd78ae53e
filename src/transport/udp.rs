use std::io;
use std::net::SocketAddr;

use tokio::net::UdpSocket;

use crate::utils::error::{Error, Result};

/// Largest datagram we ever expect on the wire; receive buffers are sized
/// to this.
pub const MAX_DATAGRAM_LEN: usize = 65535;

/// One UDP socket with the crate's send/receive conventions applied.
///
/// Each broker, publisher, and subscriber instance exclusively owns one of
/// these; nothing is shared across tasks, so no locking is involved.
#[derive(Debug)]
pub struct UdpEndpoint {
    socket: UdpSocket,
}

impl UdpEndpoint {
    /// Bind to a fixed local address. This is the broker's mode.
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self { socket })
    }

    /// Bind to an ephemeral local port. This is the clients' mode; the
    /// broker address travels with each send instead.
    pub async fn ephemeral() -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
        Ok(Self { socket })
    }

    /// The locally bound address, with the real port once bound to port 0.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Send one datagram, requiring the transport to accept all of it in
    /// one call.
    pub async fn send_to(&self, datagram: &[u8], to: SocketAddr) -> Result<()> {
        let sent = self.socket.send_to(datagram, to).await?;
        if sent != datagram.len() {
            return Err(Error::ShortSend {
                sent,
                len: datagram.len(),
            });
        }
        Ok(())
    }

    /// Receive one datagram, parking the task until one arrives.
    pub async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        Ok(self.socket.recv_from(buf).await?)
    }

    /// One non-blocking receive attempt.
    ///
    /// `Ok(None)` when nothing is pending; an error only for real
    /// transport failures.
    pub fn try_recv_from(&self, buf: &mut [u8]) -> Result<Option<(usize, SocketAddr)>> {
        match self.socket.try_recv_from(buf) {
            Ok((len, from)) => Ok(Some((len, from))),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

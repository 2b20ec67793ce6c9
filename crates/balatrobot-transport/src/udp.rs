//! Legacy datagram transport over UDP.
//!
//! "Connecting" a UDP socket only records the peer address; nothing is
//! exchanged until the first send. The kernel receive buffer (`SO_RCVBUF`)
//! is sized from `buffer_size` before the socket is bound.

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

use socket2::{Domain, Protocol, SockRef, Socket, Type};
use tokio::net::UdpSocket;
use tokio::time::timeout;

use crate::{
    resolve, Connection, ConnectionId, TransportConfig, TransportError,
    WireContract,
};

/// A UDP socket speaking the pipe-action contract.
pub struct UdpConnection {
    id: ConnectionId,
    socket: UdpSocket,
    peer: SocketAddr,
    timeout: Duration,
    buffer: Vec<u8>,
}

impl UdpConnection {
    /// The kernel receive buffer size as reported by the OS. Linux reports
    /// twice the requested value.
    pub fn recv_buffer_size(&self) -> io::Result<usize> {
        SockRef::from(&self.socket).recv_buffer_size()
    }
}

/// Binds an unspecified local address of `peer`'s family with `SO_RCVBUF`
/// set to `recv_buffer`.
fn bind_socket(peer: SocketAddr, recv_buffer: usize) -> io::Result<UdpSocket> {
    let local: SocketAddr = if peer.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let raw = Socket::new(Domain::for_address(peer), Type::DGRAM, Some(Protocol::UDP))?;
    raw.set_recv_buffer_size(recv_buffer)?;
    raw.set_nonblocking(true)?;
    raw.bind(&local.into())?;
    UdpSocket::from_std(raw.into())
}

impl Connection for UdpConnection {
    const CONTRACT: WireContract = WireContract::Datagram;

    async fn connect(config: &TransportConfig) -> Result<Self, TransportError> {
        let config = config.clone().validated();
        let peer = resolve(&config).await?;
        let addr = config.addr();
        let connect_err = |source| TransportError::ConnectFailed {
            addr: addr.clone(),
            source,
        };

        let socket = bind_socket(peer, config.buffer_size).map_err(connect_err)?;
        socket.connect(peer).await.map_err(connect_err)?;

        let id = ConnectionId::next();
        tracing::debug!(%id, %peer, "udp socket bound to peer");

        Ok(Self {
            id,
            socket,
            peer,
            timeout: config.timeout,
            buffer: vec![0; config.buffer_size],
        })
    }

    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        match timeout(self.timeout, self.socket.send(data)).await {
            Ok(Ok(n)) if n == data.len() => Ok(()),
            Ok(Ok(n)) => Err(TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::WriteZero,
                format!("datagram truncated: sent {n} of {} bytes", data.len()),
            ))),
            Ok(Err(e)) => Err(TransportError::SendFailed(e)),
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        }
    }

    async fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        match timeout(self.timeout, self.socket.recv(&mut self.buffer)).await {
            Ok(Ok(n)) => Ok(self.buffer[..n].to_vec()),
            Ok(Err(e)) => Err(TransportError::ReceiveFailed(e)),
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        // Dropping the socket releases it; there is no close handshake.
        Ok(())
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

//! Stream transport over TCP.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpSocket, TcpStream};
use tokio::time::timeout;

use crate::{
    resolve, Connection, ConnectionId, TransportConfig, TransportError,
    WireContract,
};

/// A TCP connection speaking the newline-terminated JSON contract.
pub struct TcpConnection {
    id: ConnectionId,
    stream: TcpStream,
    peer: SocketAddr,
    timeout: Duration,
    buffer: Vec<u8>,
}

impl Connection for TcpConnection {
    const CONTRACT: WireContract = WireContract::Stream;

    async fn connect(config: &TransportConfig) -> Result<Self, TransportError> {
        let config = config.clone().validated();
        let peer = resolve(&config).await?;
        let addr = config.addr();
        let connect_err = |source| TransportError::ConnectFailed {
            addr: addr.clone(),
            source,
        };

        let socket = if peer.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(connect_err)?;
        let rcvbuf = u32::try_from(config.buffer_size).unwrap_or(u32::MAX);
        socket.set_recv_buffer_size(rcvbuf).map_err(connect_err)?;

        let stream = match timeout(config.timeout, socket.connect(peer)).await {
            Ok(result) => result.map_err(connect_err)?,
            Err(_) => return Err(TransportError::Timeout(config.timeout)),
        };
        stream.set_nodelay(true).map_err(connect_err)?;

        let id = ConnectionId::next();
        tracing::debug!(%id, %peer, "tcp connection established");

        Ok(Self {
            id,
            stream,
            peer,
            timeout: config.timeout,
            buffer: vec![0; config.buffer_size],
        })
    }

    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError> {
        match timeout(self.timeout, self.stream.write_all(data)).await {
            Ok(result) => result.map_err(TransportError::SendFailed),
            Err(_) => Err(TransportError::Timeout(self.timeout)),
        }
    }

    async fn recv(&mut self) -> Result<Vec<u8>, TransportError> {
        let read = timeout(self.timeout, self.stream.read(&mut self.buffer));
        match read.await {
            Err(_) => Err(TransportError::Timeout(self.timeout)),
            Ok(Err(e)) => Err(TransportError::ReceiveFailed(e)),
            Ok(Ok(0)) => Err(TransportError::ConnectionClosed(format!(
                "{} closed the stream",
                self.peer
            ))),
            Ok(Ok(n)) => Ok(self.buffer[..n].to_vec()),
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        tracing::debug!(id = %self.id, "closing tcp connection");
        self.stream
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}

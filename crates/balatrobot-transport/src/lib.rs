//! Transport layer for BalatroBot.
//!
//! Provides the [`Connection`] trait over the two socket kinds the peer
//! has used, plus the shared [`TransportConfig`].
//!
//! A connection is a dumb pipe: one `send`, one `recv`, each bounded by
//! the configured timeout. It never retries and never reconnects. That
//! decision belongs to the caller (the RPC client fails fast; the bot loop
//! reconnects under its own policy).
//!
//! # Feature Flags
//!
//! - `tcp` (default) - stream transport, wire contract v2
//! - `udp` (default) - legacy datagram transport, wire contract v1

#![allow(async_fn_in_trait)]

mod config;
mod error;
#[cfg(feature = "tcp")]
mod tcp;
#[cfg(feature = "udp")]
mod udp;

pub use balatrobot_protocol::WireContract;
pub use config::TransportConfig;
pub use error::TransportError;
#[cfg(feature = "tcp")]
pub use tcp::TcpConnection;
#[cfg(feature = "udp")]
pub use udp::UdpConnection;

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for one socket, so reconnects are visible in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Allocates the next process-unique id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A single exclusively owned socket to the peer.
///
/// Every method takes `&mut self`: there is never more than one
/// outstanding operation on a connection.
pub trait Connection: Sized + Send + 'static {
    /// The dialect this socket kind speaks.
    const CONTRACT: WireContract;

    /// Opens a socket to `config.host:config.port`, applying the timeout
    /// and receive buffer size.
    async fn connect(config: &TransportConfig) -> Result<Self, TransportError>;

    /// Writes `data` in full.
    async fn send(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Performs exactly one receive of at most `buffer_size` bytes.
    async fn recv(&mut self) -> Result<Vec<u8>, TransportError>;

    /// Closes the socket. The connection must not be used afterwards.
    async fn close(&mut self) -> Result<(), TransportError>;

    /// The resolved peer address.
    fn peer_addr(&self) -> SocketAddr;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

/// Resolves the configured host to its first socket address.
pub(crate) async fn resolve(
    config: &TransportConfig,
) -> Result<SocketAddr, TransportError> {
    let addr = config.addr();
    let mut addrs = tokio::net::lookup_host((config.host.as_str(), config.port))
        .await
        .map_err(|source| TransportError::ConnectFailed {
            addr: addr.clone(),
            source,
        })?;
    addrs.next().ok_or_else(|| TransportError::ConnectFailed {
        addr,
        source: std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "host resolved to no addresses",
        ),
    })
}

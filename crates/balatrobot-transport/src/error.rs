use std::time::Duration;

/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Resolving, creating or connecting the socket failed.
    #[error("failed to connect to {addr}: {source}")]
    ConnectFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// The peer closed the connection.
    #[error("connection closed: {0}")]
    ConnectionClosed(String),

    /// No reply arrived within the configured timeout.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// An operation needed a live connection and there was none.
    #[error("not connected")]
    NotConnected,

    /// A configuration value could not be used.
    #[error("invalid transport config `{key}`={value:?}: {reason}")]
    InvalidConfig {
        key: &'static str,
        value: String,
        reason: String,
    },
}

impl TransportError {
    /// Returns `true` if reconnecting could plausibly fix the failure.
    ///
    /// Configuration mistakes are not retryable; everything that comes
    /// from the socket is.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::InvalidConfig { .. })
    }
}

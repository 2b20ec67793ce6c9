//! Connection settings.

use std::time::Duration;

use tracing::warn;

use crate::TransportError;

/// Where the peer lives and how long to wait for it.
///
/// Defaults match a locally running game with the mod's standard port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    /// Peer host name or IP address.
    pub host: String,

    /// Peer port.
    pub port: u16,

    /// Upper bound for connect, send and each blocking receive.
    pub timeout: Duration,

    /// Receive buffer size. Also the largest reply a single receive can
    /// return.
    pub buffer_size: usize,
}

impl TransportConfig {
    pub const DEFAULT_HOST: &'static str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 12346;
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    pub const DEFAULT_BUFFER_SIZE: usize = 65536;
    /// Largest accepted buffer; a UDP payload cannot exceed this anyway.
    pub const MAX_BUFFER_SIZE: usize = 1 << 24;

    pub const ENV_HOST: &'static str = "BALATROBOT_HOST";
    pub const ENV_PORT: &'static str = "BALATROBOT_PORT";
    pub const ENV_TIMEOUT_SECS: &'static str = "BALATROBOT_TIMEOUT_SECS";

    /// Reads overrides from `BALATROBOT_HOST`, `BALATROBOT_PORT` and
    /// `BALATROBOT_TIMEOUT_SECS`. Unset variables keep their defaults.
    ///
    /// # Errors
    /// `InvalidConfig` if a variable is set but unparsable.
    pub fn from_env() -> Result<Self, TransportError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), with a custom variable source.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, TransportError> {
        let mut config = Self::default();

        if let Some(host) = lookup(Self::ENV_HOST) {
            if host.trim().is_empty() {
                return Err(TransportError::InvalidConfig {
                    key: Self::ENV_HOST,
                    value: host,
                    reason: "host is empty".into(),
                });
            }
            config.host = host.trim().to_string();
        }

        if let Some(port) = lookup(Self::ENV_PORT) {
            config.port = port.trim().parse().map_err(|e| {
                TransportError::InvalidConfig {
                    key: Self::ENV_PORT,
                    value: port.clone(),
                    reason: format!("{e}"),
                }
            })?;
        }

        if let Some(secs) = lookup(Self::ENV_TIMEOUT_SECS) {
            let parsed: f64 = secs.trim().parse().map_err(|e| {
                TransportError::InvalidConfig {
                    key: Self::ENV_TIMEOUT_SECS,
                    value: secs.clone(),
                    reason: format!("{e}"),
                }
            })?;
            if !(parsed.is_finite() && parsed > 0.0) {
                return Err(TransportError::InvalidConfig {
                    key: Self::ENV_TIMEOUT_SECS,
                    value: secs,
                    reason: "timeout must be a positive number of seconds"
                        .into(),
                });
            }
            config.timeout = Duration::from_secs_f64(parsed);
        }

        Ok(config)
    }

    /// Replaces unusable values with defaults or the nearest legal value.
    pub fn validated(mut self) -> Self {
        if self.timeout.is_zero() {
            warn!(
                default = ?Self::DEFAULT_TIMEOUT,
                "zero timeout would fail every receive; using default"
            );
            self.timeout = Self::DEFAULT_TIMEOUT;
        }
        if self.buffer_size == 0 {
            warn!(
                default = Self::DEFAULT_BUFFER_SIZE,
                "zero buffer_size; using default"
            );
            self.buffer_size = Self::DEFAULT_BUFFER_SIZE;
        } else if self.buffer_size > Self::MAX_BUFFER_SIZE {
            warn!(
                size = self.buffer_size,
                max = Self::MAX_BUFFER_SIZE,
                "buffer_size exceeds maximum; clamping"
            );
            self.buffer_size = Self::MAX_BUFFER_SIZE;
        }
        self
    }

    /// `host:port`, as used in logs and error context.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            host: Self::DEFAULT_HOST.to_string(),
            port: Self::DEFAULT_PORT,
            timeout: Self::DEFAULT_TIMEOUT,
            buffer_size: Self::DEFAULT_BUFFER_SIZE,
        }
    }
}

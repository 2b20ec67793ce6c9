//! Error types for the decision loop.

use balatrobot_protocol::{ErrorCode, ProtocolError};
use balatrobot_transport::TransportError;

/// Errors that end a bot run.
///
/// Socket failures are absorbed by the reconnect policy and only surface
/// as [`BotError::RetriesExhausted`]. Everything else is fatal on the
/// first occurrence.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    /// The peer sent something the loop cannot act on: not JSON, an
    /// unknown `waitingFor`, or an unknown phase code.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),

    /// A strategy callback returned no action.
    #[error("strategy returned no action for `{waiting_for}`")]
    NoAction { waiting_for: String },

    /// The chosen action failed validation or encoding.
    #[error("invalid action: {0}")]
    InvalidAction(#[from] ProtocolError),

    /// Too many consecutive socket failures.
    #[error("gave up after {attempts} consecutive socket failures: {last}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        last: TransportError,
    },

    /// The decision cache could not be written.
    #[error("state cache: {0}")]
    Cache(#[from] std::io::Error),
}

impl BotError {
    /// The peer-taxonomy code for this failure, when one applies.
    /// Strategy and cache failures are local and have none.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::ProtocolViolation(_) => Some(ErrorCode::InvalidJson),
            Self::InvalidAction(e) => Some(e.code()),
            Self::RetriesExhausted { .. } => Some(ErrorCode::ConnectionFailed),
            Self::NoAction { .. } | Self::Cache(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_invalid_action_keeps_protocol_code() {
        let err: BotError = ProtocolError::UnknownAction("FOLD".into()).into();
        assert_eq!(err.code(), Some(ErrorCode::InvalidParameter));
    }

    #[test]
    fn test_exhausted_retries_is_connection_failure() {
        let err = BotError::RetriesExhausted {
            attempts: 3,
            last: TransportError::Timeout(Duration::from_secs(1)),
        };
        assert_eq!(err.code(), Some(ErrorCode::ConnectionFailed));
    }

    #[test]
    fn test_local_failures_have_no_code() {
        let err = BotError::NoAction {
            waiting_for: "start_run".into(),
        };
        assert_eq!(err.code(), None);
        let err: BotError = std::io::Error::other("disk full").into();
        assert_eq!(err.code(), None);
    }
}

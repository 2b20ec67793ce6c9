//! Unified error type for the BalatroBot crates.

use balatrobot_bot::BotError;
use balatrobot_checkpoint::CheckpointError;
use balatrobot_client::BalatroError;
use balatrobot_protocol::{ErrorCode, JsonObject, ProtocolError};
use balatrobot_replay::ReplayError;
use balatrobot_transport::TransportError;

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An error reported by, or about, the peer during an RPC call.
    #[error(transparent)]
    Client(#[from] BalatroError),

    #[error(transparent)]
    Bot(#[from] BotError),

    #[error(transparent)]
    Checkpoint(#[from] CheckpointError),

    #[error(transparent)]
    Replay(#[from] ReplayError),
}

impl Error {
    /// The peer-facing error code, when one applies.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Protocol(e) => Some(e.code()),
            Self::Transport(TransportError::InvalidConfig { .. }) => None,
            Self::Transport(_) => Some(ErrorCode::ConnectionFailed),
            Self::Client(e) => Some(e.code()),
            Self::Bot(e) => e.code(),
            Self::Checkpoint(e) => e.code(),
            Self::Replay(e) => e.code(),
        }
    }

    /// Diagnostic context attached by the peer or the client, or an empty
    /// object.
    pub fn context(&self) -> JsonObject {
        match self {
            Self::Client(e) => e.context(),
            Self::Checkpoint(CheckpointError::Client(e)) => e.context(),
            Self::Replay(ReplayError::Client { source, .. }) => source.context(),
            _ => JsonObject::new(),
        }
    }
}

use std::io;
use std::path::PathBuf;

use balatrobot_client::BalatroError;
use balatrobot_protocol::{ErrorCode, ProtocolError};
use serde_json::Value;

/// Errors from reading, recording or replaying a run.
///
/// Step numbers are 1-based positions in the log.
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("line {line}: invalid JSON: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("line {line}: invalid log entry: {source}")]
    InvalidEntry {
        line: usize,
        #[source]
        source: ProtocolError,
    },

    #[error("no .jsonl run files in {}", .0.display())]
    NoRuns(PathBuf),

    #[error(transparent)]
    Io(#[from] io::Error),

    /// The peer rejected or failed a recorded call.
    #[error("step {step} ({call}): {source}")]
    Client {
        step: usize,
        call: String,
        #[source]
        source: BalatroError,
    },

    /// The peer's reply to a recorded call is not a valid game state.
    #[error("step {step} ({call}): reply failed schema validation: {source}")]
    Schema {
        step: usize,
        call: String,
        #[source]
        source: ProtocolError,
    },

    /// The peer's reply differs from the state recorded for the next step.
    #[error(
        "game state mismatch at step {step}\nfunction: {call}({arguments})\nexpected: {expected}\nactual: {actual}"
    )]
    Mismatch {
        step: usize,
        call: String,
        arguments: Value,
        expected: Box<Value>,
        actual: Box<Value>,
    },
}

impl ReplayError {
    /// The step that failed, for errors raised mid-replay.
    pub fn step(&self) -> Option<usize> {
        match self {
            Self::Client { step, .. }
            | Self::Schema { step, .. }
            | Self::Mismatch { step, .. } => Some(*step),
            _ => None,
        }
    }

    /// The peer-taxonomy code for this failure, when one applies.
    /// Mismatches and local file problems have none.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Parse { .. } => Some(ErrorCode::InvalidJson),
            Self::InvalidEntry { source, .. } | Self::Schema { source, .. } => {
                Some(source.code())
            }
            Self::Client { source, .. } => Some(source.code()),
            Self::NoRuns(_) | Self::Io(_) | Self::Mismatch { .. } => None,
        }
    }
}

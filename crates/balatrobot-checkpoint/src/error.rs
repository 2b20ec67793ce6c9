use std::io;
use std::path::PathBuf;

use balatrobot_client::BalatroError;
use balatrobot_protocol::ErrorCode;

/// Errors from checkpoint operations.
#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("no save file exists to checkpoint")]
    NoActiveSave,

    #[error("no active profile")]
    NoActiveProfile,

    /// The peer reported a save file that is not on disk.
    #[error("save file not found: {}", .0.display())]
    SaveFileMissing(PathBuf),

    #[error("checkpoint not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("{path:?} must end in .{expected}")]
    InvalidExtension { path: String, expected: String },

    #[error("invalid checkpoint name {0:?}")]
    InvalidName(String),

    #[error("{op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Client(#[from] BalatroError),
}

impl CheckpointError {
    /// The peer-taxonomy code for this failure, when one applies.
    /// Local I/O failures have none.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::NoActiveSave | Self::NoActiveProfile => {
                Some(ErrorCode::InvalidGameState)
            }
            Self::SaveFileMissing(_) | Self::NotFound(_) => {
                Some(ErrorCode::MissingGameObject)
            }
            Self::InvalidExtension { .. } | Self::InvalidName(_) => {
                Some(ErrorCode::InvalidParameter)
            }
            Self::Io { .. } => None,
            Self::Client(e) => Some(e.code()),
        }
    }

    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
        let path = path.into();
        move |source| Self::Io { op, path, source }
    }
}

//! Error types for the protocol layer.
//!
//! Each crate in BalatroBot defines its own error enum. A `ProtocolError`
//! always means the bytes or the values inside them were wrong: the socket
//! that carried them may be perfectly healthy.

use crate::types::ErrorCode;
use crate::Action;

/// Errors that can occur while encoding, decoding or validating wire data.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed: malformed JSON, a missing field, or a
    /// field the closed schema does not allow.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),

    /// The message is structurally valid JSON but breaks a protocol rule,
    /// e.g. request arguments that are neither an object nor an array.
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// The peer reported a phase code outside the known set.
    #[error("unknown game state code {0}")]
    UnknownState(i64),

    /// An error code string that is not one of `E001`..`E016`.
    #[error("unknown error code {0:?}")]
    UnknownErrorCode(String),

    /// An action verb that is not part of the action set.
    #[error("unknown action {0:?}")]
    UnknownAction(String),

    /// An [`ActionSchema`](crate::ActionSchema) whose arguments do not fit
    /// the verb's argument shape.
    #[error("invalid {action} action: {reason}")]
    InvalidAction { action: Action, reason: String },

    /// A request field holds a value the peer would reject.
    #[error("invalid parameter `{field}`: {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    /// A numeric request field (or a list length) is outside its range.
    #[error("parameter `{field}` out of range: {value} not in {min}..={max}")]
    OutOfRange {
        field: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },
}

impl ProtocolError {
    /// The peer error code this failure corresponds to.
    ///
    /// Decode failures map onto `E001` so a schema mismatch is reported in
    /// the same tier as invalid JSON.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Encode(_)
            | Self::Decode(_)
            | Self::UnknownState(_)
            | Self::UnknownErrorCode(_) => ErrorCode::InvalidJson,
            Self::InvalidMessage(_) => ErrorCode::InvalidArguments,
            Self::UnknownAction(_)
            | Self::InvalidAction { .. }
            | Self::InvalidParameter { .. } => ErrorCode::InvalidParameter,
            Self::OutOfRange { .. } => ErrorCode::ParameterOutOfRange,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_maps_to_invalid_json() {
        let err = serde_json::from_str::<serde_json::Value>("{nope")
            .map_err(ProtocolError::Decode)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidJson);
        assert!(err.to_string().starts_with("decode failed"));
    }

    #[test]
    fn test_out_of_range_message_and_code() {
        let err = ProtocolError::OutOfRange {
            field: "stake",
            value: 9,
            min: 1,
            max: 8,
        };
        assert_eq!(err.code(), ErrorCode::ParameterOutOfRange);
        assert_eq!(
            err.to_string(),
            "parameter `stake` out of range: 9 not in 1..=8"
        );
    }

    #[test]
    fn test_invalid_action_names_the_verb() {
        let err = ProtocolError::InvalidAction {
            action: Action::PlayHand,
            reason: "expected 1 argument".into(),
        };
        assert_eq!(err.code(), ErrorCode::InvalidParameter);
        assert!(err.to_string().contains("PLAY_HAND"));
    }
}

//! The client's error hierarchy.
//!
//! Every failure a caller can see from [`BalatroClient`](crate::BalatroClient)
//! is a [`BalatroError`], split into the tiers callers actually need to
//! tell apart:
//!
//! ```text
//! Connection  - socket missing, dropped, timed out (E006..E008)
//! Protocol    - unreadable reply or rejected request shape (E001..E005)
//! Schema      - valid JSON that doesn't fit the expected model (E001)
//! Validation  - request refused in the current state (E009..E012)
//! GameLogic   - the rules refused the action (E013..E016)
//! ```
//!
//! Branch on [`BalatroError::code`], never on the message text.

use std::fmt;

use balatrobot_protocol::{
    ErrorCategory, ErrorCode, ErrorResponse, JsonObject, ProtocolError,
};
use balatrobot_transport::TransportError;
use serde_json::Value;

/// The payload shared by every coded error: what the peer (or the client
/// on its behalf) reported.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    /// Phase code at the time of the error, when the peer reported one.
    pub state: Option<i64>,
    /// Diagnostic key/value pairs.
    pub context: JsonObject,
}

impl ErrorDetails {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            state: None,
            context: JsonObject::new(),
        }
    }

    pub fn with_context(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_state(mut self, state: i64) -> Self {
        self.state = Some(state);
        self
    }
}

impl fmt::Display for ErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.message, self.code)
    }
}

/// Errors returned by the RPC client.
#[derive(Debug, thiserror::Error)]
pub enum BalatroError {
    /// The request or the reply could not be understood.
    #[error("protocol error: {0}")]
    Protocol(ErrorDetails),

    /// No usable socket: never connected, dropped, or timed out.
    #[error("connection failed: {0}")]
    Connection(ErrorDetails),

    /// The peer (or local validation) refused the request's parameters or
    /// timing.
    #[error("validation error: {0}")]
    Validation(ErrorDetails),

    /// The game's rules refused the action.
    #[error("game logic error: {0}")]
    GameLogic(ErrorDetails),

    /// A reply parsed as JSON but did not match the expected model.
    #[error("response to `{call}` failed schema validation: {source}")]
    Schema {
        call: String,
        #[source]
        source: ProtocolError,
    },
}

impl BalatroError {
    /// Builds the variant that matches `details.code`'s category.
    pub fn from_details(details: ErrorDetails) -> Self {
        match details.code.category() {
            ErrorCategory::Protocol => Self::Protocol(details),
            ErrorCategory::Network => Self::Connection(details),
            ErrorCategory::Validation => Self::Validation(details),
            ErrorCategory::GameLogic => Self::GameLogic(details),
        }
    }

    /// A connection error (`E008`) with the given message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(ErrorDetails::new(ErrorCode::ConnectionFailed, message))
    }

    /// Wraps a socket failure, keeping the original error as context.
    pub fn from_transport(message: &str, err: &TransportError) -> Self {
        let mut details =
            ErrorDetails::new(ErrorCode::ConnectionFailed, format!("{message}: {err}"))
                .with_context("error", err.to_string());
        if let TransportError::Timeout(d) = err {
            details = details
                .with_context("timeout_ms", u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
        }
        Self::Connection(details)
    }

    /// Maps a locally detected request problem to its tier.
    pub fn from_request(err: ProtocolError) -> Self {
        let details = ErrorDetails::new(err.code(), err.to_string());
        Self::from_details(details)
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Protocol(d)
            | Self::Connection(d)
            | Self::Validation(d)
            | Self::GameLogic(d) => d.code,
            Self::Schema { .. } => ErrorCode::InvalidJson,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Protocol(d)
            | Self::Connection(d)
            | Self::Validation(d)
            | Self::GameLogic(d) => d.message.clone(),
            Self::Schema { source, .. } => source.to_string(),
        }
    }

    pub fn state(&self) -> Option<i64> {
        self.details().and_then(|d| d.state)
    }

    /// Diagnostic context. Empty for schema errors.
    pub fn context(&self) -> JsonObject {
        match self {
            Self::Schema { call, source } => {
                let mut ctx = JsonObject::new();
                ctx.insert("call".into(), call.clone().into());
                ctx.insert("error".into(), source.to_string().into());
                ctx
            }
            _ => self.details().map(|d| d.context.clone()).unwrap_or_default(),
        }
    }

    pub fn details(&self) -> Option<&ErrorDetails> {
        match self {
            Self::Protocol(d)
            | Self::Connection(d)
            | Self::Validation(d)
            | Self::GameLogic(d) => Some(d),
            Self::Schema { .. } => None,
        }
    }

    /// The propagation tier, i.e. the category of [`code`](Self::code).
    pub fn tier(&self) -> ErrorCategory {
        self.code().category()
    }

    /// Returns `true` for socket-level failures, the only kind a
    /// long-running loop may recover from by reconnecting.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

impl From<ErrorResponse> for BalatroError {
    fn from(resp: ErrorResponse) -> Self {
        let details = ErrorDetails {
            code: resp.error_code,
            message: resp.error,
            state: resp.state,
            context: resp.context.unwrap_or_default(),
        };
        Self::from_details(details)
    }
}

//! Versioned wire contracts.
//!
//! The peer has spoken two incompatible dialects over time. Rather than
//! guessing, every connection is created with one explicit
//! [`WireContract`] and keeps it for its whole life.
//!
//! | Contract | Version | Transport | Requests | Actions |
//! |---|---|---|---|---|
//! | `Stream` | 2 | TCP | JSON + `\n` | JSON + `\n` |
//! | `Datagram` | 1 | UDP | JSON datagram | pipe-delimited text |

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ActionSchema, ApiRequest, Codec, JsonCodec, ProtocolError};

/// Which dialect a connection speaks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum WireContract {
    /// Newline-terminated JSON over a stream socket.
    #[default]
    Stream,
    /// Legacy datagram dialect with pipe-form actions.
    Datagram,
}

impl WireContract {
    pub fn version(self) -> u32 {
        match self {
            Self::Stream => 2,
            Self::Datagram => 1,
        }
    }

    /// The readiness poll a bot loop sends before each decision.
    pub fn poll(self) -> &'static [u8] {
        match self {
            Self::Stream => b"HELLO\n",
            Self::Datagram => b"HELLO",
        }
    }

    /// Frames one request for this contract.
    pub fn encode_request(
        self,
        request: &ApiRequest,
    ) -> Result<Vec<u8>, ProtocolError> {
        request.validate()?;
        match self {
            Self::Stream => JsonCodec.encode_line(request),
            Self::Datagram => JsonCodec.encode(request),
        }
    }

    /// Validates and frames one bot action for this contract.
    pub fn encode_action(
        self,
        action: &ActionSchema,
    ) -> Result<Vec<u8>, ProtocolError> {
        action.validate()?;
        match self {
            Self::Stream => JsonCodec.encode_line(action),
            Self::Datagram => Ok(action.encode_pipe()?.into_bytes()),
        }
    }

    /// Parses an action in this contract's form.
    pub fn decode_action(
        self,
        data: &[u8],
    ) -> Result<ActionSchema, ProtocolError> {
        let action: ActionSchema = match self {
            Self::Stream => JsonCodec.decode(data)?,
            Self::Datagram => {
                let text = std::str::from_utf8(data).map_err(|e| {
                    ProtocolError::InvalidMessage(format!(
                        "action is not UTF-8: {e}"
                    ))
                })?;
                ActionSchema::decode_pipe(text)?
            }
        };
        action.validate()?;
        Ok(action)
    }
}

impl fmt::Display for WireContract {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stream => write!(f, "stream/v{}", self.version()),
            Self::Datagram => write!(f, "datagram/v{}", self.version()),
        }
    }
}

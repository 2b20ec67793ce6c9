//! Codec trait and the JSON implementation.
//!
//! A "codec" (coder/decoder) converts between Rust values and raw bytes.
//! Framing is a separate concern: the stream transport terminates every
//! outgoing message with `\n`, which [`Codec::encode_line`] takes care of,
//! while replies are read as one whole JSON object per receive.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust values to bytes and decode bytes back.
///
/// `Send + Sync + 'static` so a codec can live inside a client that is
/// moved across tasks.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or
    /// don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;

    /// Serializes a value and appends the newline frame terminator.
    fn encode_line<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        let mut bytes = self.encode(value)?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`), the only format the
/// peer speaks.
///
/// ## Example
///
/// ```rust
/// use balatrobot_protocol::{ApiRequest, Codec, JsonCodec};
///
/// let codec = JsonCodec;
/// let request = ApiRequest::new("get_game_state", serde_json::json!({})).unwrap();
///
/// let bytes = codec.encode_line(&request).unwrap();
/// assert_eq!(bytes.last(), Some(&b'\n'));
///
/// let decoded: ApiRequest = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, request);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        // Surrounding whitespace, including the frame terminator, is
        // accepted by serde_json.
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_encode_line_appends_single_newline() {
        let bytes = JsonCodec.encode_line(&json!({"name": "x"})).unwrap();
        assert_eq!(bytes, b"{\"name\":\"x\"}\n");
    }

    #[test]
    fn test_decode_tolerates_trailing_newline() {
        let value: Value = JsonCodec.decode(b"{\"state\":1}\n").unwrap();
        assert_eq!(value["state"], 1);
    }

    #[test]
    fn test_decode_non_json_is_decode_error() {
        let result: Result<Value, _> = JsonCodec.decode(b"not json at all");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}

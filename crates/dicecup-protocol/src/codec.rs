//! Codec trait and implementations for serializing/deserializing values.
//!
//! The store encodes each game record with a codec, and the observer
//! server encodes each event with one before writing it to a socket.
//! Neither cares HOW the bytes look — they only need something that
//! implements [`Codec`].

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust values to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because a codec lives inside long-lived shared
/// state (the store, the server) that Tokio tasks touch from any thread.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Observers are browsers, so events go out as JSON text. The in-memory
/// store uses the same codec for its records, which keeps a stored game
/// and a `score` event byte-compatible.
///
/// This is behind the `json` feature flag (enabled by default).
///
/// ## Example
///
/// ```rust
/// use dicecup_protocol::{Codec, JsonCodec, SessionId};
///
/// let codec = JsonCodec;
/// let id = SessionId::new("ab12");
///
/// let bytes = codec.encode(&id).unwrap();
/// assert_eq!(bytes, b"\"ab12\"");
///
/// let decoded: SessionId = codec.decode(&bytes).unwrap();
/// assert_eq!(decoded, id);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(all(test, feature = "json"))]
mod tests {
    use super::*;
    use crate::UserId;

    #[test]
    fn test_decode_garbage_returns_decode_error() {
        let result: Result<UserId, _> = JsonCodec.decode(b"not json");
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }

    #[test]
    fn test_decode_wrong_shape_returns_decode_error() {
        // A user id is a plain string, not an object.
        let result: Result<UserId, _> =
            JsonCodec.decode(br#"{"user":"alice"}"#);
        assert!(matches!(result, Err(ProtocolError::Decode(_))));
    }
}

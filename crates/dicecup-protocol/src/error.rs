//! Error types for the protocol layer.
//!
//! Each crate in Dicecup defines its own error enum. A `ProtocolError`
//! always means the problem is in turning values into bytes or back, never
//! in locking, game rules, or networking.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust value into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust value).
    ///
    /// Common causes: a truncated record, or a record written by an
    /// incompatible version of the game model.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A value passed deserialization but is not acceptable, e.g. an
    /// empty session id.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

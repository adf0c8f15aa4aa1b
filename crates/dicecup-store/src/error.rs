//! Error types for the store layer.

use std::time::Duration;

use dicecup_protocol::{ProtocolError, SessionId};

/// Errors that can occur while loading, saving, or locking a session.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record exists for the session id.
    ///
    /// Kept distinct from every other failure so callers can tell
    /// "this session never existed" from "try again".
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// The lock could not be acquired within the configured timeout.
    #[error("timed out after {timeout:?} waiting for the lock on session {session_id}")]
    LockTimeout {
        session_id: SessionId,
        timeout: Duration,
    },

    /// A stored record could not be encoded or decoded.
    #[error(transparent)]
    Codec(#[from] ProtocolError),

    /// The backing storage cannot serve requests (e.g. a poisoned map).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns `true` if the session does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

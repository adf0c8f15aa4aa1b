//! Error types for the event layer.

use dicecup_protocol::{ObserverId, SessionId};

/// Errors that can occur while registering a subscriber.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BusError {
    /// The observer already has a live subscription to this session.
    #[error("observer {observer} already subscribed to session {session_id}")]
    AlreadySubscribed {
        session_id: SessionId,
        observer: ObserverId,
    },
}

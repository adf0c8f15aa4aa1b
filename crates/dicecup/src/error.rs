//! Unified error type for Dicecup.

use dicecup_events::BusError;
use dicecup_game::GameError;
use dicecup_protocol::ProtocolError;
use dicecup_store::StoreError;
use dicecup_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically. Use [`class`](Self::class) to map an error onto a
/// transport status.
#[derive(Debug, thiserror::Error)]
pub enum DicecupError {
    /// A transition was rejected by the game rules.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Loading, saving, or locking failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An observer could not be registered.
    #[error(transparent)]
    Bus(#[from] BusError),

    /// A transport-level error (connection, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// An encode or decode failure outside the store.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Every generated session id collided with an existing session.
    #[error("no free session id after {attempts} attempts")]
    SessionIdsExhausted { attempts: usize },
}

/// How a caller should treat a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Malformed input. Nothing was attempted.
    Validation,
    /// Well-formed request, wrong game state. Nothing changed.
    Precondition,
    /// The session does not exist.
    NotFound,
    /// Store, lock, codec, or transport failure. Retrying may help.
    Infrastructure,
}

impl DicecupError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Game(e) if e.is_validation() => ErrorClass::Validation,
            Self::Game(_) | Self::Bus(_) => ErrorClass::Precondition,
            Self::Store(StoreError::NotFound(_)) => ErrorClass::NotFound,
            Self::Store(_)
            | Self::Transport(_)
            | Self::Protocol(_)
            | Self::SessionIdsExhausted { .. } => ErrorClass::Infrastructure,
        }
    }

    /// Returns `true` if the session does not exist.
    pub fn is_not_found(&self) -> bool {
        self.class() == ErrorClass::NotFound
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use dicecup_game::Category;
    use dicecup_protocol::{ObserverId, SessionId};

    use super::*;

    #[test]
    fn test_from_game_error() {
        let err: DicecupError = GameError::GameOver.into();
        assert!(matches!(err, DicecupError::Game(_)));
        assert_eq!(err.to_string(), "game is over");
    }

    #[test]
    fn test_from_transport_error() {
        let err: DicecupError = TransportError::ConnectionClosed("gone".into()).into();
        assert!(matches!(err, DicecupError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_class_validation() {
        let err: DicecupError = GameError::InvalidDiceIndex(7).into();
        assert_eq!(err.class(), ErrorClass::Validation);
        let err: DicecupError = GameError::UnknownCategory("nope".into()).into();
        assert_eq!(err.class(), ErrorClass::Validation);
    }

    #[test]
    fn test_class_precondition() {
        for err in [
            GameError::NoMoreRolls,
            GameError::CategoryUsed(Category::Chance),
            GameError::AlreadyStarted,
            GameError::WrongCategory {
                expected: Category::Ones,
                actual: Category::Twos,
            },
        ] {
            assert_eq!(DicecupError::from(err).class(), ErrorClass::Precondition);
        }
        let err: DicecupError = BusError::AlreadySubscribed {
            session_id: SessionId::new("ab12"),
            observer: ObserverId(1),
        }
        .into();
        assert_eq!(err.class(), ErrorClass::Precondition);
    }

    #[test]
    fn test_class_not_found_is_distinct() {
        let err: DicecupError = StoreError::NotFound(SessionId::new("ab12")).into();
        assert_eq!(err.class(), ErrorClass::NotFound);
        assert!(err.is_not_found());
    }

    #[test]
    fn test_class_infrastructure() {
        let err: DicecupError = StoreError::LockTimeout {
            session_id: SessionId::new("ab12"),
            timeout: Duration::from_secs(1),
        }
        .into();
        assert_eq!(err.class(), ErrorClass::Infrastructure);
        let err: DicecupError = StoreError::Unavailable("down".into()).into();
        assert_eq!(err.class(), ErrorClass::Infrastructure);
        assert!(!err.is_not_found());
    }
}

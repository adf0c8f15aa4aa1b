//! Error types for the game layer.

use dicecup_protocol::UserId;

use crate::Category;

/// Reasons a transition was rejected.
///
/// Every variant leaves the game exactly as it was loaded. Most are
/// precondition failures (the request was well-formed but the game is in
/// the wrong state for it); [`GameError::is_validation`] picks out the
/// ones caused by malformed input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    /// Somebody already scored, so the seating is fixed.
    #[error("game already started")]
    AlreadyStarted,

    /// The user is already seated in this game.
    #[error("{0} already joined")]
    AlreadyJoined(UserId),

    /// A turn action was requested before anyone joined.
    #[error("no players joined")]
    NoPlayers,

    /// The acting user is not the player whose turn it is.
    #[error("another player's turn: expected {expected}, got {actual}")]
    NotYourTurn { expected: UserId, actual: UserId },

    /// All rounds have been played.
    #[error("game is over")]
    GameOver,

    /// The roll budget for this turn is spent.
    #[error("no more rolls")]
    NoMoreRolls,

    /// Locking and scoring need at least one roll in the current turn.
    #[error("roll first")]
    RollFirst,

    /// The acting player already has an entry for this category.
    #[error("category {0} is already used")]
    CategoryUsed(Category),

    /// The ordered-categories variant mandates another category this round.
    #[error("invalid category {actual}: round requires {expected}")]
    WrongCategory { expected: Category, actual: Category },

    /// The scoring policy has no rule for this category.
    #[error("category {0} cannot be scored")]
    NotScorable(Category),

    /// Dice index outside `0..DICE_COUNT`.
    #[error("invalid dice index {0}")]
    InvalidDiceIndex(usize),

    /// The category token does not name a category.
    #[error("unknown category {0:?}")]
    UnknownCategory(String),

    /// The feature token does not name a feature.
    #[error("unknown feature {0:?}")]
    UnknownFeature(String),
}

impl GameError {
    /// Returns `true` for errors caused by malformed input rather than by
    /// the state of the game.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidDiceIndex(_)
                | Self::UnknownCategory(_)
                | Self::UnknownFeature(_)
        )
    }
}

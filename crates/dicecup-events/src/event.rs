//! Event records and their payloads.

use dicecup_game::{Dice, DICE_COUNT, Game, Player};
use dicecup_protocol::{SessionId, UserId};
use serde::{Deserialize, Serialize};

/// One accepted mutation of one session.
///
/// On the wire the payload is flattened next to the envelope fields:
///
/// ```json
/// {"session_id":"ab12","user":"alice","seq":3,
///  "kind":"roll","payload":{"dice":[...],"roll_count":1}}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub session_id: SessionId,
    /// The acting user, `None` for system-originated events.
    pub user: Option<UserId>,
    /// Position of this event in its session's publish order, starting at 1.
    pub seq: u64,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        self.payload.kind()
    }
}

/// The kind-specific snapshot carried by an [`Event`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "snake_case")]
pub enum EventPayload {
    Join(JoinChanges),
    Roll(RollChanges),
    Lock(LockChanges),
    /// The full game after the score was recorded.
    Score(Box<Game>),
}

impl EventPayload {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Join(_) => EventKind::Join,
            Self::Roll(_) => EventKind::Roll,
            Self::Lock(_) => EventKind::Lock,
            Self::Score(_) => EventKind::Score,
        }
    }
}

impl From<JoinChanges> for EventPayload {
    fn from(changes: JoinChanges) -> Self {
        Self::Join(changes)
    }
}

impl From<RollChanges> for EventPayload {
    fn from(changes: RollChanges) -> Self {
        Self::Roll(changes)
    }
}

impl From<LockChanges> for EventPayload {
    fn from(changes: LockChanges) -> Self {
        Self::Lock(changes)
    }
}

impl From<Game> for EventPayload {
    fn from(game: Game) -> Self {
        Self::Score(Box::new(game))
    }
}

/// Discriminant of an [`EventPayload`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Join,
    Roll,
    Lock,
    Score,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Join => "join",
            Self::Roll => "roll",
            Self::Lock => "lock",
            Self::Score => "score",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Changes
// ---------------------------------------------------------------------------

/// Roster after a successful join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinChanges {
    pub players: Vec<Player>,
}

/// Dice and roll budget after a roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollChanges {
    pub dice: [Dice; DICE_COUNT],
    pub roll_count: u8,
}

/// Dice after a lock toggle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockChanges {
    pub dice: [Dice; DICE_COUNT],
}

impl JoinChanges {
    pub fn from_game(game: &Game) -> Self {
        Self {
            players: game.players.clone(),
        }
    }
}

impl RollChanges {
    pub fn from_game(game: &Game) -> Self {
        Self {
            dice: game.dice,
            roll_count: game.roll_count,
        }
    }
}

impl LockChanges {
    pub fn from_game(game: &Game) -> Self {
        Self { dice: game.dice }
    }
}

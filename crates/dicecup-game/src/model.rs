//! The game aggregate and its fixed vocabularies.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use dicecup_protocol::UserId;
use serde::{Deserialize, Serialize};

use crate::GameError;

/// Number of dice in a game.
pub const DICE_COUNT: usize = 5;

/// Rolls allowed per turn.
pub const MAX_ROLLS: u8 = 3;

/// Rounds in a game: one per category.
pub const ROUNDS: usize = Category::ALL.len();

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// A line on the score sheet.
///
/// The declaration order is the fixed category ordering: under the
/// [`Feature::Ordered`] variant, round `n` must be scored into
/// `Category::ALL[n]`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Ones,
    Twos,
    Threes,
    Fours,
    Fives,
    Sixes,
    ThreeOfAKind,
    FourOfAKind,
    FullHouse,
    SmallStraight,
    LargeStraight,
    Yahtzee,
    Chance,
}

impl Category {
    /// Every category, in round order.
    pub const ALL: [Category; 13] = [
        Self::Ones,
        Self::Twos,
        Self::Threes,
        Self::Fours,
        Self::Fives,
        Self::Sixes,
        Self::ThreeOfAKind,
        Self::FourOfAKind,
        Self::FullHouse,
        Self::SmallStraight,
        Self::LargeStraight,
        Self::Yahtzee,
        Self::Chance,
    ];

    /// The category assigned to `round` by the ordered variant, or `None`
    /// once the game is over.
    pub fn for_round(round: usize) -> Option<Self> {
        Self::ALL.get(round).copied()
    }

    /// Returns `true` for ones through sixes.
    pub fn is_upper(&self) -> bool {
        matches!(
            self,
            Self::Ones
                | Self::Twos
                | Self::Threes
                | Self::Fours
                | Self::Fives
                | Self::Sixes
        )
    }

    /// The wire token, e.g. `"full-house"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ones => "ones",
            Self::Twos => "twos",
            Self::Threes => "threes",
            Self::Fours => "fours",
            Self::Fives => "fives",
            Self::Sixes => "sixes",
            Self::ThreeOfAKind => "three-of-a-kind",
            Self::FourOfAKind => "four-of-a-kind",
            Self::FullHouse => "full-house",
            Self::SmallStraight => "small-straight",
            Self::LargeStraight => "large-straight",
            Self::Yahtzee => "yahtzee",
            Self::Chance => "chance",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = GameError;

    /// Parses a wire token. Surrounding whitespace is ignored because the
    /// token usually arrives as a raw request body.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == token)
            .ok_or_else(|| GameError::UnknownCategory(token.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Feature
// ---------------------------------------------------------------------------

/// An opt-in rule variant, fixed at session creation.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Feature {
    /// Each round must be scored into the category the round mandates.
    Ordered,
    /// A yahtzee rolled after yahtzee was scored for 50 earns 100 extra.
    YahtzeeBonus,
}

impl Feature {
    /// Every supported feature.
    pub const ALL: [Feature; 2] = [Self::Ordered, Self::YahtzeeBonus];

    /// The wire token, e.g. `"yahtzee-bonus"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ordered => "ordered",
            Self::YahtzeeBonus => "yahtzee-bonus",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == token)
            .ok_or_else(|| GameError::UnknownFeature(token.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Bonus
// ---------------------------------------------------------------------------

/// Auxiliary score tallies written by policy hooks, kept apart from the
/// write-once score sheet.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Bonus {
    /// Awarded at game end when ones through sixes reach the threshold.
    UpperSection,
    /// Accumulates for every extra yahtzee.
    Yahtzee,
}

// ---------------------------------------------------------------------------
// Dice
// ---------------------------------------------------------------------------

/// One die: a face value and whether it is held across rolls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dice {
    /// Face value, 1 through 6.
    pub value: u8,
    /// Held dice keep their value when the others are rolled.
    pub locked: bool,
}

impl Default for Dice {
    fn default() -> Self {
        Self {
            value: 1,
            locked: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// A seated player and their score sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Who this seat belongs to.
    pub user: UserId,

    /// Recorded scores. An entry, once written, is never changed.
    pub score_sheet: BTreeMap<Category, u32>,

    /// Bonus tallies maintained by scoring hooks.
    #[serde(default)]
    pub bonuses: BTreeMap<Bonus, u32>,
}

impl Player {
    /// Creates a player with an empty sheet.
    pub fn new(user: UserId) -> Self {
        Self {
            user,
            score_sheet: BTreeMap::new(),
            bonuses: BTreeMap::new(),
        }
    }

    /// Returns `true` if `category` already has an entry.
    pub fn has_scored(&self, category: Category) -> bool {
        self.score_sheet.contains_key(&category)
    }

    /// Sum of ones through sixes.
    pub fn upper_total(&self) -> u32 {
        self.score_sheet
            .iter()
            .filter(|(c, _)| c.is_upper())
            .map(|(_, s)| *s)
            .sum()
    }

    /// Sheet plus bonuses.
    pub fn total(&self) -> u32 {
        self.score_sheet.values().sum::<u32>()
            + self.bonuses.values().sum::<u32>()
    }
}

// ---------------------------------------------------------------------------
// Game
// ---------------------------------------------------------------------------

/// The aggregate root for one session.
///
/// Mutated only through [`crate::rules`]. Invariants kept by those
/// transitions:
///
/// - `current_player < players.len()` whenever there are players;
/// - `roll_count <= MAX_ROLLS`, reset to 0 by every score;
/// - dice are locked only between a roll and the next score;
/// - `round` only grows, and reaches [`ROUNDS`] exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// Seats in join order, which is also turn order.
    pub players: Vec<Player>,

    /// The five dice.
    pub dice: [Dice; DICE_COUNT],

    /// Index into `players` of whoever acts next.
    pub current_player: usize,

    /// Completed full cycles of turns.
    pub round: usize,

    /// Rolls taken in the current turn.
    pub roll_count: u8,

    /// Rule variants enabled for this game.
    #[serde(default)]
    pub features: BTreeSet<Feature>,
}

impl Game {
    /// Creates an empty game with the given variants enabled.
    pub fn new(features: impl IntoIterator<Item = Feature>) -> Self {
        Self {
            players: Vec::new(),
            dice: [Dice::default(); DICE_COUNT],
            current_player: 0,
            round: 0,
            roll_count: 0,
            features: features.into_iter().collect(),
        }
    }

    /// Returns `true` if `feature` is enabled.
    pub fn has_feature(&self, feature: Feature) -> bool {
        self.features.contains(&feature)
    }

    /// Returns `true` once all rounds have been played.
    pub fn is_over(&self) -> bool {
        self.round >= ROUNDS
    }

    /// Returns `true` once the seating is fixed.
    pub fn has_started(&self) -> bool {
        self.round > 0 || self.current_player > 0
    }

    /// The player whose turn it is, if anyone has joined.
    pub fn current(&self) -> Option<&Player> {
        self.players.get(self.current_player)
    }

    /// Mutable access to the current player.
    pub fn current_mut(&mut self) -> Option<&mut Player> {
        self.players.get_mut(self.current_player)
    }

    /// Looks up a seat by user.
    pub fn player(&self, user: &UserId) -> Option<&Player> {
        self.players.iter().find(|p| &p.user == user)
    }

    /// Current face values, in dice order.
    pub fn dice_values(&self) -> [u8; DICE_COUNT] {
        self.dice.map(|d| d.value)
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new([])
    }
}

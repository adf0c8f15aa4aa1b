//! Game model and turn state machine for Dicecup.
//!
//! Everything in this crate is synchronous and side-effect free apart from
//! the injected capabilities: the caller hands in the freshly loaded
//! [`Game`], the acting user, a [`DiceRoller`] and a [`ScoringPolicy`], and
//! gets back either the mutated game or a [`GameError`] with the game left
//! untouched.
//!
//! # Key types
//!
//! - [`Game`], [`Player`], [`Dice`] — the aggregate and its parts
//! - [`Category`], [`Feature`], [`Bonus`] — fixed vocabularies
//! - [`rules`] — `join`, `roll`, `toggle_lock`, `score`, `hints`
//! - [`ScoringPolicy`] / [`ScoringTable`] — pluggable category arithmetic
//!   and pre-score / post-score / post-game hooks
//! - [`DiceRoller`] — injected randomness

mod error;
mod model;
mod roller;
pub mod rules;
mod scoring;

pub use error::GameError;
pub use model::{Bonus, Category, DICE_COUNT, Dice, Feature, Game, MAX_ROLLS, Player, ROUNDS};
pub use roller::{DiceRoller, RandomRoller, ScriptedRoller};
pub use scoring::{Hook, ScoreFn, ScoringPolicy, ScoringTable};

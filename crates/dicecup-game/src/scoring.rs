//! The `ScoringPolicy` trait and the standard scoring table.
//!
//! The state machine decides WHEN a category may be scored; the policy
//! decides HOW MUCH it is worth and what bookkeeping happens around it.
//! Swapping the policy changes the arithmetic and the bonus rules without
//! touching [`rules`](crate::rules).

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::{Bonus, Category, Feature, Game};

/// Upper-section threshold for the upper bonus.
const UPPER_BONUS_THRESHOLD: u32 = 63;
const UPPER_BONUS: u32 = 35;
const YAHTZEE_SCORE: u32 = 50;
const YAHTZEE_BONUS: u32 = 100;

/// Scores one category from the current game (in practice, its dice).
pub type ScoreFn = fn(&Game) -> u32;

/// A side-effecting adjustment run around scoring, e.g. a bonus tally.
pub type Hook = Arc<dyn Fn(&mut Game) + Send + Sync>;

/// Pluggable category arithmetic and scoring hooks.
///
/// The score transition calls, in order: [`pre_score`](Self::pre_score),
/// [`score`](Self::score), [`post_score`](Self::post_score), and, when
/// that score ends the game, [`post_game`](Self::post_game) exactly once.
/// Hooks see the game with the current player still seated as current.
pub trait ScoringPolicy: Send + Sync + 'static {
    /// The categories this policy can score.
    fn categories(&self) -> Vec<Category>;

    /// What `category` would be worth for `game` right now, or `None` if
    /// the policy has no rule for it.
    fn score(&self, category: Category, game: &Game) -> Option<u32>;

    /// Runs before the score is computed. Default: no-op.
    fn pre_score(&self, _game: &mut Game) {}

    /// Runs after the score is written. Default: no-op.
    fn post_score(&self, _game: &mut Game) {}

    /// Runs once after the final round is scored. Default: no-op.
    fn post_game(&self, _game: &mut Game) {}
}

// ---------------------------------------------------------------------------
// ScoringTable
// ---------------------------------------------------------------------------

/// A strategy table: one scoring function per category plus ordered hook
/// lists.
///
/// ```rust
/// use std::sync::Arc;
/// use dicecup_game::{Category, Game, ScoringPolicy, ScoringTable};
///
/// let table = ScoringTable::standard()
///     .with_post_score_hook(Arc::new(|_game: &mut Game| {}));
/// assert_eq!(table.categories().len(), 13);
/// assert_eq!(table.score(Category::Chance, &Game::default()), Some(5));
/// ```
#[derive(Clone, Default)]
pub struct ScoringTable {
    actions: BTreeMap<Category, ScoreFn>,
    pre_score: Vec<Hook>,
    post_score: Vec<Hook>,
    post_game: Vec<Hook>,
}

impl ScoringTable {
    /// An empty table: scores nothing, runs no hooks.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Standard Yahtzee scoring.
    ///
    /// Hooks: the extra-yahtzee bonus before scoring (only when
    /// [`Feature::YahtzeeBonus`] is enabled) and the upper-section bonus
    /// after the last round.
    pub fn standard() -> Self {
        Self::empty()
            .with_category(Category::Ones, |g| upper(g, 1))
            .with_category(Category::Twos, |g| upper(g, 2))
            .with_category(Category::Threes, |g| upper(g, 3))
            .with_category(Category::Fours, |g| upper(g, 4))
            .with_category(Category::Fives, |g| upper(g, 5))
            .with_category(Category::Sixes, |g| upper(g, 6))
            .with_category(Category::ThreeOfAKind, |g| of_a_kind(g, 3))
            .with_category(Category::FourOfAKind, |g| of_a_kind(g, 4))
            .with_category(Category::FullHouse, full_house)
            .with_category(Category::SmallStraight, small_straight)
            .with_category(Category::LargeStraight, large_straight)
            .with_category(Category::Yahtzee, yahtzee)
            .with_category(Category::Chance, chance)
            .with_pre_score_hook(Arc::new(yahtzee_bonus))
            .with_post_game_hook(Arc::new(upper_section_bonus))
    }

    /// Sets the scoring function for `category`.
    pub fn with_category(mut self, category: Category, f: ScoreFn) -> Self {
        self.actions.insert(category, f);
        self
    }

    /// Appends a pre-score hook.
    pub fn with_pre_score_hook(mut self, hook: Hook) -> Self {
        self.pre_score.push(hook);
        self
    }

    /// Appends a post-score hook.
    pub fn with_post_score_hook(mut self, hook: Hook) -> Self {
        self.post_score.push(hook);
        self
    }

    /// Appends a post-game hook.
    pub fn with_post_game_hook(mut self, hook: Hook) -> Self {
        self.post_game.push(hook);
        self
    }
}

impl ScoringPolicy for ScoringTable {
    fn categories(&self) -> Vec<Category> {
        self.actions.keys().copied().collect()
    }

    fn score(&self, category: Category, game: &Game) -> Option<u32> {
        self.actions.get(&category).map(|f| f(game))
    }

    fn pre_score(&self, game: &mut Game) {
        for hook in &self.pre_score {
            hook(game);
        }
    }

    fn post_score(&self, game: &mut Game) {
        for hook in &self.post_score {
            hook(game);
        }
    }

    fn post_game(&self, game: &mut Game) {
        for hook in &self.post_game {
            hook(game);
        }
    }
}

impl fmt::Debug for ScoringTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScoringTable")
            .field("categories", &self.actions.keys().collect::<Vec<_>>())
            .field("pre_score", &self.pre_score.len())
            .field("post_score", &self.post_score.len())
            .field("post_game", &self.post_game.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Category arithmetic
// ---------------------------------------------------------------------------

/// How many dice show each face; index 0 is unused.
fn face_counts(game: &Game) -> [u8; 7] {
    let mut counts = [0u8; 7];
    for value in game.dice_values() {
        if (1..=6).contains(&value) {
            counts[value as usize] += 1;
        }
    }
    counts
}

fn dice_sum(game: &Game) -> u32 {
    game.dice_values().iter().map(|&v| v as u32).sum()
}

fn upper(game: &Game, face: u8) -> u32 {
    game.dice_values()
        .iter()
        .filter(|&&v| v == face)
        .map(|&v| v as u32)
        .sum()
}

fn of_a_kind(game: &Game, n: u8) -> u32 {
    if face_counts(game).iter().any(|&c| c >= n) {
        dice_sum(game)
    } else {
        0
    }
}

fn full_house(game: &Game) -> u32 {
    let counts = face_counts(game);
    let has_three = counts.contains(&3);
    let has_two = counts.contains(&2);
    if has_three && has_two { 25 } else { 0 }
}

/// Length of the longest run of consecutive faces.
fn longest_run(game: &Game) -> usize {
    let counts = face_counts(game);
    let mut best = 0;
    let mut run = 0;
    for face in 1..=6 {
        if counts[face] > 0 {
            run += 1;
            best = best.max(run);
        } else {
            run = 0;
        }
    }
    best
}

fn small_straight(game: &Game) -> u32 {
    if longest_run(game) >= 4 { 30 } else { 0 }
}

fn large_straight(game: &Game) -> u32 {
    if longest_run(game) >= 5 { 40 } else { 0 }
}

fn is_yahtzee(game: &Game) -> bool {
    face_counts(game).contains(&5)
}

fn yahtzee(game: &Game) -> u32 {
    if is_yahtzee(game) { YAHTZEE_SCORE } else { 0 }
}

fn chance(game: &Game) -> u32 {
    dice_sum(game)
}

// ---------------------------------------------------------------------------
// Hooks
// ---------------------------------------------------------------------------

/// Extra yahtzee: the current dice are a yahtzee and the current player
/// already scored yahtzee for the full 50.
fn yahtzee_bonus(game: &mut Game) {
    if !game.has_feature(Feature::YahtzeeBonus) || !is_yahtzee(game) {
        return;
    }
    if let Some(player) = game.current_mut() {
        if player.score_sheet.get(&Category::Yahtzee) == Some(&YAHTZEE_SCORE)
        {
            *player.bonuses.entry(Bonus::Yahtzee).or_default() +=
                YAHTZEE_BONUS;
        }
    }
}

fn upper_section_bonus(game: &mut Game) {
    for player in &mut game.players {
        if player.upper_total() >= UPPER_BONUS_THRESHOLD {
            player.bonuses.insert(Bonus::UpperSection, UPPER_BONUS);
        }
    }
}

#[cfg(test)]
mod tests {
    use dicecup_protocol::UserId;

    use super::*;
    use crate::{Dice, Player};

    fn game_with_dice(values: [u8; 5]) -> Game {
        let mut game = Game::new([]);
        game.dice = values.map(|value| Dice {
            value,
            locked: false,
        });
        game
    }

    fn score(category: Category, values: [u8; 5]) -> u32 {
        ScoringTable::standard()
            .score(category, &game_with_dice(values))
            .expect("standard table scores every category")
    }

    #[test]
    fn test_standard_table_covers_every_category() {
        assert_eq!(ScoringTable::standard().categories(), Category::ALL);
    }

    #[test]
    fn test_upper_categories_sum_matching_faces() {
        assert_eq!(score(Category::Ones, [1, 1, 2, 3, 4]), 2);
        assert_eq!(score(Category::Sixes, [6, 6, 6, 2, 6]), 24);
        assert_eq!(score(Category::Fives, [1, 2, 3, 4, 6]), 0);
    }

    #[test]
    fn test_of_a_kind_sums_all_dice() {
        assert_eq!(score(Category::ThreeOfAKind, [3, 3, 3, 5, 6]), 20);
        assert_eq!(score(Category::ThreeOfAKind, [3, 3, 2, 5, 6]), 0);
        assert_eq!(score(Category::FourOfAKind, [2, 2, 2, 2, 6]), 14);
        assert_eq!(score(Category::FourOfAKind, [2, 2, 2, 5, 6]), 0);
    }

    #[test]
    fn test_full_house_needs_three_and_two() {
        assert_eq!(score(Category::FullHouse, [2, 2, 5, 5, 5]), 25);
        assert_eq!(score(Category::FullHouse, [5, 5, 5, 5, 5]), 0);
        assert_eq!(score(Category::FullHouse, [1, 2, 5, 5, 5]), 0);
    }

    #[test]
    fn test_straights() {
        assert_eq!(score(Category::SmallStraight, [1, 2, 3, 4, 6]), 30);
        assert_eq!(score(Category::SmallStraight, [3, 4, 5, 6, 6]), 30);
        assert_eq!(score(Category::SmallStraight, [1, 2, 3, 5, 6]), 0);
        assert_eq!(score(Category::LargeStraight, [2, 3, 4, 5, 6]), 40);
        assert_eq!(score(Category::LargeStraight, [1, 2, 3, 4, 6]), 0);
    }

    #[test]
    fn test_yahtzee_and_chance() {
        assert_eq!(score(Category::Yahtzee, [4, 4, 4, 4, 4]), 50);
        assert_eq!(score(Category::Yahtzee, [4, 4, 4, 4, 3]), 0);
        assert_eq!(score(Category::Chance, [1, 2, 3, 4, 6]), 16);
    }

    #[test]
    fn test_empty_table_scores_nothing() {
        let table = ScoringTable::empty();
        assert!(table.categories().is_empty());
        assert_eq!(table.score(Category::Chance, &Game::default()), None);
    }

    #[test]
    fn test_yahtzee_bonus_hook_requires_feature() {
        let mut game = game_with_dice([6, 6, 6, 6, 6]);
        let mut player = Player::new(UserId::from("alice"));
        player.score_sheet.insert(Category::Yahtzee, 50);
        game.players.push(player);

        ScoringTable::standard().pre_score(&mut game);
        assert!(game.players[0].bonuses.is_empty());

        game.features.insert(Feature::YahtzeeBonus);
        ScoringTable::standard().pre_score(&mut game);
        ScoringTable::standard().pre_score(&mut game);
        assert_eq!(game.players[0].bonuses[&Bonus::Yahtzee], 200);
    }

    #[test]
    fn test_yahtzee_bonus_hook_skips_scratched_yahtzee() {
        let mut game = game_with_dice([6, 6, 6, 6, 6]);
        game.features.insert(Feature::YahtzeeBonus);
        let mut player = Player::new(UserId::from("alice"));
        player.score_sheet.insert(Category::Yahtzee, 0);
        game.players.push(player);

        ScoringTable::standard().pre_score(&mut game);
        assert!(game.players[0].bonuses.is_empty());
    }

    #[test]
    fn test_upper_section_bonus_applies_at_threshold() {
        let mut game = Game::new([]);
        let mut rich = Player::new(UserId::from("alice"));
        for (category, points) in
            [(Category::Fours, 16), (Category::Fives, 20), (Category::Sixes, 27)]
        {
            rich.score_sheet.insert(category, points);
        }
        let mut poor = Player::new(UserId::from("bob"));
        poor.score_sheet.insert(Category::Sixes, 30);
        game.players = vec![rich, poor];

        ScoringTable::standard().post_game(&mut game);

        assert_eq!(game.players[0].bonuses[&Bonus::UpperSection], 35);
        assert!(game.players[1].bonuses.is_empty());
    }

    #[test]
    fn test_hooks_run_in_insertion_order() {
        let table = ScoringTable::empty()
            .with_post_score_hook(Arc::new(|g: &mut Game| g.round = 1))
            .with_post_score_hook(Arc::new(|g: &mut Game| g.round *= 10));
        let mut game = Game::default();

        table.post_score(&mut game);

        assert_eq!(game.round, 10);
    }
}

//! Turn / round / category state machine.
//!
//! Each transition checks all of its preconditions before touching the
//! game, so an `Err` always means "nothing changed". Callers are expected
//! to run these against a game freshly loaded under the session lock.
//!
//! ```text
//!            join*           roll (≤3)          score
//! [empty] ─────────→ [turn] ─────────→ [rolled] ─────────→ next seat
//!                               ↑  │ toggle_lock            │
//!                               └──┘                        ▼
//!                                           round += 1 when seat wraps
//!                                           round == 13 → post-game hooks
//! ```

use std::collections::BTreeMap;

use dicecup_protocol::UserId;

use crate::{
    Category, DICE_COUNT, Dice, DiceRoller, Feature, Game, GameError, MAX_ROLLS, Player,
    ScoringPolicy,
};

/// Seats `user` at the end of the turn order.
///
/// # Errors
/// - [`GameError::AlreadyStarted`] once anyone has scored
/// - [`GameError::AlreadyJoined`] if `user` is already seated
pub fn join(game: &mut Game, user: UserId) -> Result<(), GameError> {
    if game.has_started() {
        return Err(GameError::AlreadyStarted);
    }
    if game.player(&user).is_some() {
        return Err(GameError::AlreadyJoined(user));
    }
    game.players.push(Player::new(user));
    Ok(())
}

/// Common turn preconditions: someone joined, it is `user`'s turn, and the
/// game is not over.
fn check_turn(game: &Game, user: &UserId) -> Result<(), GameError> {
    let current = game.current().ok_or(GameError::NoPlayers)?;
    if &current.user != user {
        return Err(GameError::NotYourTurn {
            expected: current.user.clone(),
            actual: user.clone(),
        });
    }
    if game.is_over() {
        return Err(GameError::GameOver);
    }
    Ok(())
}

/// Rolls every unlocked die.
///
/// Values are drawn from `roller` in dice order; locked dice keep their
/// value.
///
/// # Errors
/// [`GameError::NoPlayers`], [`GameError::NotYourTurn`],
/// [`GameError::GameOver`], [`GameError::NoMoreRolls`].
pub fn roll<R>(game: &mut Game, user: &UserId, roller: &R) -> Result<(), GameError>
where
    R: DiceRoller + ?Sized,
{
    check_turn(game, user)?;
    if game.roll_count >= MAX_ROLLS {
        return Err(GameError::NoMoreRolls);
    }

    for die in game.dice.iter_mut().filter(|d| !d.locked) {
        die.value = roller.roll();
    }
    game.roll_count += 1;
    Ok(())
}

/// Flips the lock on one die.
///
/// # Errors
/// [`GameError::InvalidDiceIndex`] first, then the turn preconditions,
/// [`GameError::RollFirst`] before the first roll of the turn, and
/// [`GameError::NoMoreRolls`] once the roll budget is spent (holding dice
/// is pointless then).
pub fn toggle_lock(game: &mut Game, user: &UserId, dice_index: usize) -> Result<(), GameError> {
    if dice_index >= DICE_COUNT {
        return Err(GameError::InvalidDiceIndex(dice_index));
    }
    check_turn(game, user)?;
    if game.roll_count == 0 {
        return Err(GameError::RollFirst);
    }
    if game.roll_count >= MAX_ROLLS {
        return Err(GameError::NoMoreRolls);
    }

    let die = &mut game.dice[dice_index];
    die.locked = !die.locked;
    Ok(())
}

/// Records `category` for the current player and passes the turn.
///
/// Returns the points written to the sheet.
///
/// # Errors
/// The turn preconditions, [`GameError::RollFirst`],
/// [`GameError::CategoryUsed`], [`GameError::WrongCategory`] (ordered
/// variant), [`GameError::NotScorable`].
pub fn score<P>(
    game: &mut Game,
    user: &UserId,
    category: Category,
    policy: &P,
) -> Result<u32, GameError>
where
    P: ScoringPolicy + ?Sized,
{
    check_turn(game, user)?;
    if game.roll_count == 0 {
        return Err(GameError::RollFirst);
    }
    if game.current().is_some_and(|p| p.has_scored(category)) {
        return Err(GameError::CategoryUsed(category));
    }
    if game.has_feature(Feature::Ordered) {
        if let Some(expected) = Category::for_round(game.round) {
            if expected != category {
                return Err(GameError::WrongCategory {
                    expected,
                    actual: category,
                });
            }
        }
    }
    if policy.score(category, game).is_none() {
        return Err(GameError::NotScorable(category));
    }

    policy.pre_score(game);

    // Pre-score hooks may have changed the game; score what they left.
    let points = policy.score(category, game).unwrap_or_default();
    if let Some(player) = game.current_mut() {
        player.score_sheet.insert(category, points);
    }

    policy.post_score(game);

    // Scoring clears the dice for the next seat.
    game.dice = [Dice::default(); DICE_COUNT];
    game.roll_count = 0;
    game.current_player = (game.current_player + 1) % game.players.len();
    if game.current_player == 0 {
        game.round += 1;
        if game.is_over() {
            policy.post_game(game);
        }
    }

    Ok(points)
}

/// What each scorable category would be worth right now.
///
/// Under the ordered variant, every category other than the one mandated
/// this round reports 0. Never modifies the game.
pub fn hints<P>(game: &Game, policy: &P) -> BTreeMap<Category, u32>
where
    P: ScoringPolicy + ?Sized,
{
    let mandated = if game.has_feature(Feature::Ordered) {
        Category::for_round(game.round)
    } else {
        None
    };

    policy
        .categories()
        .into_iter()
        .map(|category| {
            let points = match mandated {
                Some(expected) if expected != category => 0,
                _ => policy.score(category, game).unwrap_or_default(),
            };
            (category, points)
        })
        .collect()
}

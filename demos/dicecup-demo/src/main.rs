//! Dicecup demo: two bots play a full game while browsers watch.
//!
//! ```text
//! RUST_LOG=debug cargo run -p dicecup-demo
//! websocat ws://127.0.0.1:8080/<session id>/ws
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use dicecup::prelude::*;

const PLAYERS: [&str; 2] = ["alice", "bob"];

/// Indices of every die showing the most common face (highest face wins
/// ties).
fn dice_to_hold(dice: &[Dice]) -> Vec<usize> {
    let mut counts = [0usize; 7];
    for die in dice {
        counts[usize::from(die.value)] += 1;
    }
    // `max_by_key` keeps the last maximum, so ascending faces favour the highest.
    let Some(face) = (1..=6u8).max_by_key(|&face| counts[usize::from(face)]) else {
        return Vec::new();
    };
    dice.iter()
        .enumerate()
        .filter(|(_, die)| die.value == face)
        .map(|(index, _)| index)
        .collect()
}

/// The unused category with the best hint.
fn best_category(hints: &BTreeMap<Category, u32>, player: &Player) -> Option<Category> {
    hints
        .iter()
        .filter(|(category, _)| !player.has_scored(**category))
        .max_by_key(|(_, points)| **points)
        .map(|(category, _)| *category)
}

/// Plays one turn for `user`: roll, hold the most common face, reroll
/// twice, then score the best open category.
async fn play_turn<S, P, R>(
    controller: &SessionController<S, P, R>,
    id: &SessionId,
    user: &UserId,
    pause: Duration,
) -> Result<Category, DicecupError>
where
    S: SessionStore,
    P: ScoringPolicy,
    R: DiceRoller,
{
    let mut rolled = controller.roll(id, user).await?;
    while rolled.roll_count < MAX_ROLLS {
        let hold = dice_to_hold(&rolled.dice);
        for (index, die) in rolled.dice.iter().enumerate() {
            if die.locked != hold.contains(&index) {
                controller.toggle_lock(id, user, index).await?;
            }
        }
        tokio::time::sleep(pause).await;
        rolled = controller.roll(id, user).await?;
    }

    let game = controller.get(id).await?;
    let hints = controller.hints(id).await?;
    let category = game
        .player(user)
        .and_then(|player| best_category(&hints, player))
        .ok_or(GameError::GameOver)?;

    controller.score(id, user, category).await?;
    tokio::time::sleep(pause).await;
    Ok(category)
}

/// Plays rounds until the game is over and returns the final game.
async fn play_game<S, P, R>(
    controller: &SessionController<S, P, R>,
    id: &SessionId,
    pause: Duration,
) -> Result<Game, DicecupError>
where
    S: SessionStore,
    P: ScoringPolicy,
    R: DiceRoller,
{
    loop {
        let game = controller.get(id).await?;
        let Some(current) = game.current().filter(|_| !game.is_over()) else {
            return Ok(game);
        };
        let user = current.user.clone();
        let category = play_turn(controller, id, &user, pause).await?;
        tracing::debug!(session_id = %id, %user, %category, round = game.round, "turn played");
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dicecup::init_logging();

    let addr = std::env::var("DICECUP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let controller = Arc::new(SessionController::new());

    let server = ObserverServer::builder()
        .bind(&addr)
        .build(Arc::clone(&controller))
        .await?;
    let local = server.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = server.run().await {
            tracing::error!(error = %e, "observer server stopped");
        }
    });

    let id = controller.create([Feature::YahtzeeBonus]).await?;
    for name in PLAYERS {
        controller.join(&id, &UserId::from(name)).await?;
    }
    tracing::info!(url = %format!("ws://{local}/{id}/ws"), "connect an observer to watch");

    tokio::time::sleep(Duration::from_secs(3)).await;
    let game = play_game(&controller, &id, Duration::from_millis(300)).await?;

    for player in &game.players {
        tracing::info!(user = %player.user, total = player.total(), "final score");
    }

    tracing::info!("press ctrl-c to exit");
    tokio::signal::ctrl_c().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::StreamExt;
    use tokio_tungstenite::tungstenite::Message;

    fn dice(values: [u8; 5]) -> Vec<Dice> {
        values
            .into_iter()
            .map(|value| Dice {
                value,
                locked: false,
            })
            .collect()
    }

    #[test]
    fn test_dice_to_hold_picks_most_common_face() {
        assert_eq!(dice_to_hold(&dice([2, 5, 2, 6, 2])), vec![0, 2, 4]);
    }

    #[test]
    fn test_dice_to_hold_breaks_ties_high() {
        assert_eq!(dice_to_hold(&dice([1, 1, 4, 4, 3])), vec![2, 3]);
    }

    #[test]
    fn test_best_category_skips_used() {
        let mut player = Player::new(UserId::from("alice"));
        player.score_sheet.insert(Category::Yahtzee, 50);
        let hints = BTreeMap::from([
            (Category::Yahtzee, 50),
            (Category::Sixes, 30),
            (Category::Chance, 30),
        ]);
        let best = best_category(&hints, &player).unwrap();
        assert!(matches!(best, Category::Sixes | Category::Chance));
    }

    #[tokio::test]
    async fn test_play_game_finishes_every_round() {
        let controller = SessionController::with_parts(
            InMemoryStore::new(),
            Arc::new(EventBus::default()),
            ScoringTable::standard(),
            ScriptedRoller::new([3, 3, 5, 3, 1, 6, 3, 2]),
        );
        let id = controller.create([]).await.unwrap();
        for name in PLAYERS {
            controller.join(&id, &UserId::from(name)).await.unwrap();
        }

        let game = play_game(&controller, &id, Duration::ZERO).await.unwrap();

        assert!(game.is_over());
        for player in &game.players {
            assert_eq!(player.score_sheet.len(), 13);
        }
    }

    #[tokio::test]
    async fn test_observer_watches_demo_game() {
        let controller = Arc::new(SessionController::new());
        let server = ObserverServer::builder()
            .bind("127.0.0.1:0")
            .build(Arc::clone(&controller))
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.run());

        let id = controller.create([]).await.unwrap();
        let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/{id}/ws"))
            .await
            .unwrap();
        while controller.bus().subscriber_count(&id) == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        controller.join(&id, &UserId::from("alice")).await.unwrap();
        let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        let Message::Text(text) = frame else {
            panic!("expected a text frame, got {frame:?}");
        };
        let event: serde_json::Value = serde_json::from_str(text.as_str()).unwrap();
        assert_eq!(event["kind"], "join");
    }
}

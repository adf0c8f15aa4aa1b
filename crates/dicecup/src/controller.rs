//! `SessionController`: one request, one critical section.
//!
//! Every operation takes the session lock first. Mutating operations then
//! run the same sequence:
//!
//! ```text
//! lock → load → transition → save → publish → release
//! ```
//!
//! A rejected transition skips save and publish. A failed save skips
//! publish. The event is published before the guard drops, so the order of
//! events on a session is the order in which requests took its lock.
//!
//! Only stored sessions ever publish, so the bus keeps at most one sequence
//! counter per stored session. A lookup of an unknown id releases its lock
//! and asks the store to [`forget`](SessionStore::forget) the id.

use std::collections::BTreeMap;
use std::sync::Arc;

use dicecup_events::{EventBus, EventPayload, JoinChanges, LockChanges, RollChanges, Subscription};
use dicecup_game::{
    Category, DiceRoller, Feature, Game, GameError, RandomRoller, ScoringPolicy, ScoringTable,
    rules,
};
use dicecup_protocol::{ObserverId, SessionId, UserId};
use dicecup_store::{InMemoryStore, SessionGuard, SessionStore, StoreError};
use rand::Rng;

use crate::DicecupError;

/// Characters session ids are drawn from.
const SESSION_ID_CHARSET: &[u8] = b"abcdefghijklmnopqrstvwxyz0123456789";
/// Length of a generated session id.
const SESSION_ID_LEN: usize = 4;
/// Collisions tolerated before `create` gives up.
const SESSION_ID_ATTEMPTS: usize = 16;

/// Serializes requests per session and publishes what they change.
///
/// Cheap to share: wrap it in an `Arc` and hand a clone to every request
/// task and to the observer server.
pub struct SessionController<S = InMemoryStore, P = ScoringTable, R = RandomRoller> {
    store: S,
    bus: Arc<EventBus>,
    policy: P,
    roller: R,
}

impl SessionController {
    /// In-memory store, standard scoring, random dice, default bus.
    pub fn new() -> Self {
        Self::with_parts(
            InMemoryStore::new(),
            Arc::new(EventBus::default()),
            ScoringTable::standard(),
            RandomRoller,
        )
    }
}

impl Default for SessionController {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, P, R> SessionController<S, P, R>
where
    S: SessionStore,
    P: ScoringPolicy,
    R: DiceRoller,
{
    pub fn with_parts(store: S, bus: Arc<EventBus>, policy: P, roller: R) -> Self {
        Self {
            store,
            bus,
            policy,
            roller,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    // -----------------------------------------------------------------------
    // Sessions
    // -----------------------------------------------------------------------

    /// Creates an empty game with `features` under a fresh random id.
    pub async fn create(
        &self,
        features: impl IntoIterator<Item = Feature>,
    ) -> Result<SessionId, DicecupError> {
        let game = Game::new(features);

        for _ in 0..SESSION_ID_ATTEMPTS {
            let id = generate_session_id();
            let guard = self.store.lock(&id).await?;
            if self.store.exists(&id).await? {
                tracing::debug!(session_id = %id, "session id collision, retrying");
                continue;
            }
            self.store.save(&id, &game).await?;
            guard.release();

            tracing::info!(
                session_id = %id,
                features = ?game.features,
                "session created"
            );
            return Ok(id);
        }

        Err(DicecupError::SessionIdsExhausted {
            attempts: SESSION_ID_ATTEMPTS,
        })
    }

    /// Variants a session can be created with.
    pub fn features(&self) -> Vec<Feature> {
        Feature::ALL.to_vec()
    }

    /// A consistent snapshot of the game.
    pub async fn get(&self, id: &SessionId) -> Result<Game, DicecupError> {
        let (guard, game) = self.lock_and_load(id).await?;
        guard.release();
        Ok(game)
    }

    /// What each category would score for the current dice.
    pub async fn hints(&self, id: &SessionId) -> Result<BTreeMap<Category, u32>, DicecupError> {
        let game = self.get(id).await?;
        Ok(rules::hints(&game, &self.policy))
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Seats `user` in the game.
    pub async fn join(&self, id: &SessionId, user: &UserId) -> Result<JoinChanges, DicecupError> {
        let changes = self
            .mutate(id, user, "join", |game| {
                rules::join(game, user.clone())?;
                Ok(JoinChanges::from_game(game))
            })
            .await?;
        tracing::info!(
            session_id = %id,
            %user,
            players = changes.players.len(),
            "player joined"
        );
        Ok(changes)
    }

    /// Rolls the unlocked dice for the player whose turn it is.
    pub async fn roll(&self, id: &SessionId, user: &UserId) -> Result<RollChanges, DicecupError> {
        self.mutate(id, user, "roll", |game| {
            rules::roll(game, user, &self.roller)?;
            Ok(RollChanges::from_game(game))
        })
        .await
    }

    /// Flips the lock on die `dice_index`.
    pub async fn toggle_lock(
        &self,
        id: &SessionId,
        user: &UserId,
        dice_index: usize,
    ) -> Result<LockChanges, DicecupError> {
        self.mutate(id, user, "lock", |game| {
            rules::toggle_lock(game, user, dice_index)?;
            Ok(LockChanges::from_game(game))
        })
        .await
    }

    /// Scores `category` for the player whose turn it is and returns the
    /// whole game afterwards.
    pub async fn score(
        &self,
        id: &SessionId,
        user: &UserId,
        category: Category,
    ) -> Result<Game, DicecupError> {
        let mut points = 0;
        let game = self
            .mutate(id, user, "score", |game| {
                points = rules::score(game, user, category, &self.policy)?;
                Ok(game.clone())
            })
            .await?;
        tracing::info!(session_id = %id, %user, %category, points, "scored");

        if game.is_over() {
            let standings: Vec<(String, u32)> = game
                .players
                .iter()
                .map(|p| (p.user.to_string(), p.total()))
                .collect();
            tracing::info!(session_id = %id, ?standings, "game over");
        }
        Ok(game)
    }

    // -----------------------------------------------------------------------
    // Observers
    // -----------------------------------------------------------------------

    /// Registers `observer` for events of session `id`.
    ///
    /// Fails with a not-found error for unknown sessions.
    pub async fn subscribe(
        &self,
        id: &SessionId,
        observer: ObserverId,
    ) -> Result<Subscription, DicecupError> {
        let guard = self.store.lock(id).await?;
        if !self.store.exists(id).await? {
            guard.release();
            self.store.forget(id);
            return Err(StoreError::NotFound(id.clone()).into());
        }
        let subscription = self.bus.subscribe(id, observer)?;
        guard.release();
        Ok(subscription)
    }

    /// Removes `observer` from session `id`. Idempotent.
    pub fn unsubscribe(&self, id: &SessionId, observer: ObserverId) {
        self.bus.unsubscribe(id, observer);
    }

    // -----------------------------------------------------------------------
    // Critical section
    // -----------------------------------------------------------------------

    async fn mutate<T, F>(
        &self,
        id: &SessionId,
        user: &UserId,
        action: &'static str,
        transition: F,
    ) -> Result<T, DicecupError>
    where
        T: Clone + Into<EventPayload>,
        F: FnOnce(&mut Game) -> Result<T, GameError>,
    {
        let (guard, mut game) = self.lock_and_load(id).await?;

        let changes = transition(&mut game).inspect_err(|e| {
            tracing::debug!(session_id = %id, %user, action, error = %e, "request rejected");
        })?;

        self.store.save(id, &game).await.inspect_err(|e| {
            tracing::warn!(
                session_id = %id,
                %user,
                action,
                error = %e,
                "save failed, event dropped"
            );
        })?;

        self.bus.publish(id, Some(user), changes.clone());
        guard.release();
        Ok(changes)
    }

    /// Locks `id` and loads its game. An unknown id releases the lock and
    /// leaves no lock entry behind.
    async fn lock_and_load(&self, id: &SessionId) -> Result<(SessionGuard, Game), DicecupError> {
        let guard = self.store.lock(id).await?;
        match self.store.load(id).await {
            Ok(game) => Ok((guard, game)),
            Err(e) => {
                guard.release();
                if e.is_not_found() {
                    self.store.forget(id);
                }
                Err(e.into())
            }
        }
    }
}

impl<S, P, R> std::fmt::Debug for SessionController<S, P, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

fn generate_session_id() -> SessionId {
    let mut rng = rand::rng();
    let id: String = (0..SESSION_ID_LEN)
        .map(|_| char::from(SESSION_ID_CHARSET[rng.random_range(0..SESSION_ID_CHARSET.len())]))
        .collect();
    SessionId::new(id)
}

#[cfg(test)]
mod tests {
    use dicecup_game::ScriptedRoller;

    use super::*;

    fn scripted(
        values: impl IntoIterator<Item = u8>,
    ) -> SessionController<InMemoryStore, ScoringTable, ScriptedRoller> {
        SessionController::with_parts(
            InMemoryStore::new(),
            Arc::new(EventBus::default()),
            ScoringTable::standard(),
            ScriptedRoller::new(values),
        )
    }

    // =========================================================================
    // generate_session_id()
    // =========================================================================

    #[test]
    fn test_generate_session_id_uses_charset() {
        for _ in 0..100 {
            let id = generate_session_id();
            assert_eq!(id.as_str().len(), SESSION_ID_LEN);
            assert!(id.as_str().bytes().all(|b| SESSION_ID_CHARSET.contains(&b)));
        }
    }

    // =========================================================================
    // create() / get()
    // =========================================================================

    #[tokio::test]
    async fn test_create_saves_empty_game_with_features() {
        let controller = SessionController::new();
        let id = controller.create([Feature::Ordered]).await.unwrap();

        let game = controller.get(&id).await.unwrap();
        assert!(game.players.is_empty());
        assert_eq!(game.round, 0);
        assert!(game.has_feature(Feature::Ordered));
    }

    #[tokio::test]
    async fn test_create_gives_distinct_ids() {
        let controller = SessionController::new();
        let a = controller.create([]).await.unwrap();
        let b = controller.create([]).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_get_unknown_session_is_not_found() {
        let controller = SessionController::new();
        let err = controller.get(&SessionId::new("zzzz")).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_features_lists_every_variant() {
        let controller = SessionController::new();
        assert_eq!(controller.features(), Feature::ALL.to_vec());
    }

    // =========================================================================
    // mutate()
    // =========================================================================

    #[tokio::test]
    async fn test_rejected_transition_neither_saves_nor_publishes() {
        let controller = scripted([3]);
        let id = controller.create([]).await.unwrap();
        let alice = UserId::from("alice");
        controller.join(&id, &alice).await.unwrap();
        let mut sub = controller.subscribe(&id, ObserverId(1)).await.unwrap();
        let before = controller.get(&id).await.unwrap();

        let err = controller.toggle_lock(&id, &alice, 0).await.unwrap_err();
        assert!(matches!(err, DicecupError::Game(GameError::RollFirst)));

        assert_eq!(controller.get(&id).await.unwrap(), before);
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_accepted_transition_publishes_its_changes() {
        let controller = scripted([6]);
        let id = controller.create([]).await.unwrap();
        let alice = UserId::from("alice");
        let mut sub = controller.subscribe(&id, ObserverId(1)).await.unwrap();

        controller.join(&id, &alice).await.unwrap();
        let changes = controller.roll(&id, &alice).await.unwrap();

        let join = sub.recv().await.unwrap();
        let roll = sub.recv().await.unwrap();
        assert_eq!(join.user.as_ref(), Some(&alice));
        assert_eq!(roll.payload, EventPayload::Roll(changes));
        assert_eq!(roll.seq, 2);
    }

    // =========================================================================
    // subscribe()
    // =========================================================================

    #[tokio::test]
    async fn test_subscribe_unknown_session_is_not_found() {
        let controller = SessionController::new();
        let err = controller
            .subscribe(&SessionId::new("zzzz"), ObserverId(1))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(controller.bus().session_count(), 0);
    }

    #[tokio::test]
    async fn test_unsubscribe_twice_is_harmless() {
        let controller = SessionController::new();
        let id = controller.create([]).await.unwrap();
        let _sub = controller.subscribe(&id, ObserverId(1)).await.unwrap();

        controller.unsubscribe(&id, ObserverId(1));
        controller.unsubscribe(&id, ObserverId(1));
        assert_eq!(controller.bus().subscriber_count(&id), 0);
    }
}

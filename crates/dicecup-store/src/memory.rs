//! In-process `SessionStore`.

use std::collections::HashMap;
use std::sync::RwLock;

use dicecup_game::Game;
use dicecup_protocol::{Codec, JsonCodec, SessionId};

use crate::{LockTable, SessionGuard, SessionStore, StoreConfig, StoreError};

/// A [`SessionStore`] that keeps every record in a process-local map.
///
/// Records are stored encoded (through the codec `C`), so a load always
/// hands back a fresh copy and a caller mutating its game cannot leak
/// changes into the store without calling `save`.
pub struct InMemoryStore<C: Codec = JsonCodec> {
    records: RwLock<HashMap<SessionId, Vec<u8>>>,
    locks: LockTable,
    codec: C,
}

impl InMemoryStore<JsonCodec> {
    /// An empty JSON-backed store with default config.
    pub fn new() -> Self {
        Self::with_config(JsonCodec, StoreConfig::default())
    }
}

impl Default for InMemoryStore<JsonCodec> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Codec> InMemoryStore<C> {
    /// An empty store using `codec` for its records.
    pub fn with_config(codec: C, config: StoreConfig) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            locks: LockTable::new(config.lock_timeout),
            codec,
        }
    }

    /// Deletes the record for `id`, returning whether one existed.
    ///
    /// The lock entry is dropped too if no one is using it.
    pub fn remove(&self, id: &SessionId) -> Result<bool, StoreError> {
        let removed = self.write()?.remove(id).is_some();
        self.locks.forget(id);
        if removed {
            tracing::debug!(session_id = %id, "session record removed");
        }
        Ok(removed)
    }

    /// Number of stored sessions.
    pub fn len(&self) -> usize {
        self.read().map(|records| records.len()).unwrap_or(0)
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of session ids with a lock entry.
    pub fn lock_count(&self) -> usize {
        self.locks.len()
    }

    fn read(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<SessionId, Vec<u8>>>, StoreError> {
        self.records
            .read()
            .map_err(|_| StoreError::Unavailable("record map poisoned".into()))
    }

    fn write(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<SessionId, Vec<u8>>>, StoreError> {
        self.records
            .write()
            .map_err(|_| StoreError::Unavailable("record map poisoned".into()))
    }
}

impl<C: Codec> SessionStore for InMemoryStore<C> {
    async fn load(&self, id: &SessionId) -> Result<Game, StoreError> {
        let bytes = self
            .read()?
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        Ok(self.codec.decode(&bytes)?)
    }

    async fn save(&self, id: &SessionId, game: &Game) -> Result<(), StoreError> {
        let bytes = self.codec.encode(game)?;
        self.write()?.insert(id.clone(), bytes);
        tracing::trace!(session_id = %id, round = game.round, "session saved");
        Ok(())
    }

    async fn lock(&self, id: &SessionId) -> Result<SessionGuard, StoreError> {
        self.locks.acquire(id).await
    }

    async fn exists(&self, id: &SessionId) -> Result<bool, StoreError> {
        Ok(self.read()?.contains_key(id))
    }

    fn forget(&self, id: &SessionId) {
        let stored = self.read().map(|records| records.contains_key(id)).unwrap_or(true);
        if !stored && self.locks.forget(id) {
            tracing::trace!(session_id = %id, "lock entry for unknown session dropped");
        }
    }
}

impl<C: Codec> std::fmt::Debug for InMemoryStore<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("sessions", &self.len())
            .field("locks", &self.lock_count())
            .finish()
    }
}

//! The `SessionStore` trait.

use dicecup_game::Game;
use dicecup_protocol::SessionId;

use crate::{SessionGuard, StoreError};

/// Keyed persistence for games plus a per-session lock.
///
/// # Contract
///
/// - `load` fails with [`StoreError::NotFound`] when no record exists.
/// - `save` overwrites unconditionally (last writer wins).
/// - `lock` returns once no other guard for the same id is alive. Locks
///   for distinct ids never block each other. The returned
///   [`SessionGuard`] releases the lock when dropped, on every exit path.
/// - A lock request the storage cannot serve must come back as an error,
///   never as a caller blocked forever.
/// - `forget` may drop per-id bookkeeping (such as a lock entry) for an id
///   with no record. It must leave ids that are stored, locked or awaited
///   alone.
///
/// Implementations usually delegate `lock` to a [`LockTable`](crate::LockTable).
///
/// # Trait bounds
///
/// `Send + Sync + 'static` because one store is shared by every request
/// task for the lifetime of the server.
pub trait SessionStore: Send + Sync + 'static {
    /// Loads the game stored for `id`.
    fn load(
        &self,
        id: &SessionId,
    ) -> impl std::future::Future<Output = Result<Game, StoreError>> + Send;

    /// Stores `game` under `id`, replacing any previous record.
    fn save(
        &self,
        id: &SessionId,
        game: &Game,
    ) -> impl std::future::Future<Output = Result<(), StoreError>> + Send;

    /// Acquires the exclusive lock for `id`.
    fn lock(
        &self,
        id: &SessionId,
    ) -> impl std::future::Future<Output = Result<SessionGuard, StoreError>> + Send;

    /// Returns `true` if a record exists for `id`.
    ///
    /// The default loads and discards the record; stores that can answer
    /// without decoding should override it.
    fn exists(
        &self,
        id: &SessionId,
    ) -> impl std::future::Future<Output = Result<bool, StoreError>> + Send {
        async move {
            match self.load(id).await {
                Ok(_) => Ok(true),
                Err(StoreError::NotFound(_)) => Ok(false),
                Err(e) => Err(e),
            }
        }
    }

    /// Drops lock bookkeeping for `id` when it has no record.
    ///
    /// Callers invoke this after a lookup came back not-found, once their
    /// guard is gone, so probing unknown ids leaves nothing behind.
    fn forget(&self, _id: &SessionId) {}
}

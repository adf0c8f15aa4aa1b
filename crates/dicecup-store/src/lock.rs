//! Per-session mutual exclusion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dicecup_protocol::SessionId;
use tokio::sync::OwnedMutexGuard;

use crate::StoreError;

// ---------------------------------------------------------------------------
// SessionGuard
// ---------------------------------------------------------------------------

/// Proof that the caller holds the lock for one session.
///
/// Dropping the guard releases the lock. This happens on every exit path:
/// early `?` returns, panics unwinding through the holder, and cancelled
/// futures all drop the guard.
#[derive(Debug)]
pub struct SessionGuard {
    session_id: SessionId,
    acquired_at: Instant,
    _permit: OwnedMutexGuard<()>,
}

impl SessionGuard {
    /// The session this guard locks.
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    /// How long the lock has been held so far.
    pub fn held_for(&self) -> Duration {
        self.acquired_at.elapsed()
    }

    /// Releases the lock explicitly. Same as dropping the guard.
    pub fn release(self) {}
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        tracing::trace!(
            session_id = %self.session_id,
            held_us = self.acquired_at.elapsed().as_micros() as u64,
            "session lock released"
        );
    }
}

// ---------------------------------------------------------------------------
// LockTable
// ---------------------------------------------------------------------------

/// One async mutex per session id, created on first use.
///
/// Waiters on the same id are served in FIFO order (tokio's mutex is
/// fair). Ids never contend with each other: the table's own map lock is
/// only held long enough to look up or insert an entry, never across an
/// `.await`.
#[derive(Debug, Default)]
pub struct LockTable {
    locks: Mutex<HashMap<SessionId, Arc<tokio::sync::Mutex<()>>>>,
    timeout: Option<Duration>,
}

impl LockTable {
    /// Creates a table. `timeout` bounds how long [`acquire`](Self::acquire)
    /// waits; `None` waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Waits for exclusive access to `id`.
    pub async fn acquire(&self, id: &SessionId) -> Result<SessionGuard, StoreError> {
        let mutex = self.entry(id)?;

        let permit = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, mutex.lock_owned())
                .await
                .map_err(|_| {
                    tracing::warn!(session_id = %id, ?timeout, "session lock timed out");
                    StoreError::LockTimeout {
                        session_id: id.clone(),
                        timeout,
                    }
                })?,
            None => mutex.lock_owned().await,
        };

        tracing::trace!(session_id = %id, "session lock acquired");
        Ok(SessionGuard {
            session_id: id.clone(),
            acquired_at: Instant::now(),
            _permit: permit,
        })
    }

    /// Drops the table entry for `id` if nobody holds or awaits it.
    ///
    /// Returns `true` if an entry was removed.
    pub fn forget(&self, id: &SessionId) -> bool {
        let Ok(mut locks) = self.locks.lock() else {
            return false;
        };
        match locks.get(id) {
            // Only the table's own reference left: no holder, no waiter.
            Some(mutex) if Arc::strong_count(mutex) == 1 => {
                locks.remove(id);
                true
            }
            _ => false,
        }
    }

    /// Number of session ids with a lock entry.
    pub fn len(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }

    /// Returns `true` if no session has a lock entry.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entry(&self, id: &SessionId) -> Result<Arc<tokio::sync::Mutex<()>>, StoreError> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| StoreError::Unavailable("lock table poisoned".into()))?;
        Ok(Arc::clone(locks.entry(id.clone()).or_default()))
    }
}

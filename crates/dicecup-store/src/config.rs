//! Store configuration.

use std::time::Duration;

/// Configuration for store behavior.
///
/// Start from `StoreConfig::default()` and override only the fields you
/// care about.
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Upper bound on how long [`lock`](crate::SessionStore::lock) waits.
    ///
    /// `None` (the default) waits as long as the current holder needs.
    /// With a bound, a holder stuck mid-critical-section surfaces as
    /// [`StoreError::LockTimeout`](crate::StoreError::LockTimeout) for
    /// everyone queued behind it instead of stalling them forever.
    pub lock_timeout: Option<Duration>,
}

impl StoreConfig {
    /// A config with the given lock timeout.
    pub fn with_lock_timeout(timeout: Duration) -> Self {
        Self {
            lock_timeout: Some(timeout),
        }
    }
}

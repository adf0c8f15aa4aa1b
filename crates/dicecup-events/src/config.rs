//! Event bus configuration.

/// Configuration for an [`EventBus`](crate::EventBus).
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Events each subscriber may have queued before it is disconnected.
    pub buffer: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self { buffer: 32 }
    }
}

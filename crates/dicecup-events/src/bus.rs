//! Subscriber registry and fan-out.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dicecup_protocol::{ObserverId, SessionId, UserId};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::{BusConfig, BusError, Event, EventPayload};

/// Delivery end of one subscriber's buffer.
type EventSender = mpsc::Sender<Arc<Event>>;

// ---------------------------------------------------------------------------
// Subscription
// ---------------------------------------------------------------------------

/// The receiving side of one observer's subscription to one session.
///
/// Events arrive in publish order. [`recv`](Self::recv) returns `None`
/// once the bus has dropped this subscriber (unsubscribed, or disconnected
/// for falling behind) and every event already buffered has been taken.
#[derive(Debug)]
pub struct Subscription {
    session_id: SessionId,
    observer: ObserverId,
    receiver: mpsc::Receiver<Arc<Event>>,
}

impl Subscription {
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn observer(&self) -> ObserverId {
        self.observer
    }

    /// Waits for the next event.
    pub async fn recv(&mut self) -> Option<Arc<Event>> {
        self.receiver.recv().await
    }

    /// Takes the next event if one is already buffered.
    pub fn try_recv(&mut self) -> Option<Arc<Event>> {
        self.receiver.try_recv().ok()
    }
}

// ---------------------------------------------------------------------------
// PublishReport
// ---------------------------------------------------------------------------

/// What happened to one published event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    /// Sequence number assigned to the event.
    pub seq: u64,
    /// Subscribers the event was queued for.
    pub delivered: usize,
    /// Subscribers removed during this publish (full buffer or gone).
    pub dropped: Vec<ObserverId>,
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Registry {
    /// Live subscribers per session. Sessions with none are pruned.
    subscribers: HashMap<SessionId, HashMap<ObserverId, EventSender>>,
    /// Last sequence number handed out per session. One entry per session
    /// that has published; kept while subscribers come and go so numbering
    /// never restarts, and dropped only by `close_session`.
    sequences: HashMap<SessionId, u64>,
}

/// Per-session publish/subscribe fan-out.
///
/// The registry sits behind a plain mutex held only for map operations and
/// non-blocking `try_send`s, never across an `.await`. Publishing is
/// therefore safe from inside a session's critical section, and two
/// publishes for the same session reach every subscriber in the order
/// they took the registry lock.
#[derive(Debug, Default)]
pub struct EventBus {
    config: BusConfig,
    registry: Mutex<Registry>,
}

impl EventBus {
    pub fn new(config: BusConfig) -> Self {
        Self {
            config,
            registry: Mutex::new(Registry::default()),
        }
    }

    /// Registers `observer` for events of `session_id`.
    ///
    /// # Errors
    /// [`BusError::AlreadySubscribed`] if the observer already holds a live
    /// subscription to this session.
    pub fn subscribe(
        &self,
        session_id: &SessionId,
        observer: ObserverId,
    ) -> Result<Subscription, BusError> {
        let mut registry = self.registry();
        let subscribers = registry
            .subscribers
            .entry(session_id.clone())
            .or_default();

        // A closed sender means the previous subscription was dropped
        // without unsubscribing; let the observer take its slot again.
        if subscribers
            .get(&observer)
            .is_some_and(|sender| !sender.is_closed())
        {
            return Err(BusError::AlreadySubscribed {
                session_id: session_id.clone(),
                observer,
            });
        }

        let (tx, rx) = mpsc::channel(self.config.buffer.max(1));
        subscribers.insert(observer, tx);
        tracing::debug!(
            %session_id,
            %observer,
            subscribers = subscribers.len(),
            "observer subscribed"
        );

        Ok(Subscription {
            session_id: session_id.clone(),
            observer,
            receiver: rx,
        })
    }

    /// Removes `observer` from `session_id`. Safe to call repeatedly.
    ///
    /// Returns `true` if a subscription was removed.
    pub fn unsubscribe(&self, session_id: &SessionId, observer: ObserverId) -> bool {
        let mut registry = self.registry();
        let Some(subscribers) = registry.subscribers.get_mut(session_id) else {
            return false;
        };
        let removed = subscribers.remove(&observer).is_some();
        if subscribers.is_empty() {
            registry.subscribers.remove(session_id);
        }
        if removed {
            tracing::debug!(%session_id, %observer, "observer unsubscribed");
        }
        removed
    }

    /// Queues one event for every live subscriber of `session_id`.
    ///
    /// Never blocks and never fails. A subscriber whose buffer is full, or
    /// whose receiver is gone, is removed from the registry; its channel
    /// closes once it has drained what was already queued, so that
    /// observer has to subscribe again.
    pub fn publish(
        &self,
        session_id: &SessionId,
        user: Option<&UserId>,
        payload: impl Into<EventPayload>,
    ) -> PublishReport {
        let mut registry = self.registry();

        let seq = {
            let last = registry.sequences.entry(session_id.clone()).or_insert(0);
            *last += 1;
            *last
        };
        let event = Arc::new(Event {
            session_id: session_id.clone(),
            user: user.cloned(),
            seq,
            payload: payload.into(),
        });
        let kind = event.kind();

        let mut report = PublishReport {
            seq,
            delivered: 0,
            dropped: Vec::new(),
        };

        let Some(subscribers) = registry.subscribers.get_mut(session_id) else {
            tracing::trace!(%session_id, %kind, seq, "event published without subscribers");
            return report;
        };

        subscribers.retain(|observer, sender| match sender.try_send(Arc::clone(&event)) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(
                    %session_id,
                    %observer,
                    seq,
                    "observer buffer full, disconnecting"
                );
                report.dropped.push(*observer);
                false
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(%session_id, %observer, "observer gone, removing");
                report.dropped.push(*observer);
                false
            }
        });

        if subscribers.is_empty() {
            registry.subscribers.remove(session_id);
        }

        tracing::debug!(
            %session_id,
            %kind,
            seq,
            delivered = report.delivered,
            dropped = report.dropped.len(),
            "event published"
        );
        report
    }

    /// Live subscribers of `session_id`.
    pub fn subscriber_count(&self, session_id: &SessionId) -> usize {
        self.registry()
            .subscribers
            .get(session_id)
            .map_or(0, HashMap::len)
    }

    /// Sessions with at least one subscriber.
    pub fn session_count(&self) -> usize {
        self.registry().subscribers.len()
    }

    /// Sequence number of the last event published on `session_id`, or
    /// `None` if it has never published (or was closed since).
    pub fn last_seq(&self, session_id: &SessionId) -> Option<u64> {
        self.registry().sequences.get(session_id).copied()
    }

    /// Drops every subscriber and the sequence counter of `session_id`.
    ///
    /// Returns the number of subscribers disconnected.
    pub fn close_session(&self, session_id: &SessionId) -> usize {
        let mut registry = self.registry();
        registry.sequences.remove(session_id);
        let closed = registry
            .subscribers
            .remove(session_id)
            .map_or(0, |subscribers| subscribers.len());
        if closed > 0 {
            tracing::info!(%session_id, closed, "session closed on bus");
        }
        closed
    }

    // The registry holds no invariant a panicking holder could break
    // halfway, so a poisoned lock is still usable.
    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

//! Event fan-out for Dicecup.
//!
//! Every accepted mutation of a session produces exactly one [`Event`].
//! The [`EventBus`] hands that event to every observer currently
//! subscribed to the session, each through its own bounded buffer.
//!
//! # How it fits in the stack
//!
//! ```text
//! Controller (above)   ← publish(session, user, payload) after a save
//! Observer handler     ← subscribe / unsubscribe, drains a Subscription
//!     ↕
//! Event Layer (this crate)  ← session id → live subscriber registry
//!     ↕
//! Game Layer (below)   ← Dice, Player, Game snapshots inside payloads
//! ```
//!
//! Publishing never waits on a subscriber. A subscriber that cannot keep
//! up is disconnected (see [`EventBus::publish`]).

mod bus;
mod config;
mod error;
mod event;

pub use bus::{EventBus, PublishReport, Subscription};
pub use config::BusConfig;
pub use error::BusError;
pub use event::{Event, EventKind, EventPayload, JoinChanges, LockChanges, RollChanges};

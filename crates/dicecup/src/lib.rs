//! # Dicecup
//!
//! Concurrent game-state controller for multiplayer dice games, with live
//! WebSocket observers.
//!
//! Dicecup guarantees at most one in-flight mutation per game session,
//! enforces the turn / round / category rules under concurrent requests,
//! and pushes every accepted mutation to the observers of that session
//! without letting a slow observer hold anything up.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use dicecup::prelude::*;
//!
//! # async fn demo() -> Result<(), DicecupError> {
//! let controller = Arc::new(SessionController::new());
//! let id = controller.create([Feature::Ordered]).await?;
//!
//! let alice = UserId::from("alice");
//! controller.join(&id, &alice).await?;
//! controller.roll(&id, &alice).await?;
//! controller.score(&id, &alice, Category::Ones).await?;
//! # Ok(())
//! # }
//! ```

mod controller;
mod error;
mod handler;
mod logging;
mod server;

pub use controller::SessionController;
pub use error::{DicecupError, ErrorClass};
pub use logging::init_logging;
pub use server::{ObserverConfig, ObserverServer, ObserverServerBuilder};

/// Everything a transport layer or demo needs in one import.
pub mod prelude {
    pub use crate::{
        DicecupError, ErrorClass, ObserverConfig, ObserverServer, ObserverServerBuilder,
        SessionController, init_logging,
    };

    pub use dicecup_events::{
        BusConfig, Event, EventBus, EventKind, EventPayload, JoinChanges, LockChanges,
        PublishReport, RollChanges, Subscription,
    };
    pub use dicecup_game::{
        Category, Dice, DiceRoller, Feature, Game, GameError, MAX_ROLLS, Player, RandomRoller,
        ScoringPolicy, ScoringTable, ScriptedRoller,
    };
    pub use dicecup_protocol::{ObserverId, SessionId, UserId};
    pub use dicecup_store::{InMemoryStore, SessionStore, StoreConfig, StoreError};
}

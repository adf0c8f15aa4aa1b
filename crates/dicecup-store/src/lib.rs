//! Session storage and per-session locking for Dicecup.
//!
//! This crate owns two things:
//!
//! 1. **Persistence** — one [`Game`](dicecup_game::Game) record per session
//!    id behind the [`SessionStore`] trait (`load` / `save`).
//! 2. **Mutual exclusion** — a per-session lock ([`SessionStore::lock`])
//!    handed out as a [`SessionGuard`] that releases itself when dropped.
//!
//! # How it fits in the stack
//!
//! ```text
//! Controller (above)  ← lock → load → transition → save → publish → release
//!     ↕
//! Store (this crate)  ← keyed records + one lock per session id
//!     ↕
//! Protocol (below)    ← SessionId, Codec for the stored bytes
//! ```
//!
//! The store itself is last-writer-wins; the concurrency guarantee comes
//! entirely from callers holding the session lock around load and save.

#![allow(async_fn_in_trait)]

mod config;
mod error;
mod lock;
mod memory;
mod store;

pub use config::StoreConfig;
pub use error::StoreError;
pub use lock::{LockTable, SessionGuard};
pub use memory::InMemoryStore;
pub use store::SessionStore;

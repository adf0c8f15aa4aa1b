//! Shared vocabulary for Dicecup.
//!
//! This crate defines the pieces every other layer agrees on:
//!
//! - **Identity** ([`SessionId`], [`UserId`], [`ObserverId`]) — who and
//!   what a request or a subscription refers to.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how game records and
//!   events are converted to/from bytes, both for storage and for the
//!   observer wire.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding or
//!   decoding.
//!
//! # Architecture
//!
//! ```text
//! Controller (dicecup) → Store / Events / Game → Protocol (ids, bytes)
//! ```
//!
//! The protocol layer knows nothing about games, locks, or sockets.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ObserverId, SessionId, UserId};

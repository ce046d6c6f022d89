//! Wire protocol for Skirmish.
//!
//! This crate defines the "language" that the two peers and the server
//! speak:
//!
//! - **Commands** ([`Command`]): the bare names a peer sends to ask for
//!   something (`get`, `turn`, `hand`, ...).
//! - **Types** ([`Turn`], [`Snapshot`], [`Ack`], ...): the payloads those
//!   commands carry and return.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how payloads become bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! # Architecture
//!
//! The protocol layer sits between the transport (sealed frames) and the
//! session loop. It knows nothing about sockets or game rules.
//!
//! ```text
//! Transport (frames) → Protocol (Command / payload) → Session (arbiter calls)
//! ```

mod codec;
mod command;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use command::Command;
pub use error::ProtocolError;
pub use types::{
    Ack, Attack, Hand, HandOutcome, Location, Move, PerPlayer, PlayerNumber,
    SNAPSHOT_VERSION, Snapshot, Turn, TurnUpdate, UnitId,
};

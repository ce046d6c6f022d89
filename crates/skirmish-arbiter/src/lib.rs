//! Authoritative match state and turn arbitration for Skirmish.
//!
//! The state lives inside a single actor task; sessions reach it only
//! through an [`ArbiterHandle`].
//!
//! # Key types
//!
//! - [`GameState`]: the match record and the rules that change it
//! - [`ArbiterHandle`]: send requests to a running arbiter
//! - [`Roster`] / [`UnitSpec`]: which units exist and where they start
//! - [`TurnRejection`]: refused turns

mod actor;
mod error;
mod roster;
mod state;

pub use actor::{ArbiterHandle, spawn_arbiter};
pub use error::{ArbiterError, TurnRejection};
pub use roster::{Roster, UnitSpec};
pub use state::{FIRST_PLAYER, GameState};

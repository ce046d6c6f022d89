//! Seat admission and match lifecycle for Skirmish.
//!
//! A Skirmish server hosts one two-player match at a time. This crate
//! decides who gets which seat and when the match behind those seats is
//! created and discarded:
//!
//! 1. **Admission**: the lowest free seat, so player numbers are always
//!    1 or 2 and never collide ([`SessionManager::admit`])
//! 2. **Lifecycle**: a fresh arbiter for the first player in, discarded
//!    when the last one leaves ([`SessionManager::release`])
//! 3. **Completion**: a decided match that empties out is counted in
//!    [`LobbyStatus`], which the accept loop watches
//!
//! # How it fits in the stack
//!
//! ```text
//! Server (above)   ← accept loop + one command loop per seat
//!     ↕
//! Session Layer (this crate)   ← seats and match lifecycle
//!     ↕
//! Arbiter (below)   ← authoritative GameState
//! ```

mod error;
mod manager;
mod seat;

pub use error::SessionError;
pub use manager::SessionManager;
pub use seat::{LobbyStatus, Seat, SessionConfig};

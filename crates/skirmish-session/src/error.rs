//! Error types for the session layer.

use skirmish_protocol::PlayerNumber;

/// Errors that can occur while seating or releasing players.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Both seats are taken.
    #[error("both seats are taken")]
    Full,

    /// A release was requested for a seat nobody holds.
    #[error("{0} is not seated")]
    NotSeated(PlayerNumber),
}

//! Seat types: what a connection gets when it is admitted, and what the
//! accept loop watches to decide whether to keep accepting.

use skirmish_arbiter::ArbiterHandle;
use skirmish_protocol::{PerPlayer, PlayerNumber};

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Configuration for the session manager.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Capacity of the arbiter's command queue.
    ///
    /// Two sessions issue at most one request each at a time, so anything
    /// above a handful only matters for tooling that drives the handle
    /// directly. Default: 32.
    pub arbiter_channel_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            arbiter_channel_size: 32,
        }
    }
}

// ---------------------------------------------------------------------------
// Seat
// ---------------------------------------------------------------------------

/// An admitted player: their number and a handle to the match they joined.
///
/// Give the seat back with
/// [`SessionManager::release`](crate::SessionManager::release) when the
/// connection ends.
#[derive(Clone)]
pub struct Seat {
    pub player: PlayerNumber,
    pub arbiter: ArbiterHandle,
}

// ---------------------------------------------------------------------------
// LobbyStatus
// ---------------------------------------------------------------------------

/// Occupancy as published to the accept loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LobbyStatus {
    /// Which seats are taken.
    pub seated: PerPlayer<bool>,

    /// Matches that ended with the game decided and both players gone.
    pub completed_matches: u64,
}

impl LobbyStatus {
    /// The seat the next admitted connection would get, if any.
    pub fn next_seat(&self) -> Option<PlayerNumber> {
        PlayerNumber::ALL
            .into_iter()
            .find(|&player| !self.seated[player])
    }

    /// Number of occupied seats.
    pub fn occupied(&self) -> usize {
        self.seated.iter().filter(|(_, taken)| **taken).count()
    }

    pub fn is_empty(&self) -> bool {
        self.occupied() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_seat_prefers_lowest_free() {
        let mut status = LobbyStatus::default();
        assert_eq!(status.next_seat(), Some(PlayerNumber::One));

        status.seated.one = true;
        assert_eq!(status.next_seat(), Some(PlayerNumber::Two));

        status.seated.two = true;
        assert_eq!(status.next_seat(), None);
        assert_eq!(status.occupied(), 2);

        status.seated.one = false;
        assert_eq!(status.next_seat(), Some(PlayerNumber::One));
    }
}

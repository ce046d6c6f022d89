//! The session manager: two seats and the match that lives between them.
//!
//! It is responsible for:
//! - Handing out player numbers (lowest free seat first)
//! - Starting a fresh arbiter when the first player sits down
//! - Discarding the match when the last player leaves
//! - Telling the accept loop when a decided match has emptied out
//!
//! # Concurrency note
//!
//! `SessionManager` is not thread-safe by itself. The server keeps it behind
//! an async mutex shared by the accept loop and the session tasks; the
//! [`LobbyStatus`] watch channel lets the accept loop wait for a free seat
//! without holding that lock.

use skirmish_arbiter::{ArbiterHandle, Roster, spawn_arbiter};
use skirmish_protocol::PlayerNumber;
use tokio::sync::watch;

use crate::{LobbyStatus, Seat, SessionConfig, SessionError};

/// Seats players and owns the lifecycle of their match.
///
/// ## Lifecycle
///
/// ```text
///   admit() ──→ [P1 seated, arbiter spawned]
///   admit() ──→ [P1, P2 seated]
///   release(P2) ──→ [P1 seated, match kept]
///   release(P1) ──→ [empty, arbiter shut down]
///                      │
///                      └─ game was over? → completed_matches += 1
/// ```
pub struct SessionManager {
    status: watch::Sender<LobbyStatus>,
    arbiter: Option<ArbiterHandle>,
    roster: Roster,
    config: SessionConfig,
}

impl SessionManager {
    /// Creates an empty manager. Matches it starts use `roster`.
    pub fn new(roster: Roster, config: SessionConfig) -> Self {
        let (status, _) = watch::channel(LobbyStatus::default());
        Self {
            status,
            arbiter: None,
            roster,
            config,
        }
    }

    /// Seats a new player in the lowest free seat.
    ///
    /// The first admission after the manager was empty spawns a new arbiter;
    /// later admissions join that same match.
    ///
    /// # Errors
    /// Returns [`SessionError::Full`] if both seats are taken.
    pub fn admit(&mut self) -> Result<Seat, SessionError> {
        let player = self
            .status
            .borrow()
            .next_seat()
            .ok_or(SessionError::Full)?;

        let arbiter = match &self.arbiter {
            Some(handle) => handle.clone(),
            None => {
                let handle = spawn_arbiter(
                    self.roster.clone(),
                    self.config.arbiter_channel_size,
                );
                tracing::info!(%player, "new match created");
                self.arbiter = Some(handle.clone());
                handle
            }
        };

        self.status.send_modify(|s| s.seated[player] = true);
        tracing::info!(%player, occupied = self.occupied(), "player seated");

        Ok(Seat { player, arbiter })
    }

    /// Frees `player`'s seat.
    ///
    /// If that leaves both seats empty the match is discarded, and if the
    /// game had been decided the match counts as completed.
    ///
    /// # Errors
    /// Returns [`SessionError::NotSeated`] if the seat is already free.
    pub async fn release(
        &mut self,
        player: PlayerNumber,
    ) -> Result<(), SessionError> {
        if !self.status.borrow().seated[player] {
            return Err(SessionError::NotSeated(player));
        }

        let last_out = self.occupied() == 1;
        let mut completed = false;

        if last_out {
            if let Some(arbiter) = self.arbiter.take() {
                completed = match arbiter.turn_update().await {
                    Ok(update) => update.game_over,
                    Err(e) => {
                        tracing::debug!(error = %e, "arbiter already gone");
                        false
                    }
                };
                if let Err(e) = arbiter.shutdown().await {
                    tracing::debug!(error = %e, "arbiter shutdown failed");
                }
            }
            tracing::info!(completed, "all players disconnected");
        } else {
            tracing::info!(%player, "player left, match kept");
        }

        self.status.send_modify(|s| {
            s.seated[player] = false;
            if completed {
                s.completed_matches += 1;
            }
        });

        Ok(())
    }

    /// The running match, if anyone is seated.
    pub fn arbiter(&self) -> Option<&ArbiterHandle> {
        self.arbiter.as_ref()
    }

    /// Current occupancy.
    pub fn status(&self) -> LobbyStatus {
        *self.status.borrow()
    }

    /// A receiver that sees every occupancy change.
    pub fn subscribe(&self) -> watch::Receiver<LobbyStatus> {
        self.status.subscribe()
    }

    /// Number of occupied seats.
    pub fn occupied(&self) -> usize {
        self.status.borrow().occupied()
    }
}

// =========================================================================
// Tests
// =========================================================================

//! Arbiter actor: an isolated Tokio task that owns the match state.
//!
//! Both sessions talk to the state only through an [`ArbiterHandle`], which
//! sends commands over an mpsc channel. The actor handles one command at a
//! time, so every read and every mutation is atomic with respect to the
//! other session: a snapshot can never land between the move and the
//! attack of one turn, and two `hand` commits can never trample each other.
//!
//! Turn hand-offs are also published on a `watch` channel. A waiting
//! session subscribes to it instead of asking "is it my turn yet?" in a
//! loop.

use std::time::Duration;

use skirmish_protocol::{
    Hand, HandOutcome, PlayerNumber, Snapshot, Turn, TurnUpdate,
};
use tokio::sync::{mpsc, oneshot, watch};

use crate::{ArbiterError, GameState, Roster, TurnRejection};

/// Commands sent to the arbiter actor through its channel.
///
/// The `oneshot::Sender` in each variant is the reply channel: the caller
/// sends a command and waits for the response on it.
enum ArbiterCommand {
    Snapshot {
        reply: oneshot::Sender<Snapshot>,
    },
    ApplyTurn {
        turn: Turn,
        player: PlayerNumber,
        reply: oneshot::Sender<Result<(), TurnRejection>>,
    },
    TurnUpdate {
        reply: oneshot::Sender<TurnUpdate>,
    },
    SetHand {
        player: PlayerNumber,
        hand: Hand,
        reply: oneshot::Sender<()>,
    },
    ResolveHands {
        reply: oneshot::Sender<Option<HandOutcome>>,
    },
    HandsPending {
        reply: oneshot::Sender<bool>,
    },
    SetReady {
        player: PlayerNumber,
        reply: oneshot::Sender<()>,
    },
    Ready {
        reply: oneshot::Sender<bool>,
    },
    Reset {
        reply: oneshot::Sender<()>,
    },
    Shutdown,
}

/// Handle to a running arbiter actor.
///
/// Cheap to clone: an `mpsc::Sender` plus a `watch::Receiver`. Each session
/// holds its own clone.
#[derive(Clone)]
pub struct ArbiterHandle {
    sender: mpsc::Sender<ArbiterCommand>,
    updates: watch::Receiver<TurnUpdate>,
}

impl ArbiterHandle {
    /// Sends `cmd` and waits for the reply on `rx`.
    async fn request<T>(
        &self,
        cmd: ArbiterCommand,
        rx: oneshot::Receiver<T>,
    ) -> Result<T, ArbiterError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| ArbiterError::Unavailable)?;
        rx.await.map_err(|_| ArbiterError::Unavailable)
    }

    /// A consistent copy of the whole state.
    pub async fn snapshot(&self) -> Result<Snapshot, ArbiterError> {
        let (reply, rx) = oneshot::channel();
        self.request(ArbiterCommand::Snapshot { reply }, rx).await
    }

    /// Submits a turn for `player`.
    ///
    /// The outer `Result` is about reaching the actor; the inner one is the
    /// rules' verdict.
    pub async fn apply_turn(
        &self,
        turn: Turn,
        player: PlayerNumber,
    ) -> Result<Result<(), TurnRejection>, ArbiterError> {
        let (reply, rx) = oneshot::channel();
        self.request(ArbiterCommand::ApplyTurn { turn, player, reply }, rx)
            .await
    }

    /// Whose turn it is and what the last turn did.
    pub async fn turn_update(&self) -> Result<TurnUpdate, ArbiterError> {
        let (reply, rx) = oneshot::channel();
        self.request(ArbiterCommand::TurnUpdate { reply }, rx).await
    }

    /// Waits until `player` holds the turn or the game is over, for at most
    /// `timeout`. On timeout, returns the latest update anyway.
    pub async fn wait_for_turn(
        &self,
        player: PlayerNumber,
        timeout: Duration,
    ) -> Result<TurnUpdate, ArbiterError> {
        let mut updates = self.updates.clone();
        let waited = tokio::time::timeout(timeout, async {
            updates
                .wait_for(|u| u.game_over || u.active_player == player)
                .await
                .map(|u| TurnUpdate::clone(&u))
        })
        .await;

        match waited {
            Ok(Ok(update)) => Ok(update),
            Ok(Err(_)) => Err(ArbiterError::Unavailable),
            Err(_) => Ok(updates.borrow().clone()),
        }
    }

    /// A receiver that sees every published [`TurnUpdate`].
    pub fn subscribe(&self) -> watch::Receiver<TurnUpdate> {
        self.updates.clone()
    }

    pub async fn set_hand(
        &self,
        player: PlayerNumber,
        hand: Hand,
    ) -> Result<(), ArbiterError> {
        let (reply, rx) = oneshot::channel();
        self.request(ArbiterCommand::SetHand { player, hand, reply }, rx)
            .await
    }

    pub async fn resolve_hands(
        &self,
    ) -> Result<Option<HandOutcome>, ArbiterError> {
        let (reply, rx) = oneshot::channel();
        self.request(ArbiterCommand::ResolveHands { reply }, rx).await
    }

    pub async fn hands_pending(&self) -> Result<bool, ArbiterError> {
        let (reply, rx) = oneshot::channel();
        self.request(ArbiterCommand::HandsPending { reply }, rx).await
    }

    pub async fn set_ready(
        &self,
        player: PlayerNumber,
    ) -> Result<(), ArbiterError> {
        let (reply, rx) = oneshot::channel();
        self.request(ArbiterCommand::SetReady { player, reply }, rx)
            .await
    }

    pub async fn ready(&self) -> Result<bool, ArbiterError> {
        let (reply, rx) = oneshot::channel();
        self.request(ArbiterCommand::Ready { reply }, rx).await
    }

    pub async fn reset(&self) -> Result<(), ArbiterError> {
        let (reply, rx) = oneshot::channel();
        self.request(ArbiterCommand::Reset { reply }, rx).await
    }

    /// Tells the actor to stop. The state is dropped with it.
    pub async fn shutdown(&self) -> Result<(), ArbiterError> {
        self.sender
            .send(ArbiterCommand::Shutdown)
            .await
            .map_err(|_| ArbiterError::Unavailable)
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct ArbiterActor {
    state: GameState,
    updates: watch::Sender<TurnUpdate>,
    receiver: mpsc::Receiver<ArbiterCommand>,
}

impl ArbiterActor {
    /// Runs the actor loop, processing commands until shutdown or until
    /// every handle is gone.
    async fn run(mut self) {
        tracing::info!("arbiter started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                ArbiterCommand::Snapshot { reply } => {
                    let _ = reply.send(self.state.snapshot());
                }
                ArbiterCommand::ApplyTurn {
                    turn,
                    player,
                    reply,
                } => {
                    let result = self.state.apply_turn(&turn, player);
                    match &result {
                        Ok(()) => {
                            tracing::debug!(
                                %player,
                                next = %self.state.active_player(),
                                game_over = self.state.is_game_over(),
                                "turn applied"
                            );
                            self.publish();
                        }
                        Err(reason) => {
                            tracing::debug!(%player, %reason, "turn rejected");
                        }
                    }
                    let _ = reply.send(result);
                }
                ArbiterCommand::TurnUpdate { reply } => {
                    let _ = reply.send(self.state.turn_update());
                }
                ArbiterCommand::SetHand {
                    player,
                    hand,
                    reply,
                } => {
                    match self.state.set_hand(player, hand) {
                        Some(previous) => {
                            tracing::debug!(%player, %previous, %hand, "hand replaced")
                        }
                        None => tracing::debug!(%player, %hand, "hand committed"),
                    }
                    let _ = reply.send(());
                }
                ArbiterCommand::ResolveHands { reply } => {
                    let _ = reply.send(self.state.resolve_hands());
                }
                ArbiterCommand::HandsPending { reply } => {
                    let _ = reply.send(self.state.hands_pending());
                }
                ArbiterCommand::SetReady { player, reply } => {
                    self.state.set_ready(player);
                    tracing::info!(%player, ready = self.state.ready(), "player ready");
                    let _ = reply.send(());
                }
                ArbiterCommand::Ready { reply } => {
                    let _ = reply.send(self.state.ready());
                }
                ArbiterCommand::Reset { reply } => {
                    self.state.reset();
                    tracing::info!("match reset");
                    self.publish();
                    let _ = reply.send(());
                }
                ArbiterCommand::Shutdown => {
                    tracing::info!("arbiter shutting down");
                    break;
                }
            }
        }

        tracing::info!("arbiter stopped");
    }

    fn publish(&self) {
        self.updates.send_replace(self.state.turn_update());
    }
}

/// Spawns a new arbiter task owning a fresh match and returns a handle.
///
/// `channel_size` bounds the command queue; senders wait when it is full.
pub fn spawn_arbiter(roster: Roster, channel_size: usize) -> ArbiterHandle {
    let (tx, rx) = mpsc::channel(channel_size);
    let state = GameState::new(roster);
    let (updates_tx, updates_rx) = watch::channel(state.turn_update());

    let actor = ArbiterActor {
        state,
        updates: updates_tx,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    ArbiterHandle {
        sender: tx,
        updates: updates_rx,
    }
}

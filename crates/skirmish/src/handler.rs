//! Per-connection session: greeting and the command loop.
//!
//! Each admitted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Send the player number
//!   2. Loop: read a command frame → call the arbiter → reply
//!   3. On quit, disconnect, or idle timeout: give the seat back

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use skirmish_arbiter::ArbiterHandle;
use skirmish_protocol::{Ack, Codec, Command, Hand, PlayerNumber, Turn};
use skirmish_session::Seat;
use skirmish_transport::{Connection, TcpConnection, TransportError};

use crate::SkirmishError;
use crate::server::ServerState;

/// Drop guard that gives the seat back when the handler exits.
///
/// Runs even if the handler returns early with an error. `Drop` is
/// synchronous, so the release runs in a spawned task.
struct SeatGuard<C: Codec> {
    player: PlayerNumber,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for SeatGuard<C> {
    fn drop(&mut self) {
        let player = self.player;
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut sessions = state.sessions.lock().await;
            if let Err(e) = sessions.release(player).await {
                tracing::debug!(%player, error = %e, "release failed");
            }
        });
    }
}

/// What came off the wire.
enum Incoming {
    Frame(Vec<u8>),
    /// The frame arrived but the cipher refused it. The stream is still
    /// aligned, so the session can keep going.
    Unreadable(TransportError),
    /// Peer gone, read failed, zero-length frame, or idle timeout.
    Closed,
}

/// Handles a single seated connection until it ends.
pub(crate) async fn handle_connection<C: Codec>(
    conn: TcpConnection,
    seat: Seat,
    state: Arc<ServerState<C>>,
) -> Result<(), SkirmishError> {
    let Seat { player, arbiter } = seat;
    let _guard = SeatGuard {
        player,
        state: Arc::clone(&state),
    };

    send(&conn, &state.codec, &player).await?;

    loop {
        let frame = match next_frame(&conn, state.config.idle_timeout).await {
            Incoming::Frame(frame) => frame,
            Incoming::Unreadable(e) => {
                tracing::warn!(%player, error = %e, "dropping unreadable frame");
                continue;
            }
            Incoming::Closed => break,
        };

        let command = match Command::from_frame(&frame) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(%player, error = %e, "invalid command");
                continue;
            }
        };
        tracing::debug!(%player, %command, "command received");

        let keep_going =
            dispatch(&conn, &state, &arbiter, player, command).await?;
        if !keep_going {
            break;
        }
    }

    tracing::info!(%player, conn_id = %conn.id(), "closing connection");
    if let Err(e) = conn.close().await {
        tracing::debug!(%player, error = %e, "close failed");
    }

    // _guard drops here → seat released.
    Ok(())
}

/// Runs one command. Returns `false` when the session should end: the
/// peer quit or vanished mid-exchange, including while parked on
/// `wait_turn`.
async fn dispatch<C: Codec>(
    conn: &TcpConnection,
    state: &ServerState<C>,
    arbiter: &ArbiterHandle,
    player: PlayerNumber,
    command: Command,
) -> Result<bool, SkirmishError> {
    let codec = &state.codec;

    match command {
        Command::Get => {
            let snapshot = arbiter.snapshot().await?;
            send(conn, codec, &snapshot).await?;
        }

        Command::Turn => {
            send(conn, codec, &Ack::Ok).await?;
            let Some(turn) = read_payload::<Turn, C>(conn, state).await else {
                return Ok(false);
            };
            let ack = match turn {
                Ok(turn) => match arbiter.apply_turn(turn, player).await? {
                    Ok(()) => Ack::Ok,
                    Err(reason) => {
                        tracing::info!(%player, %reason, "turn rejected");
                        Ack::rejected(reason)
                    }
                },
                Err(reason) => {
                    tracing::warn!(%player, %reason, "undecodable turn");
                    Ack::rejected(reason)
                }
            };
            send(conn, codec, &ack).await?;
        }

        Command::RequestTurn => {
            let update = arbiter.turn_update().await?;
            send(conn, codec, &update).await?;
        }

        Command::WaitTurn => {
            let wait =
                arbiter.wait_for_turn(player, state.config.wait_turn_timeout);
            let update = tokio::select! {
                update = wait => update?,
                () = conn.closed() => {
                    tracing::info!(%player, "peer left while waiting for turn");
                    return Ok(false);
                }
            };
            send(conn, codec, &update).await?;
        }

        Command::Hand => {
            send(conn, codec, &Ack::Ok).await?;
            let Some(hand) = read_payload::<Hand, C>(conn, state).await else {
                return Ok(false);
            };
            let ack = match hand {
                Ok(hand) => {
                    arbiter.set_hand(player, hand).await?;
                    Ack::Ok
                }
                Err(reason) => {
                    tracing::warn!(%player, %reason, "undecodable hand");
                    Ack::rejected(reason)
                }
            };
            send(conn, codec, &ack).await?;
        }

        Command::RpsWinner => {
            let outcome = arbiter.resolve_hands().await?;
            send(conn, codec, &outcome).await?;
        }

        Command::CheckRps => {
            let pending = arbiter.hands_pending().await?;
            send(conn, codec, &pending).await?;
        }

        Command::Start => {
            arbiter.set_ready(player).await?;
            send(conn, codec, &Ack::Ok).await?;
        }

        Command::Reset => {
            tracing::info!(%player, "reset requested");
            arbiter.reset().await?;
        }

        Command::Quit => {
            tracing::info!(%player, "player quit");
            return Ok(false);
        }
    }

    Ok(true)
}

/// Reads one frame, bounded by the idle timeout.
async fn next_frame(
    conn: &TcpConnection,
    idle_timeout: Option<Duration>,
) -> Incoming {
    let received = match idle_timeout {
        Some(limit) => match tokio::time::timeout(limit, conn.recv()).await {
            Ok(received) => received,
            Err(_) => {
                tracing::info!(conn_id = %conn.id(), "connection idle, timing out");
                return Incoming::Closed;
            }
        },
        None => conn.recv().await,
    };

    match received {
        Ok(Some(frame)) if !frame.is_empty() => Incoming::Frame(frame),
        Ok(Some(_)) => {
            tracing::debug!(conn_id = %conn.id(), "zero-length frame");
            Incoming::Closed
        }
        Ok(None) => {
            tracing::debug!(conn_id = %conn.id(), "connection closed cleanly");
            Incoming::Closed
        }
        Err(e @ TransportError::Cipher(_)) => Incoming::Unreadable(e),
        Err(e) => {
            tracing::debug!(conn_id = %conn.id(), error = %e, "recv error");
            Incoming::Closed
        }
    }
}

/// Reads the payload frame that follows an acknowledged `turn` or `hand`.
///
/// `None` means the peer went away; `Some(Err(reason))` means the frame
/// arrived but is not a `T`.
async fn read_payload<T: DeserializeOwned, C: Codec>(
    conn: &TcpConnection,
    state: &ServerState<C>,
) -> Option<Result<T, String>> {
    match next_frame(conn, state.config.idle_timeout).await {
        Incoming::Frame(frame) => {
            Some(state.codec.decode(&frame).map_err(|e| e.to_string()))
        }
        Incoming::Unreadable(e) => Some(Err(e.to_string())),
        Incoming::Closed => None,
    }
}

async fn send<T: Serialize>(
    conn: &TcpConnection,
    codec: &impl Codec,
    value: &T,
) -> Result<(), SkirmishError> {
    let bytes = codec.encode(value)?;
    conn.send(&bytes).await?;
    Ok(())
}

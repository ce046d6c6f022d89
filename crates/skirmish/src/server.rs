//! `SkirmishServer` builder and accept loop.
//!
//! This is the entry point for running a match server. It ties together
//! all the layers: transport → protocol → session → arbiter.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use skirmish_arbiter::Roster;
use skirmish_protocol::{Codec, JsonCodec};
use skirmish_session::{LobbyStatus, SessionManager};
use skirmish_transport::{
    Cipher, Connection, PlainCipher, TcpConnection, TcpTransport, Transport,
};
use tokio::sync::{Mutex, watch};

use crate::handler::handle_connection;
use crate::{ServerConfig, SkirmishError};

/// Shared server state passed to each session task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) sessions: Mutex<SessionManager>,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a Skirmish server.
///
/// # Example
///
/// ```rust,ignore
/// use skirmish::prelude::*;
///
/// let server = SkirmishServer::builder()
///     .bind("0.0.0.0:5555")
///     .cipher(cipher_from_hex(&key)?)
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct SkirmishServerBuilder {
    config: ServerConfig,
    roster: Roster,
    cipher: Arc<dyn Cipher>,
}

impl SkirmishServerBuilder {
    /// Creates a new builder with default settings and no encryption.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            roster: Roster::default(),
            cipher: Arc::new(PlainCipher),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Replaces the whole configuration, bind address included.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    pub fn wait_turn_timeout(mut self, timeout: Duration) -> Self {
        self.config.wait_turn_timeout = timeout;
        self
    }

    pub fn exit_after_match(mut self, exit: bool) -> Self {
        self.config.exit_after_match = exit;
        self
    }

    /// Sets the units every new match starts with.
    pub fn roster(mut self, roster: Roster) -> Self {
        self.roster = roster;
        self
    }

    /// Sets the frame cipher. Both peers must use the same one.
    pub fn cipher(mut self, cipher: Arc<dyn Cipher>) -> Self {
        self.cipher = cipher;
        self
    }

    /// Binds the listener and returns a server ready to [`run`].
    ///
    /// Uses `JsonCodec` for payloads.
    ///
    /// # Errors
    /// Returns [`SkirmishError::Transport`] if the address cannot be bound.
    ///
    /// [`run`]: SkirmishServer::run
    pub async fn build(self) -> Result<SkirmishServer<JsonCodec>, SkirmishError> {
        let transport =
            TcpTransport::bind(&self.config.bind_addr, self.cipher).await?;

        let state = Arc::new(ServerState {
            sessions: Mutex::new(SessionManager::new(
                self.roster,
                self.config.session.clone(),
            )),
            codec: JsonCodec,
            config: self.config,
        });

        Ok(SkirmishServer { transport, state })
    }
}

impl Default for SkirmishServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Skirmish server.
///
/// Call [`run()`](Self::run) to start accepting players.
pub struct SkirmishServer<C: Codec> {
    transport: TcpTransport,
    state: Arc<ServerState<C>>,
}

impl SkirmishServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> SkirmishServerBuilder {
        SkirmishServerBuilder::new()
    }
}

impl<C: Codec> SkirmishServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop.
    ///
    /// Accepts a connection whenever a seat is free and spawns a session
    /// task for it; while both seats are taken nothing is accepted. With
    /// `exit_after_match` set, returns once a decided match has been left
    /// by both players. Otherwise runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), SkirmishError> {
        let exit_after_match = self.state.config.exit_after_match;
        let mut status = self.state.sessions.lock().await.subscribe();
        let transport = &mut self.transport;
        let state = &self.state;

        tracing::info!("Skirmish server running");

        loop {
            let current = match status
                .wait_for(|s| {
                    s.next_seat().is_some()
                        || (exit_after_match && s.completed_matches > 0)
                })
                .await
            {
                Ok(current) => *current,
                Err(_) => break,
            };

            if exit_after_match && current.completed_matches > 0 {
                tracing::info!("match complete, server closing");
                break;
            }
            if let Some(player) = current.next_seat() {
                tracing::info!(%player, "waiting for player");
            }

            tokio::select! {
                accepted = transport.accept() => match accepted {
                    Ok(conn) => start_session(conn, state).await,
                    Err(e) => tracing::error!(error = %e, "accept failed"),
                },
                () = match_completed(&mut status), if exit_after_match => {
                    tracing::info!("match complete, server closing");
                    break;
                }
            }
        }

        transport.shutdown().await?;
        Ok(())
    }
}

/// Resolves once a decided match has emptied out. A closed channel means
/// the session manager is gone, which ends the loop just the same.
async fn match_completed(status: &mut watch::Receiver<LobbyStatus>) {
    let _ = status.wait_for(|s| s.completed_matches > 0).await;
}

/// Seats an accepted connection and spawns its session task.
async fn start_session<C: Codec>(
    conn: TcpConnection,
    state: &Arc<ServerState<C>>,
) {
    let admitted = state.sessions.lock().await.admit();
    match admitted {
        Ok(seat) => {
            tracing::info!(
                conn_id = %conn.id(),
                peer = %conn.peer_addr(),
                player = %seat.player,
                "established connection"
            );
            let state = Arc::clone(state);
            tokio::spawn(async move {
                if let Err(e) = handle_connection(conn, seat, state).await {
                    tracing::debug!(error = %e, "session ended with error");
                }
            });
        }
        Err(e) => {
            tracing::warn!(
                conn_id = %conn.id(),
                error = %e,
                "turning connection away"
            );
            if let Err(e) = conn.close().await {
                tracing::debug!(error = %e, "close failed");
            }
        }
    }
}

//! Unified error type for the Skirmish server.

use skirmish_arbiter::ArbiterError;
use skirmish_protocol::ProtocolError;
use skirmish_session::SessionError;
use skirmish_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum SkirmishError {
    /// A transport-level error (bind, send, recv, cipher).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, unknown command).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A seating error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The match's arbiter could not be reached.
    #[error(transparent)]
    Arbiter(#[from] ArbiterError),

    /// The cipher key given at startup is unusable.
    #[error("invalid cipher key: {0}")]
    InvalidKey(String),
}

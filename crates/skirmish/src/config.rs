//! Server configuration.

use std::sync::Arc;
use std::time::Duration;

use skirmish_session::SessionConfig;
use skirmish_transport::{ChaChaCipher, Cipher, KEY_LEN};

use crate::SkirmishError;

/// Runtime knobs for a [`SkirmishServer`](crate::SkirmishServer).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on, `host:port`.
    pub bind_addr: String,

    /// How long a session may sit without sending a command before it is
    /// disconnected. `None` waits forever.
    ///
    /// Default: 300 seconds.
    pub idle_timeout: Option<Duration>,

    /// Upper bound on a single `wait_turn`. When it elapses the caller gets
    /// the current state and may simply ask again.
    ///
    /// Default: 30 seconds.
    pub wait_turn_timeout: Duration,

    /// Stop accepting and return from `run` once a decided match has been
    /// left by both players.
    ///
    /// Default: `true`.
    pub exit_after_match: bool,

    pub session: SessionConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:5555".to_string(),
            idle_timeout: Some(Duration::from_secs(300)),
            wait_turn_timeout: Duration::from_secs(30),
            exit_after_match: true,
            session: SessionConfig::default(),
        }
    }
}

/// Builds a ChaCha20-Poly1305 cipher from a hex-encoded 32-byte key.
///
/// # Errors
/// Returns [`SkirmishError::InvalidKey`] if the text is not hex or does not
/// decode to exactly [`KEY_LEN`] bytes.
pub fn cipher_from_hex(key: &str) -> Result<Arc<dyn Cipher>, SkirmishError> {
    let bytes = hex::decode(key.trim())
        .map_err(|e| SkirmishError::InvalidKey(e.to_string()))?;
    let key: [u8; KEY_LEN] = bytes.try_into().map_err(|b: Vec<u8>| {
        SkirmishError::InvalidKey(format!(
            "expected {KEY_LEN} bytes, got {}",
            b.len()
        ))
    })?;
    Ok(Arc::new(ChaChaCipher::new(key)))
}

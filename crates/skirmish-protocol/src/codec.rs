//! Codec trait and implementations for serializing/deserializing payloads.
//!
//! The rest of the server never calls serde_json directly. It holds some
//! `C: Codec` and asks it to encode or decode, so a compact binary format
//! can replace JSON later without touching the session code.

use serde::{de::DeserializeOwned, Serialize};

use crate::{ProtocolError, Snapshot};

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// `Send + Sync + 'static` because one codec instance is shared by every
/// session task for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;

    /// Decodes a [`Snapshot`] and checks its schema version.
    fn decode_snapshot(&self, data: &[u8]) -> Result<Snapshot, ProtocolError> {
        let snapshot: Snapshot = self.decode(data)?;
        snapshot.check_version()?;
        Ok(snapshot)
    }
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] that uses JSON (via `serde_json`).
///
/// Human-readable, so frames can be inspected in a packet capture once the
/// cipher is set to plain. Behind the `json` feature (enabled by default).
///
/// ## Example
///
/// ```rust
/// use skirmish_protocol::{Codec, JsonCodec, Location, Turn};
///
/// let codec = JsonCodec;
/// let turn = Turn::moving("p1-square", Location::new(1, 4));
///
/// let bytes = codec.encode(&turn).unwrap();
/// let decoded: Turn = codec.decode(&bytes).unwrap();
/// assert_eq!(turn, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

//! Error types for the protocol layer.
//!
//! Each crate in Skirmish defines its own error enum. A `ProtocolError`
//! always means a problem turning bytes into commands or payloads, never a
//! network or game-rule problem.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: malformed JSON, missing fields, a hand value outside
    /// 0..=2, or a player number other than 1 or 2.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A command frame named a command the server does not know.
    #[error("unknown command: {0:?}")]
    UnknownCommand(String),

    /// A command frame was not valid UTF-8.
    #[error("command frame is not UTF-8")]
    NonUtf8Command,

    /// A snapshot was produced by an incompatible schema version.
    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },
}

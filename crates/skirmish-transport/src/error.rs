/// Errors that can occur in the transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Sending data failed.
    #[error("send failed: {0}")]
    SendFailed(#[source] std::io::Error),

    /// Receiving data failed. The stream can no longer be trusted to be
    /// on a frame boundary.
    #[error("receive failed: {0}")]
    ReceiveFailed(#[source] std::io::Error),

    /// Binding the listener failed (address in use, unavailable, ...).
    #[error("bind to {addr} failed: {source}")]
    BindFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Accepting or opening a connection failed.
    #[error("accept failed: {0}")]
    AcceptFailed(#[source] std::io::Error),

    /// A frame could not be sealed or opened by the cipher.
    ///
    /// The length prefix sits outside the cipher, so the stream is still
    /// aligned on the next frame when this is returned.
    #[error("cipher failure: {0}")]
    Cipher(String),
}

//! Symmetric ciphers applied to every frame at the transport boundary.
//!
//! The transport never looks inside a frame: it hands the body to a
//! [`Cipher`] on the way out and on the way in. Swapping the cipher changes
//! nothing above this layer.

use crate::TransportError;

/// Seals outgoing frame bodies and opens incoming ones.
///
/// Object safe so a connection can hold an `Arc<dyn Cipher>` chosen at
/// startup.
pub trait Cipher: Send + Sync + 'static {
    /// Transforms a plaintext body into the bytes put on the wire.
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, TransportError>;

    /// Recovers the plaintext from wire bytes.
    ///
    /// # Errors
    /// Returns [`TransportError::Cipher`] if the bytes were not produced by
    /// a matching `seal` (wrong key, truncation, tampering).
    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, TransportError>;
}

/// Pass-through cipher. Bytes travel in the clear.
///
/// Only meant for local development and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainCipher;

impl Cipher for PlainCipher {
    fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, TransportError> {
        Ok(plaintext.to_vec())
    }

    fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, TransportError> {
        Ok(sealed.to_vec())
    }
}

#[cfg(feature = "aead")]
pub use aead_impl::{ChaChaCipher, KEY_LEN};

#[cfg(feature = "aead")]
mod aead_impl {
    use chacha20poly1305::aead::{Aead, KeyInit};
    use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
    use rand::Rng;

    use super::Cipher;
    use crate::TransportError;

    /// Key length in bytes.
    pub const KEY_LEN: usize = 32;

    const NONCE_LEN: usize = 12;

    /// ChaCha20-Poly1305 authenticated encryption.
    ///
    /// Wire layout of a sealed body: `nonce (12 bytes) || ciphertext || tag`.
    /// A fresh random nonce is drawn for every frame, so both directions
    /// can share one key.
    pub struct ChaChaCipher {
        aead: ChaCha20Poly1305,
    }

    impl ChaChaCipher {
        /// Creates a cipher from a 256-bit shared key.
        pub fn new(key: [u8; KEY_LEN]) -> Self {
            Self {
                aead: ChaCha20Poly1305::new(Key::from_slice(&key)),
            }
        }
    }

    // Hand-written so the key never ends up in logs.
    impl std::fmt::Debug for ChaChaCipher {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("ChaChaCipher").finish_non_exhaustive()
        }
    }

    impl Cipher for ChaChaCipher {
        fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, TransportError> {
            let nonce_bytes: [u8; NONCE_LEN] = rand::rng().random();
            let ciphertext = self
                .aead
                .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
                .map_err(|_| TransportError::Cipher("seal failed".into()))?;

            let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
            out.extend_from_slice(&nonce_bytes);
            out.extend_from_slice(&ciphertext);
            Ok(out)
        }

        fn open(&self, sealed: &[u8]) -> Result<Vec<u8>, TransportError> {
            if sealed.len() < NONCE_LEN {
                return Err(TransportError::Cipher(format!(
                    "sealed frame shorter than nonce ({} bytes)",
                    sealed.len()
                )));
            }
            let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
            self.aead
                .decrypt(Nonce::from_slice(nonce), ciphertext)
                .map_err(|_| {
                    TransportError::Cipher("authentication failed".into())
                })
        }
    }
}

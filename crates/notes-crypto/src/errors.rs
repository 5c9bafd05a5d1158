//! Crypto error types.

use thiserror::Error;

/// Token and note-content cryptography errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CryptoError {
    /// Token is structurally invalid (segment count, encoding, JSON, header).
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// Token signature did not verify under the shared secret.
    #[error("Token signature verification failed")]
    BadSignature,

    /// Token expiration is at or before the evaluation time.
    #[error("Token expired at {expired_at} (now {now})")]
    Expired {
        /// Expiration claim (epoch seconds)
        expired_at: u64,
        /// Evaluation time (epoch seconds)
        now: u64,
    },

    /// A token cannot be issued for an empty subject.
    #[error("Token subject must not be empty")]
    EmptySubject,

    /// Ciphertext is not valid for the configured key (wrong key, corruption,
    /// tampering, or bad encoding).
    #[error("Decryption failed")]
    DecryptionFailure,

    /// Token header or claims could not be encoded as JSON.
    #[error("Token serialization failed: {0}")]
    Serialization(String),

    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Key material or secret is unusable. Fatal at startup.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl CryptoError {
    /// True for errors that must prevent process startup.
    pub fn is_configuration(&self) -> bool {
        matches!(self, CryptoError::Configuration(_))
    }
}

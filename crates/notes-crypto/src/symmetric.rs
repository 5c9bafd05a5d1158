//! # Note Content Encryption
//!
//! AES-GCM with a fresh random 96-bit nonce per call. The key size (16, 24 or
//! 32 bytes) selects AES-128, AES-192 or AES-256.
//!
//! ## Stored Format
//!
//! ```text
//! base64( nonce[12] || ciphertext[n] || tag[16] )
//! ```
//!
//! Standard base64 alphabet with padding. This replaces an older unauthenticated
//! single-block-mode format; blobs written in that format cannot be read here.

use crate::CryptoError;
use aes_gcm::{
    aead::{consts::U12, Aead, KeyInit},
    aes::Aes192,
    Aes128Gcm, Aes256Gcm, AesGcm,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use zeroize::Zeroizing;

type Aes192Gcm = AesGcm<Aes192, U12>;
type GcmNonce = aes_gcm::Nonce<U12>;

/// Nonce length in bytes.
pub const NONCE_LEN: usize = 12;

/// Authentication tag length in bytes.
pub const TAG_LEN: usize = 16;

/// Key lengths accepted by the codec.
pub const ACCEPTED_KEY_LENGTHS: [usize; 3] = [16, 24, 32];

/// Prefix marking base64-encoded key material in configuration.
pub const BASE64_KEY_PREFIX: &str = "base64:";

/// AES variant chosen by key length.
enum GcmCipher {
    Aes128(Aes128Gcm),
    Aes192(Aes192Gcm),
    Aes256(Aes256Gcm),
}

impl GcmCipher {
    fn encrypt(&self, nonce: &GcmNonce, plaintext: &[u8]) -> Result<Vec<u8>, aes_gcm::Error> {
        match self {
            GcmCipher::Aes128(c) => c.encrypt(nonce, plaintext),
            GcmCipher::Aes192(c) => c.encrypt(nonce, plaintext),
            GcmCipher::Aes256(c) => c.encrypt(nonce, plaintext),
        }
    }

    fn decrypt(&self, nonce: &GcmNonce, ciphertext: &[u8]) -> Result<Vec<u8>, aes_gcm::Error> {
        match self {
            GcmCipher::Aes128(c) => c.decrypt(nonce, ciphertext),
            GcmCipher::Aes192(c) => c.decrypt(nonce, ciphertext),
            GcmCipher::Aes256(c) => c.decrypt(nonce, ciphertext),
        }
    }

    fn key_bits(&self) -> usize {
        match self {
            GcmCipher::Aes128(_) => 128,
            GcmCipher::Aes192(_) => 192,
            GcmCipher::Aes256(_) => 256,
        }
    }
}

/// Encrypts and decrypts note content under one process-wide key.
///
/// Built once at startup and shared read-only (`Arc<EncryptionCodec>`).
/// A codec value always holds a valid key, so the "uninitialized key" failure
/// can only happen at construction.
pub struct EncryptionCodec {
    cipher: GcmCipher,
}

impl EncryptionCodec {
    /// Create from raw key bytes.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Configuration` unless the key is 16, 24 or 32 bytes.
    pub fn new(key: &[u8]) -> Result<Self, CryptoError> {
        let invalid = |_| CryptoError::Configuration("AES key rejected by cipher".into());
        let cipher = match key.len() {
            16 => GcmCipher::Aes128(Aes128Gcm::new_from_slice(key).map_err(invalid)?),
            24 => GcmCipher::Aes192(Aes192Gcm::new_from_slice(key).map_err(invalid)?),
            32 => GcmCipher::Aes256(Aes256Gcm::new_from_slice(key).map_err(invalid)?),
            other => {
                return Err(CryptoError::Configuration(format!(
                    "AES key must be 16, 24, or 32 bytes, got {other}"
                )))
            }
        };
        Ok(Self { cipher })
    }

    /// Create from configuration text.
    ///
    /// Plain text is used as its UTF-8 bytes. Text starting with `base64:` is
    /// decoded first, for binary keys.
    pub fn from_key_material(material: &str) -> Result<Self, CryptoError> {
        if material.is_empty() {
            return Err(CryptoError::Configuration("encryption key is not set".into()));
        }
        let bytes = match material.strip_prefix(BASE64_KEY_PREFIX) {
            Some(encoded) => Zeroizing::new(STANDARD.decode(encoded.trim()).map_err(|e| {
                CryptoError::Configuration(format!("encryption key is not valid base64: {e}"))
            })?),
            None => Zeroizing::new(material.as_bytes().to_vec()),
        };
        Self::new(&bytes)
    }

    /// AES key size in bits.
    pub fn key_bits(&self) -> usize {
        self.cipher.key_bits()
    }

    /// Encrypt plaintext into a printable blob.
    ///
    /// Every call draws a new nonce, so equal plaintexts never produce equal blobs.
    pub fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let sealed = self
            .cipher
            .encrypt(GcmNonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

        let mut blob = Vec::with_capacity(NONCE_LEN + sealed.len());
        blob.extend_from_slice(&nonce);
        blob.extend_from_slice(&sealed);
        Ok(STANDARD.encode(blob))
    }

    /// Decrypt a blob produced by [`EncryptionCodec::encrypt`] under the same key.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::DecryptionFailure` for bad encoding, truncated
    /// input, a failed tag check, or non-UTF-8 plaintext.
    pub fn decrypt(&self, blob: &str) -> Result<String, CryptoError> {
        let raw = STANDARD
            .decode(blob.trim())
            .map_err(|_| CryptoError::DecryptionFailure)?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::DecryptionFailure);
        }

        let (nonce, sealed) = raw.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(GcmNonce::from_slice(nonce), sealed)
            .map_err(|_| CryptoError::DecryptionFailure)?;

        String::from_utf8(plaintext).map_err(|_| CryptoError::DecryptionFailure)
    }
}

impl std::fmt::Debug for EncryptionCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionCodec")
            .field("cipher", &format_args!("AES-{}-GCM", self.key_bits()))
            .field("key", &"[REDACTED]")
            .finish()
    }
}

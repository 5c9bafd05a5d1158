//! Argon2id password verifiers.
//!
//! Verifiers are PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`),
//! so parameters travel with each hash and can be raised later without
//! invalidating existing accounts.

use crate::ports::PasswordHasher;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Argon2,
};
use rand::RngCore;

/// Salt length in bytes.
const SALT_LENGTH: usize = 16;

/// Argon2id hasher with a fresh random salt per password.
#[derive(Clone, Default)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    /// Custom cost parameters (memory in KiB, iterations, lanes).
    pub fn with_params(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, String> {
        let params = argon2::Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| format!("Failed to create Argon2 params: {}", e))?;
        Ok(Self {
            argon2: Argon2::new(argon2::Algorithm::Argon2id, argon2::Version::V0x13, params),
        })
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, password: &str) -> Result<String, String> {
        let mut salt_bytes = [0u8; SALT_LENGTH];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| e.to_string())?;

        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| e.to_string())
    }

    fn verify(&self, password: &str, verifier: &str) -> bool {
        match PasswordHash::new(verifier) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

impl std::fmt::Debug for Argon2PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Argon2PasswordHasher").finish_non_exhaustive()
    }
}

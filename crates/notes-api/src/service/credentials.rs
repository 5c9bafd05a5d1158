//! Signup and login.
//!
//! `CredentialService` is the only component that mints tokens. Password
//! hashing is CPU bound and runs on the blocking pool.

use crate::domain::{AuthError, Identity, NewIdentity, StoreError, DEFAULT_ROLE};
use crate::ports::{IdentityStore, PasswordHasher, TimeSource};
use notes_crypto::TokenCodec;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{error, info};

/// Password behind the verifier checked when a login names no identity.
const DECOY_PASSWORD: &str = "decoy-password-for-unknown-identities";

/// Orchestrates identity creation, credential checks and token issuance
pub struct CredentialService {
    identities: Arc<dyn IdentityStore>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<TokenCodec>,
    clock: Arc<dyn TimeSource>,
    decoy: OnceCell<String>,
}

impl CredentialService {
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<TokenCodec>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            identities,
            hasher,
            tokens,
            clock,
            decoy: OnceCell::new(),
        }
    }

    /// Register a new identity with the default role and return a token for it.
    ///
    /// Fails with `IdentityTaken` if the username (or the given email) is
    /// already registered.
    pub async fn signup(
        &self,
        username: &str,
        password: &str,
        email: Option<&str>,
    ) -> Result<String, AuthError> {
        validate_credentials(username, password)?;
        let email = email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(String::from);
        if let Some(email) = &email {
            if !email.contains('@') {
                return Err(AuthError::InvalidInput("email is not valid".into()));
            }
        }

        if self.identities.find_by_username(username).await?.is_some() {
            info!(outcome = "identity_taken", "signup rejected");
            return Err(AuthError::IdentityTaken);
        }

        let password_hash = self.hash_password(password).await?;
        let identity = NewIdentity {
            username: username.to_string(),
            email,
            password_hash,
            roles: BTreeSet::from([DEFAULT_ROLE.to_string()]),
            created_at: self.clock.now_utc(),
        };

        let identity = match self.identities.insert(identity).await {
            Ok(identity) => identity,
            // Lost a race with a concurrent signup, or the email is taken.
            Err(StoreError::Duplicate(_)) => {
                info!(outcome = "identity_taken", "signup rejected");
                return Err(AuthError::IdentityTaken);
            }
            Err(e) => return Err(e.into()),
        };

        info!(outcome = "registered", "signup succeeded");
        self.issue_for(&identity)
    }

    /// Verify a username/password pair and return a fresh token.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, AuthError> {
        validate_credentials(username, password)?;

        let verifier = match self.identities.find_by_username(username).await? {
            Some(identity) => identity.password_hash,
            None => {
                // Same verification cost as a known identity.
                let decoy = self.decoy_verifier().await?;
                self.verify_password(password, decoy).await?;
                info!(outcome = "invalid_credentials", "login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        if !self.verify_password(password, verifier).await? {
            info!(outcome = "invalid_credentials", "login rejected");
            return Err(AuthError::InvalidCredentials);
        }

        let Some(identity) = self.identities.find_by_username(username).await? else {
            error!("identity vanished between credential check and token issuance");
            return Err(AuthError::IdentityMissing);
        };

        info!(outcome = "authenticated", "login succeeded");
        self.issue_for(&identity)
    }

    fn issue_for(&self, identity: &Identity) -> Result<String, AuthError> {
        Ok(self
            .tokens
            .issue(&identity.username, identity.roles.iter().cloned(), self.clock.now())?)
    }

    /// Verifier produced once by the configured hasher, so its cost
    /// parameters match those of stored identities.
    async fn decoy_verifier(&self) -> Result<String, AuthError> {
        self.decoy
            .get_or_try_init(|| self.hash_password(DECOY_PASSWORD))
            .await
            .cloned()
    }

    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))?
            .map_err(AuthError::Hashing)
    }

    async fn verify_password(&self, password: &str, verifier: String) -> Result<bool, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &verifier))
            .await
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }
}

fn validate_credentials(username: &str, password: &str) -> Result<(), AuthError> {
    if username.trim().is_empty() {
        return Err(AuthError::InvalidInput("username must not be blank".into()));
    }
    if password.is_empty() {
        return Err(AuthError::InvalidInput("password must not be blank".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{Argon2PasswordHasher, InMemoryIdentityStore};
    use crate::domain::ROLE_USER;
    use crate::ports::FixedTimeSource;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    const NOW: u64 = 1_700_000_000;

    fn codec() -> Arc<TokenCodec> {
        Arc::new(TokenCodec::new(&[42u8; 32], Duration::from_secs(3600)).unwrap())
    }

    fn service_with(identities: Arc<dyn IdentityStore>) -> CredentialService {
        CredentialService::new(
            identities,
            Arc::new(Argon2PasswordHasher::with_params(1024, 1, 1).unwrap()),
            codec(),
            Arc::new(FixedTimeSource(NOW)),
        )
    }

    fn service() -> CredentialService {
        service_with(Arc::new(InMemoryIdentityStore::new()))
    }

    #[tokio::test]
    async fn test_signup_returns_token_with_default_role() {
        let token = service().signup("alice", "pw", None).await.unwrap();

        let claims = codec().parse_at(&token, NOW).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.roles, BTreeSet::from([ROLE_USER.to_string()]));
        assert_eq!(claims.iat, NOW);
    }

    #[tokio::test]
    async fn test_second_signup_is_identity_taken() {
        let service = service();
        service.signup("alice", "pw", None).await.unwrap();

        let err = service.signup("alice", "otherpw", None).await.unwrap_err();
        assert!(matches!(err, AuthError::IdentityTaken));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_identity_taken() {
        let service = service();
        service
            .signup("alice", "pw", Some("shared@example.com"))
            .await
            .unwrap();

        let err = service
            .signup("bob", "pw", Some("shared@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::IdentityTaken));
    }

    #[tokio::test]
    async fn test_stored_verifier_is_not_the_password() {
        let store = Arc::new(InMemoryIdentityStore::new());
        service_with(store.clone())
            .signup("alice", "hunter2", None)
            .await
            .unwrap();

        let identity = store.find_by_username("alice").await.unwrap().unwrap();
        assert!(identity.password_hash.starts_with("$argon2id$"));
        assert!(!identity.password_hash.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_login() {
        let service = service();
        service.signup("alice", "pw", None).await.unwrap();

        let token = service.login("alice", "pw").await.unwrap();
        assert!(codec().is_valid_for_at(&token, "alice", NOW));

        assert!(matches!(
            service.login("alice", "wrong").await.unwrap_err(),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            service.login("nobody", "pw").await.unwrap_err(),
            AuthError::InvalidCredentials
        ));
    }

    #[tokio::test]
    async fn test_blank_input_rejected() {
        let service = service();
        assert!(matches!(
            service.signup("  ", "pw", None).await.unwrap_err(),
            AuthError::InvalidInput(_)
        ));
        assert!(matches!(
            service.signup("alice", "", None).await.unwrap_err(),
            AuthError::InvalidInput(_)
        ));
        assert!(matches!(
            service.signup("alice", "pw", Some("not-an-email")).await.unwrap_err(),
            AuthError::InvalidInput(_)
        ));
        assert!(matches!(
            service.login("", "pw").await.unwrap_err(),
            AuthError::InvalidInput(_)
        ));
    }

    /// Argon2 hasher that counts hash and verify calls.
    struct CountingHasher {
        inner: Argon2PasswordHasher,
        hashes: AtomicUsize,
        verifies: AtomicUsize,
    }

    impl PasswordHasher for CountingHasher {
        fn hash(&self, password: &str) -> Result<String, String> {
            self.hashes.fetch_add(1, Ordering::SeqCst);
            self.inner.hash(password)
        }

        fn verify(&self, password: &str, verifier: &str) -> bool {
            self.verifies.fetch_add(1, Ordering::SeqCst);
            self.inner.verify(password, verifier)
        }
    }

    #[tokio::test]
    async fn test_unknown_username_still_runs_verification() {
        let hasher = Arc::new(CountingHasher {
            inner: Argon2PasswordHasher::with_params(1024, 1, 1).unwrap(),
            hashes: AtomicUsize::new(0),
            verifies: AtomicUsize::new(0),
        });
        let service = CredentialService::new(
            Arc::new(InMemoryIdentityStore::new()),
            hasher.clone(),
            codec(),
            Arc::new(FixedTimeSource(NOW)),
        );

        for _ in 0..2 {
            assert!(matches!(
                service.login("nobody", "pw").await.unwrap_err(),
                AuthError::InvalidCredentials
            ));
        }
        assert_eq!(hasher.verifies.load(Ordering::SeqCst), 2);
        // Decoy verifier is built once and reused.
        assert_eq!(hasher.hashes.load(Ordering::SeqCst), 1);

        // The decoy password does not log anyone in.
        assert!(matches!(
            service.login("nobody", DECOY_PASSWORD).await.unwrap_err(),
            AuthError::InvalidCredentials
        ));
    }

    /// Serves the first lookup from the inner store, then forgets everyone.
    struct VanishingStore {
        inner: InMemoryIdentityStore,
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl IdentityStore for VanishingStore {
        async fn find_by_username(&self, username: &str) -> Result<Option<Identity>, StoreError> {
            if self.lookups.fetch_add(1, Ordering::SeqCst) == 0 {
                self.inner.find_by_username(username).await
            } else {
                Ok(None)
            }
        }

        async fn insert(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
            self.inner.insert(identity).await
        }
    }

    #[tokio::test]
    async fn test_identity_missing_after_verification() {
        let hasher = Argon2PasswordHasher::with_params(1024, 1, 1).unwrap();
        let inner = InMemoryIdentityStore::new();
        inner
            .insert(NewIdentity {
                username: "alice".into(),
                email: None,
                password_hash: hasher.hash("pw").unwrap(),
                roles: BTreeSet::from([ROLE_USER.to_string()]),
                created_at: chrono::Utc::now(),
            })
            .await
            .unwrap();

        let service = service_with(Arc::new(VanishingStore {
            inner,
            lookups: AtomicUsize::new(0),
        }));
        assert!(matches!(
            service.login("alice", "pw").await.unwrap_err(),
            AuthError::IdentityMissing
        ));
    }
}

//! Notes API services and the server runtime.
//!
//! `NotesServer::new` is the single startup checkpoint: it validates the
//! configuration and builds both codecs, and any failure there is fatal.

pub mod credentials;
pub mod notes;

pub use credentials::CredentialService;
pub use notes::NoteService;

use crate::adapters::{Argon2PasswordHasher, InMemoryIdentityStore, InMemoryNoteStore};
use crate::domain::{ServerError, ServiceConfig};
use crate::middleware::{AuthLayer, GateState};
use crate::ports::{IdentityStore, NoteStore, PasswordHasher, SystemTimeSource, TimeSource};
use crate::router::{build_router, AppState};
use axum::Router;
use notes_crypto::{EncryptionCodec, TokenCodec};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Outbound collaborators the server is wired with
#[derive(Clone)]
pub struct Collaborators {
    pub identities: Arc<dyn IdentityStore>,
    pub notes: Arc<dyn NoteStore>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub clock: Arc<dyn TimeSource>,
}

impl Collaborators {
    /// In-memory stores, Argon2id verifiers and the system clock.
    pub fn in_memory() -> Self {
        Self {
            identities: Arc::new(InMemoryIdentityStore::new()),
            notes: Arc::new(InMemoryNoteStore::new()),
            hasher: Arc::new(Argon2PasswordHasher::default()),
            clock: Arc::new(SystemTimeSource),
        }
    }
}

/// Notes API server
pub struct NotesServer {
    config: ServiceConfig,
    state: AppState,
    auth: AuthLayer,
}

impl NotesServer {
    /// Server backed by in-memory collaborators.
    pub fn new(config: ServiceConfig) -> Result<Self, ServerError> {
        Self::with_collaborators(config, Collaborators::in_memory())
    }

    pub fn with_collaborators(
        config: ServiceConfig,
        collaborators: Collaborators,
    ) -> Result<Self, ServerError> {
        config.validate()?;

        let tokens = Arc::new(TokenCodec::new(
            config.auth.token_secret.as_bytes(),
            config.auth.token_ttl,
        )?);
        let cipher = Arc::new(EncryptionCodec::from_key_material(&config.encryption.key)?);
        info!(
            key_bits = cipher.key_bits(),
            token_ttl_secs = config.auth.token_ttl.as_secs(),
            "codecs initialised"
        );

        let Collaborators {
            identities,
            notes,
            hasher,
            clock,
        } = collaborators;

        let state = AppState {
            credentials: Arc::new(CredentialService::new(
                Arc::clone(&identities),
                hasher,
                Arc::clone(&tokens),
                Arc::clone(&clock),
            )),
            notes: Arc::new(NoteService::new(
                notes,
                Arc::clone(&identities),
                cipher,
                Arc::clone(&clock),
            )),
        };
        let auth = AuthLayer::new(GateState::new(
            tokens,
            identities,
            clock,
            config.auth.exempt_prefixes.clone(),
        ));

        Ok(Self {
            config,
            state,
            auth,
        })
    }

    /// Routes with the full middleware stack.
    pub fn router(&self) -> Router {
        build_router(self.state.clone(), self.auth.clone(), &self.config.cors)
    }

    /// Bind the configured address and serve until `shutdown` resolves.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = self.config.http_addr();
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Bind(format!("{addr}: {e}")))?;
        self.serve_with_listener(listener, shutdown).await
    }

    /// Serve on an already bound listener until `shutdown` resolves.
    pub async fn serve_with_listener<F>(
        self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!(addr = ?listener.local_addr().ok(), "notes API listening");
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("notes API stopped");
        Ok(())
    }
}

impl std::fmt::Debug for NotesServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotesServer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ConfigError;
    use notes_crypto::CryptoError;

    fn config() -> ServiceConfig {
        let mut config = ServiceConfig::default();
        config.auth.token_secret = "k".repeat(32);
        config.encryption.key = "base64:MDEyMzQ1Njc4OWFiY2RlZg==".into();
        config
    }

    #[test]
    fn test_new_with_valid_config() {
        assert!(NotesServer::new(config()).is_ok());
    }

    #[test]
    fn test_missing_secret_is_fatal() {
        let mut config = config();
        config.auth.token_secret.clear();
        assert!(matches!(
            NotesServer::new(config),
            Err(ServerError::Config(ConfigError::MissingValue(_)))
        ));
    }

    #[test]
    fn test_bad_key_length_is_fatal() {
        let mut config = config();
        config.encryption.key = "base64:AAAA".into();
        let err = NotesServer::new(config).unwrap_err();
        assert!(matches!(
            err,
            ServerError::Config(ConfigError::Crypto(CryptoError::Configuration(_)))
        ));
    }

    #[test]
    fn test_debug_does_not_leak_secrets() {
        let server = NotesServer::new(config()).unwrap();
        let rendered = format!("{server:?}");
        assert!(!rendered.contains("kkkkkkkk"));
        assert!(!rendered.contains("MDEyMzQ1Njc4OWFiY2RlZg"));
    }

    #[tokio::test]
    async fn test_serve_stops_on_shutdown() {
        let server = NotesServer::new(config()).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        server
            .serve_with_listener(listener, async {})
            .await
            .unwrap();
    }
}

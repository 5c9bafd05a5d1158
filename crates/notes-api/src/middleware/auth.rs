//! Authentication gate.
//!
//! Runs once per request, in order:
//!
//! 1. exempt path prefixes pass through untouched
//! 2. `Authorization: Bearer <token>` is extracted
//! 3. the token is parsed and verified against the current time
//! 4. the token subject must still have an identity record
//! 5. a [`SecurityContext`] is installed unless one is already present
//!
//! The gate never produces a response of its own. Any failure simply leaves
//! the request without a context, and protected handlers reject it with 401
//! through the `SecurityContext` extractor.

use crate::domain::SecurityContext;
use crate::ports::{IdentityStore, TimeSource};
use axum::{
    body::Body,
    http::{header, HeaderMap, Request},
    response::Response,
};
use notes_crypto::{CryptoError, TokenCodec};
use std::sync::Arc;
use tower::{Layer, Service};
use tracing::{debug, warn};

const BEARER_PREFIX: &str = "Bearer ";

/// Why the gate did not install a context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Path is on the exemption list
    Exempt,
    /// A context was already installed for this request
    AlreadyAuthenticated,
    /// No `Authorization` header
    MissingHeader,
    /// Header present but not `Bearer <token>`
    MalformedHeader,
    /// Token structurally invalid
    MalformedToken,
    /// Signature did not verify
    BadSignature,
    /// Token past its expiration
    Expired,
    /// Subject has no identity record
    UnknownIdentity,
    /// Identity lookup failed
    LookupFailed,
}

impl GateOutcome {
    /// Stable label for audit logs.
    pub fn reason(self) -> &'static str {
        match self {
            GateOutcome::Exempt => "exempt_path",
            GateOutcome::AlreadyAuthenticated => "already_authenticated",
            GateOutcome::MissingHeader => "missing_header",
            GateOutcome::MalformedHeader => "malformed_header",
            GateOutcome::MalformedToken => "malformed_token",
            GateOutcome::BadSignature => "bad_signature",
            GateOutcome::Expired => "expired",
            GateOutcome::UnknownIdentity => "unknown_identity",
            GateOutcome::LookupFailed => "lookup_failed",
        }
    }

    fn from_token_error(error: &CryptoError) -> Self {
        match error {
            CryptoError::BadSignature => GateOutcome::BadSignature,
            CryptoError::Expired { .. } => GateOutcome::Expired,
            _ => GateOutcome::MalformedToken,
        }
    }
}

/// Shared, read-only gate collaborators
pub struct GateState {
    tokens: Arc<TokenCodec>,
    identities: Arc<dyn IdentityStore>,
    clock: Arc<dyn TimeSource>,
    exempt_prefixes: Vec<String>,
}

impl GateState {
    pub fn new(
        tokens: Arc<TokenCodec>,
        identities: Arc<dyn IdentityStore>,
        clock: Arc<dyn TimeSource>,
        exempt_prefixes: Vec<String>,
    ) -> Self {
        Self {
            tokens,
            identities,
            clock,
            exempt_prefixes,
        }
    }

    /// `true` if `path` starts with any exempt prefix.
    pub fn is_exempt(&self, path: &str) -> bool {
        self.exempt_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Stages 2-4: derive a context from the request headers.
    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<SecurityContext, GateOutcome> {
        let token = bearer_token(headers)?;

        let claims = self
            .tokens
            .parse_at(token, self.clock.now())
            .map_err(|e| GateOutcome::from_token_error(&e))?;

        match self.identities.find_by_username(&claims.sub).await {
            Ok(Some(_)) => Ok(SecurityContext::new(claims.sub, claims.roles)),
            Ok(None) => Err(GateOutcome::UnknownIdentity),
            Err(e) => {
                warn!(error = %e, "identity lookup failed during authentication");
                Err(GateOutcome::LookupFailed)
            }
        }
    }
}

impl std::fmt::Debug for GateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateState")
            .field("exempt_prefixes", &self.exempt_prefixes)
            .finish_non_exhaustive()
    }
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, GateOutcome> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(GateOutcome::MissingHeader)?;
    let value = value.to_str().map_err(|_| GateOutcome::MalformedHeader)?;
    match value.strip_prefix(BEARER_PREFIX) {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(GateOutcome::MalformedHeader),
    }
}

/// Authentication layer
#[derive(Clone)]
pub struct AuthLayer {
    state: Arc<GateState>,
}

impl AuthLayer {
    pub fn new(state: GateState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }
}

impl<S> Layer<S> for AuthLayer {
    type Service = AuthenticationGate<S>;

    fn layer(&self, inner: S) -> Self::Service {
        AuthenticationGate {
            inner,
            state: Arc::clone(&self.state),
        }
    }
}

/// Authentication gate service
#[derive(Clone)]
pub struct AuthenticationGate<S> {
    inner: S,
    state: Arc<GateState>,
}

impl<S> Service<Request<Body>> for AuthenticationGate<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<Body>) -> Self::Future {
        let state = Arc::clone(&self.state);
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let outcome = if state.is_exempt(req.uri().path()) {
                Err(GateOutcome::Exempt)
            } else if req.extensions().get::<SecurityContext>().is_some() {
                Err(GateOutcome::AlreadyAuthenticated)
            } else {
                state.authenticate(req.headers()).await
            };

            match outcome {
                Ok(context) => {
                    debug!(outcome = "authenticated", "authentication gate");
                    req.extensions_mut().insert(context);
                }
                Err(outcome) => {
                    debug!(outcome = outcome.reason(), "authentication gate");
                }
            }

            inner.call(req).await
        })
    }
}

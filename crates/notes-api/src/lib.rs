// Allow missing docs for internal items
#![allow(missing_docs)]

//! Notes API - authenticated, encrypted note storage over HTTP.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         notes-api                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  CORS → RequestSpan → AuthenticationGate → Router            │
//! │                            │                 │               │
//! │                   SecurityContext      handlers              │
//! │                   (request extension)    │                   │
//! │                                          ▼                   │
//! │              CredentialService      NoteService              │
//! │               │        │              │        │             │
//! │          TokenCodec  PasswordHasher  EncryptionCodec         │
//! │                    \       │        /                        │
//! │                 IdentityStore   NoteStore   TimeSource       │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The gate is fail-open: a missing, malformed, forged or expired token just
//! leaves the request without a `SecurityContext`. Protected handlers take
//! the context as an extractor and answer 401 when it is absent.
//!
//! # Usage
//!
//! ```ignore
//! use notes_api::{NotesServer, ServiceConfig};
//!
//! let config = ServiceConfig::from_env()?;
//! let server = NotesServer::new(config)?;
//! server.serve(shutdown_signal()).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod middleware;
pub mod ports;
pub mod router;
pub mod service;

// Re-exports
pub use domain::config::{AuthConfig, CorsConfig, EncryptionConfig, HttpConfig};
pub use domain::{
    ApiError, ApiResult, AuthError, ConfigError, NoteError, Permission, SecurityContext,
    ServerError, ServiceConfig, StoreError,
};
pub use router::{build_router, AppState};
pub use service::{Collaborators, CredentialService, NoteService, NotesServer};

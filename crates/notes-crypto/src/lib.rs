//! # Notes Crypto - Token Signing and Content Encryption
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `token` | HMAC-SHA256 (HS256) | Stateless bearer tokens |
//! | `symmetric` | AES-128/192/256-GCM | Note content at rest |
//!
//! ## Security Properties
//!
//! - **Tokens**: signature + expiration embedded, verified in constant time
//! - **Content**: fresh 96-bit random nonce per encryption, tag checked on decrypt
//! - **Key material**: zeroized on drop, redacted from `Debug`
//!
//! Both codecs are immutable after construction and are meant to be shared
//! across requests behind an `Arc`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod symmetric;
pub mod token;

// Re-exports
pub use errors::CryptoError;
pub use symmetric::{EncryptionCodec, ACCEPTED_KEY_LENGTHS};
pub use token::{unix_now, Claims, TokenCodec, MIN_SECRET_LEN};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

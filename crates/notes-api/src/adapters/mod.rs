//! Adapters for the notes API.
//!
//! Concrete implementations of the outbound ports and the mapping of service
//! errors onto HTTP responses.

pub mod error_conversions;
pub mod memory;
pub mod password;

pub use memory::{InMemoryIdentityStore, InMemoryNoteStore};
pub use password::Argon2PasswordHasher;

//! # Ports Layer
//!
//! - `outbound.rs` - Driven ports (collaborators required by the service)

pub mod outbound;

pub use outbound::{
    FixedTimeSource, IdentityStore, NoteStore, PasswordHasher, SystemTimeSource, TimeSource,
};

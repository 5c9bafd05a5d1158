//! Middleware stack for the notes API.
//!
//! Layer order (outermost first): CORS → request span → authentication gate
//! → routes.

pub mod auth;
pub mod cors;
pub mod tracing;

pub use auth::{AuthLayer, AuthenticationGate, GateOutcome, GateState};
pub use cors::create_cors_layer;
pub use tracing::{RequestSpanLayer, REQUEST_ID_HEADER};

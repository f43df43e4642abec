//! Kiosk HTTP layer.
//!
//! Serves the landing page, takes questions in over HTMX form posts, and
//! streams rendered answer sections back over SSE. `kiosk_router()` returns
//! a plain `Router`, so it can be mounted on any axum server instance.

pub mod error;
pub mod router;
pub mod server;
pub mod sse;
pub mod types;

pub use error::ApiError;
pub use router::kiosk_router;
pub use server::{KioskServer, ServerError};
pub use types::AppState;

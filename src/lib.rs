//! Kiosk Q&A service: answers visitor questions with conference-talk
//! quotes and scripture passages, streamed to the page as each search
//! agent finishes.

pub mod agent;
pub mod api;
pub mod config;
pub mod headshots;
pub mod render;
pub mod session;
pub mod stream;

use tracing_subscriber::EnvFilter;

/// Initialize tracing from `RUST_LOG`, falling back to the service default.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

//! Kiosk HTTP server lifecycle.
//!
//! Pattern: bind → spawn background task → return handle with shutdown
//! channel. `run` wraps the same lifecycle for the foreground binary,
//! waiting on ctrl-c and draining gracefully before exit.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderValue};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::agent::Agent;
use crate::config::Config;
use crate::session::{spawn_reaper, REAPER_INTERVAL};

use super::router::kiosk_router;
use super::types::AppState;

/// Errors from the server lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(std::io::Error),
}

// ═══════════════════════════════════════════════════════════
// Server handle
// ═══════════════════════════════════════════════════════════

/// Handle to a running kiosk server.
pub struct KioskServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
    reaper: JoinHandle<()>,
}

impl KioskServer {
    /// Shut down the server gracefully.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("kiosk server shutdown signal sent");
        }
        self.reaper.abort();
    }

    /// Waits for the server task to finish after `shutdown`.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

// ═══════════════════════════════════════════════════════════
// Server lifecycle
// ═══════════════════════════════════════════════════════════

/// Start the kiosk server on `bind_addr` in a background task.
pub async fn start(state: AppState, bind_addr: &str) -> Result<KioskServer, ServerError> {
    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|source| ServerError::Bind {
            addr: bind_addr.to_string(),
            source,
        })?;
    let addr = listener.local_addr().map_err(ServerError::Serve)?;

    let reaper = spawn_reaper(Arc::clone(&state.sessions), REAPER_INTERVAL);
    let app = secured(kiosk_router(state));

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("kiosk server received shutdown signal");
        };

        tracing::info!(%addr, "kiosk server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("kiosk server error: {e}");
        }

        tracing::info!("kiosk server stopped");
    });

    Ok(KioskServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
        reaper,
    })
}

/// Run the kiosk server in the foreground until ctrl-c, then drain.
pub async fn run(config: &Config, agent: Agent) -> Result<(), ServerError> {
    let state = AppState::new(agent, &config.assets_base_url);
    let mut server = start(state, &config.bind_addr).await?;

    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown requested");
    server.shutdown();
    server.join().await;
    Ok(())
}

/// Response headers for a public kiosk: no MIME sniffing, and nothing
/// cached between visitors unless a handler says otherwise.
fn secured(router: Router) -> Router {
    router
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

//! Server lifecycle management
//!
//! Owns the viewer-facing listener: the WebSocket endpoint, a health probe,
//! and graceful shutdown on SIGINT/SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use terraview_core::upstream::ReadingSource;
use terraview_core::Config;

use crate::ws::{self, ReadingHub};

/// Shared state handed to every connection handler
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<ReadingHub>,
    pub source: Arc<dyn ReadingSource>,
    pub poll_interval: Duration,
}

/// Relay server - accepts viewer connections and owns the broadcast hub
pub struct RelayServer {
    config: Config,
    state: AppState,
}

impl RelayServer {
    /// Create a new server instance
    pub fn new(config: Config, source: Arc<dyn ReadingSource>, hub: Arc<ReadingHub>) -> Self {
        let poll_interval = config.poll_interval();
        Self {
            config,
            state: AppState {
                hub,
                source,
                poll_interval,
            },
        }
    }

    /// Build the viewer-facing router
    pub fn router(state: AppState) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/ws", get(ws::websocket_handler))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Bind the listener and serve until a shutdown signal arrives
    pub async fn start(self) -> anyhow::Result<()> {
        let listen_address = self.config.listen_address();
        let addr: SocketAddr = listen_address
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address '{listen_address}': {e}"))?;

        let listener = TcpListener::bind(addr).await?;
        info!("Relay listening on {}", addr);

        axum::serve(listener, Self::router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Relay shut down gracefully");
        Ok(())
    }
}

/// Basic health check (always returns OK if the server is running)
async fn health_check() -> impl IntoResponse {
    "OK"
}

/// Wait for a shutdown signal (SIGTERM or SIGINT/Ctrl+C)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { info!("Received Ctrl+C"); }
        () = terminate => { info!("Received SIGTERM"); }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use terraview_core::models::{AccountId, Reading, Terrarium, TerrariumId};
    use tower::util::ServiceExt;

    struct NullSource;

    #[async_trait]
    impl ReadingSource for NullSource {
        async fn fetch_viewer_terrariums(&self, _account_id: AccountId) -> Vec<Terrarium> {
            Vec::new()
        }

        async fn fetch_latest_reading(&self, _terrarium_id: TerrariumId) -> Option<Reading> {
            None
        }
    }

    fn test_router() -> Router {
        RelayServer::router(AppState {
            hub: Arc::new(ReadingHub::new()),
            source: Arc::new(NullSource),
            poll_interval: Duration::from_secs(10),
        })
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let response = test_router()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_ws_requires_account_parameter() {
        let response = test_router()
            .oneshot(Request::builder().uri("/ws").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

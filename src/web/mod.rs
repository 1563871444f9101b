//! Web server module.

mod handlers;

use crate::config::ServerConfig;
use crate::dashboard::Dashboard;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub dashboard: Arc<Dashboard>,
}

/// Web server hosting the dashboard page.
pub struct Server {
    state: AppState,
}

impl Server {
    pub fn new(config: ServerConfig, dashboard: Arc<Dashboard>) -> Self {
        Self {
            state: AppState { config, dashboard },
        }
    }

    /// Build the router with all routes.
    fn routes(&self) -> Router {
        router(self.state.clone())
    }

    /// Start the server on the configured port. Returns after Ctrl-C, once
    /// every widget task has been told to stop.
    pub async fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.state.config.http_port));
        let router = self.routes();

        tracing::info!("Web server listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        self.state.dashboard.shutdown().await;
        tracing::info!("Web server stopped");
        Ok(())
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any);

    Router::new()
        // Dashboard
        .route("/", get(handlers::handle_dashboard))
        .route("/period", post(handlers::handle_global_period))
        .route("/containers/{id}", get(handlers::handle_container))
        .route("/containers/{id}/width", post(handlers::handle_resize))
        // Widget interactions
        .route("/widgets/{id}", delete(handlers::handle_remove))
        .route("/widgets/{id}/period", post(handlers::handle_widget_period))
        .route("/widgets/{id}/reload", post(handlers::handle_reload))
        .route("/widgets/{id}/edit", get(handlers::handle_edit))
        // Static assets
        .route("/static/timeline.css", get(handlers::handle_stylesheet))
        .route("/favicon.ico", get(handlers::handle_favicon))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(64 * 1024))
        .with_state(state)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

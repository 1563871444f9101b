//! uptrail - uptime timeline dashboard
//!
//! Renders monitor uptime histories as compact bar timelines, one widget per
//! monitor or one batch container for many, and serves them as a web page.

mod batch;
mod config;
mod dashboard;
mod source;
mod surface;
mod timeline;
mod web;
mod widget;

use config::{DashboardConfig, ServerConfig};
use dashboard::Dashboard;
use source::HttpSource;
use timeline::LabelFormatter;
use web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("uptrail=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!("Starting uptrail on port {}...", cfg.http_port);
    tracing::info!("Fetching uptime data from {}", cfg.upstream_url);

    let layout = DashboardConfig::load(cfg.dashboard_path.as_deref())?;

    let source = Arc::new(HttpSource::new(&cfg.upstream_url, cfg.request_timeout)?);
    let formatter = LabelFormatter::local(cfg.locale);

    // Mount containers and start their tasks
    let dashboard = Arc::new(Dashboard::start(&layout, source, formatter));

    // Start web server
    let server = Server::new(cfg, dashboard);
    server.start().await?;

    Ok(())
}

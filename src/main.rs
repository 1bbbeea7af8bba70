//! tour-server
//!
//! A tour booking web application built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!   Client Request
//!   ──────────────▶ request id → [dev logging] → CORS → compression → security headers
//!                   → timeout → rate limit (/api) → error handler → panic capture
//!                   → body parser → cookies → nosql / xss sanitize → parameter pollution
//!                   → routes (views, /api/v1/{tours,users,reviews,bookings})
//!                   → static files (public/) → 404
//!
//!   Cross-cutting: config (TOML + NODE_ENV/PORT), observability (tracing, metrics),
//!                  lifecycle (seed data, graceful shutdown), store (in-memory documents)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use tour_server::config::load_config;
use tour_server::http::AppServer;
use tour_server::lifecycle::{signals, startup, Shutdown};
use tour_server::observability::{init_logging, init_metrics};

#[derive(Parser, Debug)]
#[command(name = "tour-server", version, about = "Tour booking web application server")]
struct Cli {
    /// Path to a TOML config file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    init_logging(&config);

    tracing::info!("tour-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = %config.environment,
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        rate_limit_max = config.rate_limit.max_requests,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let store = startup::init_store(&config)?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(signals::listen_for_shutdown(shutdown.clone()));

    let server = AppServer::new(config, store);
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

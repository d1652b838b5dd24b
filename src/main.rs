//! APM demo server.
//!
//! An axum application instrumented by the agent, reporting every
//! transaction and error to the log.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────────▶ TraceLayer ─▶ apm_middleware ─▶ handler
//!                                        │
//!                                        ├─ Transaction (pooled Context)
//!                                        ├─ ErrorReport (pooled Context)
//!                                        ▼
//!                                   LogTransport ─▶ stdout
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::Path;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use clap::Parser;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use apm_agent::config::{load_config, AgentConfig};
use apm_agent::observability::{logging, metrics};
use apm_agent::transport::LogTransport;
use apm_agent::{apm_middleware, traced, HandlerError, Tracer};

#[derive(Parser)]
#[command(name = "apm-demo")]
#[command(about = "Demo server instrumented by the APM agent", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AgentConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(
        service = %config.service.name,
        capture_body = ?config.capture_body,
        "apm-demo v0.1.0 starting"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let tracer = Tracer::new(&config, Arc::new(LogTransport));
    let app = build_router(tracer);

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn build_router(tracer: Tracer) -> Router {
    Router::new()
        .route("/hello/{name}", get(traced(handle_hello)))
        .route("/panic", get(traced(handle_panic)))
        .route("/error", get(traced(handle_error)))
        .layer(axum::middleware::from_fn_with_state(tracer, apm_middleware))
        .layer(TraceLayer::new_for_http())
}

async fn handle_hello(Path(name): Path<String>) -> (StatusCode, String) {
    (StatusCode::IM_A_TEAPOT, format!("Hello, {name}!"))
}

async fn handle_panic() -> &'static str {
    panic!("boom")
}

async fn handle_error() -> Result<&'static str, HandlerError> {
    Err(HandlerError::new("wot"))
}

/// Wait for shutdown signal (Ctrl+C).
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

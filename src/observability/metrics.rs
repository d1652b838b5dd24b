//! Agent self-metrics.
//!
//! # Metrics
//! - `apm_transactions_total` (counter): ended transactions by type and result
//! - `apm_errors_total` (counter): reported errors by handled flag
//! - `apm_context_pool_idle` (gauge): idle contexts per pool
//!
//! # Design Decisions
//! - Recording is a no-op until a recorder is installed
//! - Prometheus exposition is opt-in via config

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint started"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_transaction(kind: &str, result: &str) {
    metrics::counter!(
        "apm_transactions_total",
        "type" => kind.to_string(),
        "result" => result.to_string()
    )
    .increment(1);
}

pub fn record_error(handled: bool) {
    metrics::counter!("apm_errors_total", "handled" => handled.to_string()).increment(1);
}

pub fn record_pool_idle(pool: &'static str, idle: usize) {
    metrics::gauge!("apm_context_pool_idle", "pool" => pool).set(idle as f64);
}

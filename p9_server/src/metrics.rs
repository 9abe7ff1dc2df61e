//! Prometheus metrics for monitoring server health.
//!
//! Metrics are exported in Prometheus text format on a separate listener
//! when `METRICS_BIND` is set. Without an installed recorder every helper
//! here is a no-op.
//!
//! # Metrics Categories
//!
//! - **HTTP Metrics**: Request counts by method and status
//! - **WebSocket Metrics**: Active connections, messages sent/received
//! - **Game Metrics**: Actions by kind and outcome, running table actors

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

// ============================================================================
// WebSocket Metrics
// ============================================================================

/// Track a websocket opening (`delta = 1.0`) or closing (`delta = -1.0`).
pub fn websocket_connections_active(delta: f64) {
    metrics::gauge!("websocket_connections_active").increment(delta);
}

/// Increment total WebSocket connections counter.
pub fn websocket_connections_total() {
    metrics::counter!("websocket_connections_total").increment(1);
}

/// Increment WebSocket messages sent counter.
pub fn websocket_messages_sent() {
    metrics::counter!("websocket_messages_sent").increment(1);
}

/// Increment WebSocket messages received counter.
pub fn websocket_messages_received() {
    metrics::counter!("websocket_messages_received").increment(1);
}

// ============================================================================
// Game Metrics
// ============================================================================

/// Record one action by its wire tag and whether the table accepted it.
pub fn actions_total(kind: &'static str, accepted: bool) {
    metrics::counter!("actions_total",
        "kind" => kind,
        "accepted" => accepted.to_string()
    )
    .increment(1);
}

/// Set current running table actors count.
pub fn active_tables(count: usize) {
    metrics::gauge!("active_tables").set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers_without_recorder() {
        http_requests_total("GET", 200);
        websocket_connections_total();
        websocket_connections_active(1.0);
        websocket_connections_active(-1.0);
        websocket_messages_sent();
        websocket_messages_received();
        actions_total("start", true);
        active_tables(3);
    }
}

//! Pipeline metrics.
//!
//! # Metrics
//! - `secret_tx_operations_total` (counter): operations by kind, outcome
//! - `secret_tx_broadcast_total` (counter): broadcasts by chain code class
//! - `secret_tx_confirmation_attempts` (counter): tx lookups by result
//! - `secret_tx_lcd_request_duration_seconds` (histogram): LCD latency by endpoint
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; no exporter is installed here,
//!   so embedders choose where the numbers go
//! - Labels are low-cardinality (no addresses or hashes)

use std::time::Instant;

/// Record the terminal state of a pipeline operation.
pub fn record_operation(kind: &'static str, outcome: &'static str) {
    metrics::counter!(
        "secret_tx_operations_total",
        "kind" => kind,
        "outcome" => outcome
    )
    .increment(1);
}

/// Record a broadcast result.
pub fn record_broadcast(code: u32) {
    let class = if code == 0 { "accepted" } else { "rejected" };
    metrics::counter!("secret_tx_broadcast_total", "result" => class).increment(1);
}

/// Record one confirmation lookup.
pub fn record_confirmation_attempt(result: &'static str) {
    metrics::counter!("secret_tx_confirmation_attempts", "result" => result).increment(1);
}

/// Record LCD request latency.
pub fn record_lcd_request(endpoint: &'static str, start: Instant) {
    metrics::histogram!(
        "secret_tx_lcd_request_duration_seconds",
        "endpoint" => endpoint
    )
    .record(start.elapsed().as_secs_f64());
}

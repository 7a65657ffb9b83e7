//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define service metrics (loads, mutations, session, chain health)
//! - Expose Prometheus-compatible metrics endpoint
//!
//! # Metrics
//! - `guestbook_loads_total` (counter): completed full message loads
//! - `guestbook_load_failures_total` (counter): loads aborted by a count read failure
//! - `guestbook_messages` (gauge): collection size after the last load
//! - `guestbook_mutations_total` (counter): mutations by action, outcome
//! - `guestbook_batch_deletes_total` (counter): batch deletions by outcome
//! - `guestbook_session_connected` (gauge): 1=connected, 0=disconnected
//! - `guestbook_chain_health` (gauge): 1=reachable, 0=unreachable
//! - `guestbook_http_request_duration_seconds` (histogram): API latency by method, status
//!
//! # Design Decisions
//! - Low-overhead metric updates (atomic operations)
//! - Exporter runs on its own address, separate from the API listener

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::guestbook::types::PendingAction;

/// Install the Prometheus exporter on its own listener.
///
/// Must be called from within a tokio runtime. Failure to bind is logged and
/// the service keeps running without exposition.
pub fn init_metrics(addr: SocketAddr) {
    let builder = PrometheusBuilder::new().with_http_listener(addr);
    match builder.install() {
        Ok(()) => {
            describe();
            tracing::info!(address = %addr, "Metrics exporter listening");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to install metrics exporter");
        }
    }
}

fn describe() {
    metrics::describe_counter!("guestbook_loads_total", "Completed full message loads");
    metrics::describe_counter!(
        "guestbook_load_failures_total",
        "Loads aborted by a count read failure"
    );
    metrics::describe_gauge!("guestbook_messages", "Collection size after the last load");
    metrics::describe_counter!(
        "guestbook_mutations_total",
        "Guestbook mutations by action and outcome"
    );
    metrics::describe_counter!(
        "guestbook_batch_deletes_total",
        "Batch delete requests by outcome"
    );
    metrics::describe_gauge!(
        "guestbook_session_connected",
        "Whether the wallet session is connected"
    );
    metrics::describe_gauge!(
        "guestbook_chain_health",
        "Whether any RPC provider is reachable"
    );
    metrics::describe_histogram!(
        "guestbook_http_request_duration_seconds",
        metrics::Unit::Seconds,
        "API request latency by method and status"
    );
}

pub fn record_load(count: usize) {
    metrics::counter!("guestbook_loads_total").increment(1);
    metrics::gauge!("guestbook_messages").set(count as f64);
}

pub fn record_load_failure() {
    metrics::counter!("guestbook_load_failures_total").increment(1);
}

pub fn record_mutation(action: PendingAction, ok: bool) {
    let outcome = if ok { "ok" } else { "error" };
    metrics::counter!(
        "guestbook_mutations_total",
        "action" => action.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_batch_delete(requested: usize, failed: usize) {
    metrics::counter!("guestbook_batch_deletes_total", "outcome" => "ok")
        .increment((requested - failed) as u64);
    metrics::counter!("guestbook_batch_deletes_total", "outcome" => "error")
        .increment(failed as u64);
}

pub fn record_session_connected(connected: bool) {
    metrics::gauge!("guestbook_session_connected").set(if connected { 1.0 } else { 0.0 });
}

pub fn record_chain_health(healthy: bool) {
    metrics::gauge!("guestbook_chain_health").set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_http_request(method: &str, status: u16, started: Instant) {
    metrics::histogram!(
        "guestbook_http_request_duration_seconds",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .record(started.elapsed().as_secs_f64());
}

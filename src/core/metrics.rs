// src/core/metrics.rs

//! Defines and registers Prometheus metrics for server monitoring.
//!
//! This module uses `lazy_static` to ensure that metrics are registered only once
//! globally for the entire application lifecycle.

use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, Gauge, TextEncoder, register_counter, register_counter_vec,
    register_gauge,
};

lazy_static! {
    // --- Server-wide Gauges ---
    /// The number of clients currently registered with the relay.
    pub static ref CONNECTED_CLIENTS: Gauge =
        register_gauge!("wsrelay_connected_clients", "Number of currently connected clients.").unwrap();


    // --- Server-wide Counters ---
    /// The total number of WebSocket sessions accepted since startup.
    pub static ref CONNECTIONS_RECEIVED_TOTAL: Counter =
        register_counter!("wsrelay_connections_received_total", "Total number of connections received.").unwrap();
    /// Upgrade requests turned away before a session started.
    pub static ref HANDSHAKE_REJECTIONS_TOTAL: Counter =
        register_counter!("wsrelay_handshake_rejections_total", "Total number of rejected or failed WebSocket upgrades.").unwrap();
    /// The total number of peer messages relayed to other peers.
    pub static ref MESSAGES_RELAYED_TOTAL: Counter =
        register_counter!("wsrelay_messages_relayed_total", "Total number of messages read from peers and relayed.").unwrap();
    /// Per-target enqueue failures during dispatch, labeled by reason.
    pub static ref DISPATCH_FAILURES_TOTAL: CounterVec =
        register_counter_vec!("wsrelay_dispatch_failures_total", "Total number of per-target dispatch failures, labeled by reason.", &["reason"]).unwrap();
    /// Trigger invocations, labeled by kind (unicast or broadcast).
    pub static ref TRIGGER_INVOCATIONS_TOTAL: CounterVec =
        register_counter_vec!("wsrelay_trigger_invocations_total", "Total number of trigger invocations, labeled by kind.", &["kind"]).unwrap();
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode_to_string(&metric_families)
        .unwrap_or_else(|e| format!("# failed to encode metrics: {e}\n"))
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `shardgate_requests_forwarded_total` (counter): requests written to a shard, by shard
//! - `shardgate_responses_delivered_total` (counter): responses written to clients, by shard and status
//! - `shardgate_pending_requests` (gauge): ids currently held in the correlation table
//! - `shardgate_shard_closed_total` (counter): responder loops ended by a closed shard
//! - `shardgate_malformed_total` (counter): undecodable messages, by side (client/shard)
//!
//! Recording is a no-op until a recorder is installed with [`init_metrics`].

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics recorder"),
    }
}

pub fn record_forwarded(shard: usize) {
    counter!("shardgate_requests_forwarded_total", "shard" => shard.to_string()).increment(1);
}

pub fn record_delivered(shard: usize, status: u16) {
    counter!(
        "shardgate_responses_delivered_total",
        "shard" => shard.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

pub fn set_pending_requests(count: usize) {
    gauge!("shardgate_pending_requests").set(count as f64);
}

pub fn record_shard_closed(shard: usize) {
    counter!("shardgate_shard_closed_total", "shard" => shard.to_string()).increment(1);
}

pub fn record_malformed(side: &'static str) {
    counter!("shardgate_malformed_total", "side" => side).increment(1);
}

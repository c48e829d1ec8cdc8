//! Per-shard responder loop.
//!
//! ```text
//! WaitResponse → Decode → Lookup → Deliver → Retire → Audit
//!      ↑                                                 │
//!      └─────────────────────────────────────────────────┘
//! ```
//!
//! The loop ends only when its shard connection closes. Requests still pending
//! on that shard are orphaned: their clients are never answered or closed.

use std::sync::Arc;

use chrono::Utc;

use crate::audit::{AuditRecord, AuditSink};
use crate::correlation::CorrelationTable;
use crate::observability::metrics;
use crate::protocol::{envelope, ResponseSummary};
use crate::routing::{BridgeError, ShardRouter};

/// Why a responder loop ended.
#[derive(Debug)]
pub enum ResponderExit {
    /// The shard hung up or was shut down.
    ShardClosed,
    /// Any other unrecoverable shard error.
    Failed(BridgeError),
}

/// Demultiplexes one shard's responses back to waiting clients.
pub struct Responder {
    shard: usize,
    table: Arc<CorrelationTable>,
    router: Arc<ShardRouter>,
    audit: Arc<AuditSink>,
}

impl Responder {
    pub fn new(
        shard: usize,
        table: Arc<CorrelationTable>,
        router: Arc<ShardRouter>,
        audit: Arc<AuditSink>,
    ) -> Self {
        Self {
            shard,
            table,
            router,
            audit,
        }
    }

    pub async fn run(self) -> ResponderExit {
        tracing::debug!(shard = self.shard, "Responder started");
        loop {
            let response = match self.router.wait_for_response(self.shard).await {
                Ok(response) => response,
                Err(BridgeError::ConnectionClosed { .. }) => {
                    metrics::record_shard_closed(self.shard);
                    tracing::info!(shard = self.shard, "Shard closed, responder exiting");
                    return ResponderExit::ShardClosed;
                }
                Err(BridgeError::Framing { source, .. }) => {
                    // The stream position is lost; nothing after this can be trusted.
                    metrics::record_malformed("shard");
                    tracing::error!(shard = self.shard, error = %source, "Shard stream desynchronized");
                    return ResponderExit::Failed(BridgeError::Framing { shard: self.shard, source });
                }
                Err(e) => {
                    tracing::error!(shard = self.shard, error = %e, "Shard read failed");
                    return ResponderExit::Failed(e);
                }
            };

            self.respond(response).await;
        }
    }

    /// Deliver one response. Failures here only affect this response.
    async fn respond(&self, response: Vec<u8>) {
        let (id, data) = match envelope::decode(response) {
            Ok(decoded) => decoded,
            Err(e) => {
                metrics::record_malformed("shard");
                tracing::warn!(shard = self.shard, error = %e, "Dropping undecodable response");
                return;
            }
        };

        let client = match self.table.get_client_from_request(&id) {
            Ok(client) => client,
            Err(e) => {
                tracing::error!(
                    shard = self.shard,
                    request_id = %id,
                    error = %e,
                    "Response has no waiting client"
                );
                return;
            }
        };
        let address = client.peer_addr();

        if let Err(e) = client.deliver(&data).await {
            tracing::debug!(shard = self.shard, request_id = %id, error = %e, "Client write failed");
        }
        self.table.request_completed(&id);

        let summary = match ResponseSummary::parse(&data) {
            Ok(summary) => summary,
            Err(e) => {
                tracing::warn!(shard = self.shard, request_id = %id, error = %e, "Response not auditable");
                return;
            }
        };
        metrics::record_delivered(self.shard, summary.status);
        tracing::debug!(
            shard = self.shard,
            request_id = %id,
            status = summary.status,
            client = %address,
            "Response delivered"
        );

        let record = AuditRecord::new(
            summary.date.unwrap_or_else(|| Utc::now().to_rfc2822()),
            address,
            summary.method.unwrap_or_else(|| "-".to_string()),
            summary.status,
        );
        if let Err(e) = self.audit.send_log(&record).await {
            tracing::warn!(shard = self.shard, error = %e, "Failed to send audit record");
        }
    }
}

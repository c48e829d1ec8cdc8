//! Receiver worker: one pass per accepted client connection.
//!
//! Read one request → register in the correlation table → wrap in the
//! envelope → forward to the shard owning its origin. Never retries.

use thiserror::Error;

use crate::correlation::CorrelationTable;
use crate::net::ClientConnection;
use crate::observability::metrics;
use crate::protocol::{envelope, EnvelopeError, Request, RequestId, WireError};
use crate::routing::{BridgeError, ShardRouter};

/// Why a receiver gave up on its connection. The client gets no response.
#[derive(Debug, Error)]
pub enum ReceiveError {
    #[error("failed to read request: {0}")]
    Read(#[source] WireError),

    #[error("failed to decode request: {0}")]
    Decode(#[source] WireError),

    #[error("failed to wrap request: {0}")]
    Envelope(#[from] EnvelopeError),

    #[error("failed to forward request: {0}")]
    Forward(#[from] BridgeError),
}

/// Outcome of a receiver pass that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// The client went away before sending a full request.
    Abandoned,
    /// The request is pending on `shard` under `id`.
    Forwarded { id: RequestId, shard: usize },
}

/// Handle a single client connection.
///
/// On error the connection is dropped, which closes it without a response.
pub async fn receive(
    mut client: ClientConnection,
    table: &CorrelationTable,
    router: &ShardRouter,
) -> Result<Received, ReceiveError> {
    let peer = client.peer_addr();

    let data = match client.read_request().await {
        Ok(Some(data)) => data,
        Ok(None) => {
            tracing::debug!(peer = %peer, "Client closed before sending a request");
            return Ok(Received::Abandoned);
        }
        Err(WireError::Truncated(bytes)) => {
            tracing::debug!(peer = %peer, bytes, "Client aborted mid-request");
            return Ok(Received::Abandoned);
        }
        Err(e) => {
            metrics::record_malformed("client");
            return Err(ReceiveError::Read(e));
        }
    };

    let request = Request::parse(&data).map_err(|e| {
        metrics::record_malformed("client");
        ReceiveError::Decode(e)
    })?;
    tracing::debug!(
        peer = %peer,
        verb = %request.verb,
        path = %request.path,
        "Request received"
    );

    let id = table.new_request(client);
    let forwarded = match envelope::encode(&data, &id) {
        Ok(wrapped) => router
            .send_request(&request.path, &wrapped)
            .await
            .map_err(ReceiveError::from),
        Err(e) => Err(e.into()),
    };

    match forwarded {
        Ok(shard) => {
            metrics::record_forwarded(shard);
            tracing::debug!(request_id = %id, shard, "Request forwarded");
            Ok(Received::Forwarded { id, shard })
        }
        Err(e) => {
            // Nothing will answer this id. Dropping the client closes it.
            if let Some(client) = table.cancel(&id) {
                tracing::debug!(request_id = %id, peer = %client.peer_addr(), "Request withdrawn");
                drop(client);
            }
            Err(e)
        }
    }
}

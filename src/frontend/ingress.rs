//! Ingress server: client accept loop feeding the receiver pool.

use std::net::SocketAddr;
use std::sync::Arc;

use crate::correlation::CorrelationTable;
use crate::lifecycle::Shutdown;
use crate::net::{ClientConnection, ConnectionTracker, Listener, ListenerError};
use crate::routing::ShardRouter;

use super::receiver::{receive, Received};

/// Accepts clients and runs one receiver task per connection, at most
/// `receivers` at a time.
pub struct IngressServer {
    listener: Listener,
    tracker: ConnectionTracker,
    table: Arc<CorrelationTable>,
    router: Arc<ShardRouter>,
}

impl IngressServer {
    pub fn new(listener: Listener, table: Arc<CorrelationTable>, router: Arc<ShardRouter>) -> Self {
        Self {
            listener,
            tracker: ConnectionTracker::new(),
            table,
            router,
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until `shutdown` fires or the listener is closed.
    pub async fn run(&self, shutdown: &Shutdown) {
        let mut signal = shutdown.subscribe();
        if shutdown.is_triggered() {
            return;
        }

        loop {
            tracing::trace!("Awaiting client connection");
            let accepted = tokio::select! {
                _ = signal.recv() => {
                    tracing::info!("Ingress stopping");
                    return;
                }
                accepted = self.listener.accept() => accepted,
            };

            let (stream, peer, permit) = match accepted {
                Ok(accepted) => accepted,
                Err(ListenerError::Closed) => {
                    tracing::info!("Ingress listener closed");
                    return;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Accept failed");
                    continue;
                }
            };

            let guard = self.tracker.track();
            let table = self.table.clone();
            let router = self.router.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let _guard = guard;
                let client = ClientConnection::new(stream, peer);
                match receive(client, &table, &router).await {
                    Ok(Received::Forwarded { .. } | Received::Abandoned) => {}
                    Err(e) => tracing::warn!(peer = %peer, error = %e, "Request dropped"),
                }
            });
        }
    }

    /// Stop accepting and wait for in-flight receivers to finish.
    pub async fn shutdown(&self) {
        self.listener.close();
        tracing::debug!(active = self.tracker.active_count(), "Draining receivers");
        self.tracker.wait_idle().await;
    }
}

//! Front-end server: wires the pipeline together and owns its lifecycle.
//!
//! # Responsibilities
//! - Bind bridge, audit and ingress listeners
//! - Wait for every storage node, then the audit collector
//! - Spawn one responder per shard
//! - Run ingress until shutdown
//! - Tear down in order: ingress → shards → responders → audit

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::audit::{AuditError, AuditSink};
use crate::config::FrontEndConfig;
use crate::correlation::CorrelationTable;
use crate::lifecycle::Shutdown;
use crate::net::{Listener, ListenerError};
use crate::routing::{BridgeError, ShardAcceptor, ShardRouter};

use super::ingress::IngressServer;
use super::responder::{Responder, ResponderExit};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Audit(#[from] AuditError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The running front-end.
pub struct FrontEndServer {
    ingress: IngressServer,
    router: Arc<ShardRouter>,
    audit: Arc<AuditSink>,
    table: Arc<CorrelationTable>,
    responders: Vec<JoinHandle<ResponderExit>>,
    shutdown: Shutdown,
}

impl FrontEndServer {
    /// Bind everything and wait for the shards (and audit collector) to connect.
    pub async fn start(config: &FrontEndConfig) -> Result<Self, ServerError> {
        let acceptor = ShardAcceptor::bind(&config.bridge.bind_address).await?;
        let audit_listener = if config.audit.enabled {
            Some(
                TcpListener::bind(&config.audit.bind_address)
                    .await
                    .map_err(AuditError::Open)?,
            )
        } else {
            None
        };
        let listener = Listener::bind(&config.listener.bind_address, config.listener.receivers).await?;

        let router = Arc::new(acceptor.accept(config.bridge.shards).await?);
        let audit = Arc::new(match audit_listener {
            Some(listener) => AuditSink::accept_on(listener).await?,
            None => {
                tracing::info!("Audit disabled");
                AuditSink::disabled()
            }
        });

        let table = Arc::new(CorrelationTable::new());
        let responders = (0..router.shard_count())
            .map(|shard| {
                let responder = Responder::new(shard, table.clone(), router.clone(), audit.clone());
                tokio::spawn(responder.run())
            })
            .collect();

        let ingress = IngressServer::new(listener, table.clone(), router.clone());
        tracing::info!(
            address = %ingress.local_addr()?,
            shards = router.shard_count(),
            "Front-end ready"
        );

        Ok(Self {
            ingress,
            router,
            audit,
            table,
            responders,
            shutdown: Shutdown::new(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.ingress.local_addr()
    }

    pub fn router(&self) -> &Arc<ShardRouter> {
        &self.router
    }

    pub fn table(&self) -> &Arc<CorrelationTable> {
        &self.table
    }

    /// Handle for stopping [`run`](Self::run) from another task.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Whether the responder for `shard` has exited.
    pub fn responder_finished(&self, shard: usize) -> bool {
        self.responders
            .get(shard)
            .map(JoinHandle::is_finished)
            .unwrap_or(true)
    }

    /// Accept clients until the shutdown handle is triggered.
    pub async fn run(&self) {
        self.ingress.run(&self.shutdown).await;
    }

    /// Ordered teardown. Consumes the server.
    pub async fn shutdown(self) {
        self.shutdown.trigger();

        tracing::debug!("Shutting down ingress");
        self.ingress.shutdown().await;

        tracing::debug!("Closing bridge");
        self.router.shutdown().await;

        for (shard, responder) in self.responders.into_iter().enumerate() {
            tracing::debug!(shard, "Joining responder");
            match responder.await {
                Ok(exit) => tracing::debug!(shard, exit = ?exit, "Responder joined"),
                Err(e) => tracing::error!(shard, error = %e, "Responder task failed"),
            }
        }

        let orphaned = self.table.len();
        if orphaned > 0 {
            tracing::warn!(orphaned, "Requests left without a response");
        }

        tracing::debug!("Closing audit sink");
        self.audit.close().await;
        tracing::info!("Front-end stopped");
    }
}

//! Shard router: origin hashing over a fixed set of shard connections.
//!
//! # Responsibilities
//! - Accept exactly N storage node connections at startup
//! - Assign shard indices in peer-address order
//! - Map a resource path to its shard
//! - Expose per-shard send/receive
//!
//! # Design Decisions
//! - Storage nodes dial in; the router is the server side of the bridge
//! - Sorting by peer address makes the origin → shard mapping independent of
//!   connection arrival order
//! - No rehashing: a dead shard stays dead for the life of the process

use std::net::SocketAddr;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

use super::hash::shard_for;
use super::shard::ShardConnection;
use crate::protocol::wire::WireError;

/// Errors raised by shard I/O.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("failed to bind bridge listener: {0}")]
    Bind(std::io::Error),

    #[error("failed to accept shard connection: {0}")]
    Accept(std::io::Error),

    #[error("shard count must be at least 1")]
    NoShards,

    /// The shard's peer hung up or the router was shut down.
    #[error("shard {shard} connection closed")]
    ConnectionClosed { shard: usize },

    #[error("shard {shard} sent an unframeable message: {source}")]
    Framing { shard: usize, source: WireError },

    #[error("I/O error on shard {shard}: {source}")]
    Io { shard: usize, source: std::io::Error },

    #[error("no shard with index {0}")]
    UnknownShard(usize),
}

/// Listening half of the bridge, before the shards have connected.
pub struct ShardAcceptor {
    listener: TcpListener,
}

impl ShardAcceptor {
    pub async fn bind(address: &str) -> Result<Self, BridgeError> {
        let listener = TcpListener::bind(address).await.map_err(BridgeError::Bind)?;
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "Bridge listener bound");
        }
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Wait for `shards` storage nodes to connect, then build the router.
    pub async fn accept(self, shards: usize) -> Result<ShardRouter, BridgeError> {
        if shards == 0 {
            return Err(BridgeError::NoShards);
        }

        tracing::info!(shards, "Waiting for storage nodes");
        let mut connections = Vec::with_capacity(shards);
        while connections.len() < shards {
            let (stream, peer) = self.listener.accept().await.map_err(BridgeError::Accept)?;
            tracing::info!(
                peer = %peer,
                connected = connections.len() + 1,
                expected = shards,
                "Storage node connected"
            );
            connections.push((peer, stream));
        }

        Ok(ShardRouter::from_connections(connections, Some(self.listener)))
    }
}

/// Fixed set of shard connections indexed by sorted peer address.
#[derive(Debug)]
pub struct ShardRouter {
    shards: Vec<ShardConnection>,
    listener: Mutex<Option<TcpListener>>,
}

impl ShardRouter {
    /// Sort `connections` by peer address and assign indices in that order.
    pub fn from_connections(
        mut connections: Vec<(SocketAddr, TcpStream)>,
        listener: Option<TcpListener>,
    ) -> Self {
        connections.sort_by_key(|(peer, _)| *peer);

        let shards: Vec<_> = connections
            .into_iter()
            .enumerate()
            .map(|(index, (peer, stream))| {
                tracing::info!(shard = index, peer = %peer, "Shard assigned");
                ShardConnection::new(index, peer, stream)
            })
            .collect();

        Self {
            shards,
            listener: Mutex::new(listener),
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    pub fn shard(&self, index: usize) -> Option<&ShardConnection> {
        self.shards.get(index)
    }

    /// Shard index serving `path`.
    pub fn where_to(&self, path: &str) -> usize {
        shard_for(path, self.shards.len())
    }

    /// Write `data` to the shard serving `path`. Returns the shard index.
    pub async fn send_request(&self, path: &str, data: &[u8]) -> Result<usize, BridgeError> {
        let index = self.where_to(path);
        tracing::debug!(shard = index, path = %path, bytes = data.len(), "Sending request to shard");
        self.shards[index].send(data).await?;
        Ok(index)
    }

    /// Block until the next full response arrives on shard `index`.
    pub async fn wait_for_response(&self, index: usize) -> Result<Vec<u8>, BridgeError> {
        let shard = self.shards.get(index).ok_or(BridgeError::UnknownShard(index))?;
        let response = shard.receive().await?;
        tracing::debug!(shard = index, bytes = response.len(), "Received response from shard");
        Ok(response)
    }

    /// Close every shard connection and the bridge listener. Idempotent.
    pub async fn shutdown(&self) {
        tracing::debug!("Closing bridge");
        for shard in &self.shards {
            shard.close().await;
        }
        self.listener.lock().await.take();
    }
}

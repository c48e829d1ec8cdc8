//! Bounded TCP listener for client ingress.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections
//! - Bound concurrent receivers via semaphore
//! - Unblock a waiting accept on shutdown

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

/// Error type for listener operations.
#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("failed to bind: {0}")]
    Bind(std::io::Error),

    #[error("failed to accept: {0}")]
    Accept(std::io::Error),

    /// The listener was closed while waiting for a slot.
    #[error("listener closed")]
    Closed,
}

/// A TCP listener that admits at most `receivers` connections at once.
///
/// A slot is acquired *before* `accept`, so a saturated pool stops accepting
/// until a receiver finishes.
pub struct Listener {
    inner: TcpListener,
    slots: Arc<Semaphore>,
}

impl Listener {
    pub async fn bind(address: &str, receivers: usize) -> Result<Self, ListenerError> {
        let addr: SocketAddr = address.parse().map_err(|e| {
            ListenerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
        })?;

        let listener = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;
        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            receivers,
            "Ingress listener bound"
        );

        Ok(Self {
            inner: listener,
            slots: Arc::new(Semaphore::new(receivers)),
        })
    }

    /// Accept a new connection, waiting for a free receiver slot first.
    ///
    /// The returned permit must be held for the receiver's lifetime.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr, ReceiverPermit), ListenerError> {
        let permit = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ListenerError::Closed)?;

        let (stream, addr) = self.inner.accept().await.map_err(ListenerError::Accept)?;

        tracing::debug!(
            peer_addr = %addr,
            available_slots = self.slots.available_permits(),
            "Client connection accepted"
        );

        Ok((stream, addr, ReceiverPermit { _permit: permit }))
    }

    /// Refuse further slots. Any `accept` waiting for one returns [`ListenerError::Closed`].
    pub fn close(&self) {
        self.slots.close();
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }

    pub fn available_slots(&self) -> usize {
        self.slots.available_permits()
    }
}

/// A receiver slot. Released back to the pool when dropped, even if the
/// receiver panics.
#[derive(Debug)]
pub struct ReceiverPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn saturated_pool_blocks_accept() {
        let listener = Listener::bind("127.0.0.1:0", 1).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let _c1 = TcpStream::connect(addr).await.unwrap();
        let _c2 = TcpStream::connect(addr).await.unwrap();

        let (_s1, _, permit) = listener.accept().await.unwrap();
        assert_eq!(listener.available_slots(), 0);

        let blocked = tokio::time::timeout(Duration::from_millis(100), listener.accept()).await;
        assert!(blocked.is_err(), "second accept should wait for a slot");

        drop(permit);
        let second = tokio::time::timeout(Duration::from_secs(1), listener.accept()).await;
        assert!(matches!(second, Ok(Ok(_))));
    }

    #[tokio::test]
    async fn close_unblocks_waiting_accept() {
        let listener = Arc::new(Listener::bind("127.0.0.1:0", 1).await.unwrap());
        let addr = listener.local_addr().unwrap();
        let _c1 = TcpStream::connect(addr).await.unwrap();
        let (_s1, _, _permit) = listener.accept().await.unwrap();

        let waiting = {
            let listener = listener.clone();
            tokio::spawn(async move { listener.accept().await.map(|_| ()) })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        listener.close();

        let result = waiting.await.unwrap();
        assert!(matches!(result, Err(ListenerError::Closed)));
    }
}

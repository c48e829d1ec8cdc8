//! Client connections and lifecycle tracking.
//!
//! # Responsibilities
//! - Own one client socket from accept until it is closed
//! - Read exactly one framed request off it
//! - Deliver a response and close it
//! - Track in-flight receivers so ingress shutdown can drain them

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::watch;

use crate::protocol::wire::{read_message, WireError};

/// A connection to one external caller.
///
/// Owned by exactly one party at a time: the receiver that accepted it, then the
/// correlation table, then the responder that closes it.
#[derive(Debug)]
pub struct ClientConnection {
    peer: SocketAddr,
    stream: BufReader<TcpStream>,
}

impl ClientConnection {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            peer,
            stream: BufReader::new(stream),
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Read one framed request. `Ok(None)` means the client went away first.
    pub async fn read_request(&mut self) -> Result<Option<Vec<u8>>, WireError> {
        read_message(&mut self.stream).await
    }

    /// Write `data` and close the connection.
    ///
    /// Delivery is not confirmed beyond the local write; a client that hangs up
    /// early simply loses the response.
    pub async fn deliver(mut self, data: &[u8]) -> std::io::Result<()> {
        let stream = self.stream.get_mut();
        stream.write_all(data).await?;
        stream.shutdown().await
    }
}

/// Tracks in-flight receivers for graceful shutdown.
///
/// Uses a watch channel so `wait_idle` wakes exactly when the count reaches zero.
#[derive(Debug, Clone)]
pub struct ConnectionTracker {
    active: Arc<watch::Sender<u64>>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(0);
        Self {
            active: Arc::new(tx),
        }
    }

    /// Record a new active connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        self.active.send_modify(|n| *n += 1);
        ConnectionGuard {
            active: Arc::clone(&self.active),
        }
    }

    pub fn active_count(&self) -> u64 {
        *self.active.borrow()
    }

    /// Wait until every tracked connection has been released.
    pub async fn wait_idle(&self) {
        let mut rx = self.active.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|n| *n == 0).await;
    }
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// Guard that tracks a receiver's lifetime.
/// Decrements active count when dropped.
#[derive(Debug)]
pub struct ConnectionGuard {
    active: Arc<watch::Sender<u64>>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active.send_modify(|n| *n = n.saturating_sub(1));
        tracing::trace!("Receiver finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn connection_tracker_counts() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.active_count(), 0);

        let guard1 = tracker.track();
        assert_eq!(tracker.active_count(), 1);

        let guard2 = tracker.track();
        assert_eq!(tracker.active_count(), 2);

        drop(guard1);
        assert_eq!(tracker.active_count(), 1);

        drop(guard2);
        assert_eq!(tracker.active_count(), 0);
    }

    #[tokio::test]
    async fn wait_idle_wakes_on_last_release() {
        let tracker = ConnectionTracker::new();
        let guard = tracker.track();

        let waiter = {
            let tracker = tracker.clone();
            tokio::spawn(async move { tracker.wait_idle().await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("wait_idle should return")
            .unwrap();
    }

    #[tokio::test]
    async fn reads_request_and_delivers_response() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let client = tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream
                .write_all(b"GET /docs/readme HTTP/1.1\r\n\r\n")
                .await
                .unwrap();
            let mut reply = Vec::new();
            stream.read_to_end(&mut reply).await.unwrap();
            reply
        });

        let (stream, peer) = listener.accept().await.unwrap();
        let mut conn = ClientConnection::new(stream, peer);
        let request = conn.read_request().await.unwrap().unwrap();
        assert_eq!(request, b"GET /docs/readme HTTP/1.1\r\n\r\n");

        conn.deliver(b"HTTP/1.1 200 OK\r\n\r\n").await.unwrap();
        assert_eq!(client.await.unwrap(), b"HTTP/1.1 200 OK\r\n\r\n");
    }
}

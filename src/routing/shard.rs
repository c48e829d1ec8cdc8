//! One duplex connection to a storage shard.
//!
//! # Responsibilities
//! - Serialize writes through a send lock
//! - Serialize framed reads through an independent receive lock
//! - Let a send and a receive on the same shard proceed concurrently
//! - Close idempotently, unblocking a pending receive

use std::net::SocketAddr;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{watch, Mutex};

use super::BridgeError;
use crate::protocol::wire::{read_message, WireError};

/// A storage shard's connection plus its send/receive lock pair.
#[derive(Debug)]
pub struct ShardConnection {
    index: usize,
    peer: SocketAddr,
    reader: Mutex<BufReader<OwnedReadHalf>>,
    /// `None` once the shard has been closed.
    writer: Mutex<Option<OwnedWriteHalf>>,
    closed: watch::Sender<bool>,
}

impl ShardConnection {
    pub fn new(index: usize, peer: SocketAddr, stream: TcpStream) -> Self {
        let (read_half, write_half) = stream.into_split();
        let (closed, _) = watch::channel(false);
        Self {
            index,
            peer,
            reader: Mutex::new(BufReader::new(read_half)),
            writer: Mutex::new(Some(write_half)),
            closed,
        }
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Write one message under the send lock. Does not wait for a response.
    pub async fn send(&self, data: &[u8]) -> Result<(), BridgeError> {
        let mut writer = self.writer.lock().await;
        let Some(stream) = writer.as_mut() else {
            return Err(BridgeError::ConnectionClosed { shard: self.index });
        };

        let result = async {
            stream.write_all(data).await?;
            stream.flush().await
        }
        .await;

        result.map_err(|e| self.io_error(e))
    }

    /// Read one framed message under the receive lock.
    ///
    /// Fails with [`BridgeError::ConnectionClosed`] when the peer hangs up or
    /// [`close`](Self::close) is called, including while this call is blocked.
    pub async fn receive(&self) -> Result<Vec<u8>, BridgeError> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return Err(BridgeError::ConnectionClosed { shard: self.index });
        }

        let mut reader = self.reader.lock().await;
        tokio::select! {
            biased;
            _ = closed.wait_for(|closed| *closed) => {
                Err(BridgeError::ConnectionClosed { shard: self.index })
            }
            result = read_message(&mut *reader) => match result {
                Ok(Some(message)) => Ok(message),
                Ok(None) | Err(WireError::Truncated(_)) => {
                    Err(BridgeError::ConnectionClosed { shard: self.index })
                }
                Err(WireError::Io(e)) => Err(self.io_error(e)),
                Err(e) => Err(BridgeError::Framing { shard: self.index, source: e }),
            },
        }
    }

    /// Close the connection. Safe to call repeatedly.
    pub async fn close(&self) {
        if self.closed.send_replace(true) {
            return;
        }

        if let Some(mut stream) = self.writer.lock().await.take() {
            if let Err(e) = stream.shutdown().await {
                tracing::debug!(shard = self.index, error = %e, "Shard shutdown reported an error");
            }
        }
        tracing::debug!(shard = self.index, peer = %self.peer, "Shard connection closed");
    }

    fn io_error(&self, e: std::io::Error) -> BridgeError {
        use std::io::ErrorKind::*;
        match e.kind() {
            BrokenPipe | ConnectionReset | ConnectionAborted | UnexpectedEof | NotConnected => {
                BridgeError::ConnectionClosed { shard: self.index }
            }
            _ => BridgeError::Io { shard: self.index, source: e },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    async fn pair() -> (ShardConnection, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let backend = TcpStream::connect(addr).await.unwrap();
        let (stream, peer) = listener.accept().await.unwrap();
        (ShardConnection::new(0, peer, stream), backend)
    }

    #[tokio::test]
    async fn send_and_receive_are_duplex() {
        let (shard, mut backend) = pair().await;
        let shard = Arc::new(shard);

        // A receive blocked on an idle connection must not hold up a send.
        let receiver = {
            let shard = shard.clone();
            tokio::spawn(async move { shard.receive().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(1), shard.send(b"GET /a/b HTTP/1.1\r\n\r\n"))
            .await
            .expect("send blocked behind receive")
            .unwrap();

        let mut buf = [0u8; 21];
        backend.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"GET /a/b HTTP/1.1\r\n\r\n");

        backend.write_all(b"HTTP/1.1 204 No Content\r\n\r\n").await.unwrap();
        let response = receiver.await.unwrap().unwrap();
        assert_eq!(response, b"HTTP/1.1 204 No Content\r\n\r\n");
    }

    #[tokio::test]
    async fn close_unblocks_receive_and_is_idempotent() {
        let (shard, _backend) = pair().await;
        let shard = Arc::new(shard);

        let receiver = {
            let shard = shard.clone();
            tokio::spawn(async move { shard.receive().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        shard.close().await;
        shard.close().await;

        let result = tokio::time::timeout(Duration::from_secs(1), receiver)
            .await
            .expect("receive should unblock")
            .unwrap();
        assert!(matches!(result, Err(BridgeError::ConnectionClosed { shard: 0 })));
        assert!(matches!(
            shard.send(b"x\r\n\r\n").await,
            Err(BridgeError::ConnectionClosed { shard: 0 })
        ));
    }

    #[tokio::test]
    async fn peer_hangup_is_connection_closed() {
        let (shard, backend) = pair().await;
        drop(backend);
        assert!(matches!(
            shard.receive().await,
            Err(BridgeError::ConnectionClosed { shard: 0 })
        ));
    }
}

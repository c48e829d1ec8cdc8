//! Serialized audit channel shared by every responder.

use std::net::SocketAddr;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to open audit channel: {0}")]
    Open(std::io::Error),

    #[error("failed to write audit record: {0}")]
    Write(std::io::Error),

    #[error("failed to encode audit record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One delivered response. Written as a single JSON line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    pub date: String,
    pub address: String,
    pub method: String,
    pub status: u16,
}

impl AuditRecord {
    pub fn new(
        date: impl Into<String>,
        address: SocketAddr,
        method: impl Into<String>,
        status: u16,
    ) -> Self {
        Self {
            date: date.into(),
            address: address.to_string(),
            method: method.into(),
            status,
        }
    }
}

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Append-only sink guarded by one mutex.
///
/// Records from concurrent callers are written whole, one after another.
/// After [`close`](Self::close) every send is a silent no-op.
pub struct AuditSink {
    writer: Mutex<Option<BoxedWriter>>,
}

impl AuditSink {
    /// Wait for the audit collector on an already-bound listener.
    ///
    /// The listener is dropped once the collector has connected.
    pub async fn accept_on(listener: TcpListener) -> Result<Self, AuditError> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(address = %addr, "Waiting for audit collector");
        }
        let (stream, peer) = listener.accept().await.map_err(AuditError::Open)?;
        tracing::info!(peer = %peer, "Audit collector connected");
        Ok(Self::from_writer(stream))
    }

    pub fn from_writer<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            writer: Mutex::new(Some(Box::new(writer))),
        }
    }

    /// A sink that discards every record.
    pub fn disabled() -> Self {
        Self {
            writer: Mutex::new(None),
        }
    }

    pub async fn send_log(&self, record: &AuditRecord) -> Result<(), AuditError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        let Some(stream) = writer.as_mut() else {
            tracing::debug!(status = record.status, "Audit sink closed, record dropped");
            return Ok(());
        };
        stream.write_all(&line).await.map_err(AuditError::Write)?;
        stream.flush().await.map_err(AuditError::Write)
    }

    /// Flush and close the channel. Safe to call repeatedly.
    pub async fn close(&self) {
        if let Some(mut stream) = self.writer.lock().await.take() {
            if let Err(e) = stream.shutdown().await {
                tracing::debug!(error = %e, "Audit channel shutdown reported an error");
            }
            tracing::debug!("Audit sink closed");
        }
    }
}

//! Storage node runtime: one connection to the front-end, many requests.
//!
//! Requests are read off the bridge connection in order but handled
//! concurrently, so responses may go back in a different order. Each response
//! echoes its request's `Request-Id`, which is all the front-end needs.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, Semaphore};

use super::cache::ContentCache;
use super::files::FileStore;
use super::handler::{RequestHandler, USAGE};
use super::StorageError;
use crate::config::StorageConfig;
use crate::protocol::{envelope, read_message, Request, Response, Status};
use crate::resilience::backoff::calculate_backoff;

/// A connected storage node.
pub struct StorageNode {
    handler: Arc<RequestHandler>,
    reader: BufReader<OwnedReadHalf>,
    writer: Arc<Mutex<OwnedWriteHalf>>,
    workers: Arc<Semaphore>,
    local_addr: SocketAddr,
}

impl StorageNode {
    /// Dial the front-end, retrying with backoff up to `connect_attempts` times.
    pub async fn connect(config: &StorageConfig) -> Result<Self, StorageError> {
        let mut attempt = 0;
        let stream = loop {
            attempt += 1;
            match TcpStream::connect(&config.bridge_address).await {
                Ok(stream) => break stream,
                Err(e) if attempt < config.connect_attempts => {
                    let delay = calculate_backoff(
                        attempt,
                        config.connect_base_delay_ms,
                        config.connect_max_delay_ms,
                    );
                    tracing::debug!(
                        address = %config.bridge_address,
                        attempt,
                        delay = ?delay,
                        error = %e,
                        "Front-end not reachable, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(StorageError::Connect(e)),
            }
        };

        let cache = Arc::new(ContentCache::new(config.cache_entries));
        let files = FileStore::new(&config.root);
        Self::from_stream(stream, RequestHandler::new(&config.root, cache, files), config.workers)
    }

    pub fn from_stream(
        stream: TcpStream,
        handler: RequestHandler,
        workers: usize,
    ) -> Result<Self, StorageError> {
        let local_addr = stream.local_addr()?;
        let (read_half, write_half) = stream.into_split();
        tracing::info!(local = %local_addr, "Connected to front-end");

        Ok(Self {
            handler: Arc::new(handler),
            reader: BufReader::new(read_half),
            writer: Arc::new(Mutex::new(write_half)),
            workers: Arc::new(Semaphore::new(workers.max(1))),
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve requests until the front-end closes the connection.
    pub async fn run(mut self) -> Result<(), StorageError> {
        loop {
            let message = match read_message(&mut self.reader).await? {
                Some(message) => message,
                None => {
                    tracing::info!("Front-end closed the connection");
                    return Ok(());
                }
            };

            let permit = self
                .workers
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| StorageError::Closed)?;
            let handler = self.handler.clone();
            let writer = self.writer.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let Some(response) = handle_message(&handler, message).await else {
                    return;
                };
                let bytes = response.encode();
                let mut writer = writer.lock().await;
                if let Err(e) = writer.write_all(&bytes).await {
                    tracing::warn!(request_id = %response.request_id, error = %e, "Failed to write response");
                }
            });
        }
    }
}

async fn handle_message(handler: &RequestHandler, message: Vec<u8>) -> Option<Response> {
    let (id, message) = match envelope::decode(message) {
        Ok(decoded) => decoded,
        Err(e) => {
            // Without an id there is no one to answer.
            tracing::warn!(error = %e, "Dropping request without a usable envelope");
            return None;
        }
    };

    match Request::parse(&message) {
        Ok(request) => {
            tracing::debug!(request_id = %id, verb = %request.verb, path = %request.path, "Handling request");
            Some(handler.handle(id, &request.verb, &request.path, &request.body).await)
        }
        Err(e) => {
            tracing::warn!(request_id = %id, error = %e, "Malformed request");
            Some(Response::new(Status::BadRequest, "-", id).with_body(USAGE))
        }
    }
}

//! Verb dispatch for a storage node.

use std::sync::Arc;
use tokio::sync::Mutex;

use super::cache::ContentCache;
use super::files::FileStore;
use super::StorageError;
use crate::protocol::{RequestId, Response, Status};
use crate::routing::hash::fnv1a;

pub const USAGE: &str = "URI should be /{origin}/{entity}/{id}\n";
pub const NOT_FOUND: &str = "File not found\n";
pub const CONFLICT: &str = "A file with that URI already exists\n";
pub const CREATED: &str = "Created\n";
pub const UNKNOWN_METHOD: &str = "Unknown request method\n";

const PATH_LOCK_STRIPES: usize = 64;

/// Serves GET/POST/PUT/DELETE against a file store through a read-through cache.
///
/// Requests for the same path are serialized, so the file and its cache entry
/// are always updated together.
#[derive(Debug, Clone)]
pub struct RequestHandler {
    name: String,
    cache: Arc<ContentCache>,
    files: FileStore,
    path_locks: Arc<Vec<Mutex<()>>>,
}

impl RequestHandler {
    pub fn new(name: impl Into<String>, cache: Arc<ContentCache>, files: FileStore) -> Self {
        Self {
            name: name.into(),
            cache,
            files,
            path_locks: Arc::new((0..PATH_LOCK_STRIPES).map(|_| Mutex::new(())).collect()),
        }
    }

    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    pub async fn handle(&self, id: RequestId, verb: &str, path: &str, body: &[u8]) -> Response {
        if path == "/" {
            tracing::debug!(node = %self.name, "Empty path");
            return Response::new(Status::BadRequest, verb, id).with_body(USAGE);
        }

        let _guard = self.path_lock(path).lock().await;
        let result = match verb {
            "GET" => self.handle_get(path).await,
            "POST" => self.handle_post(path, body).await,
            "PUT" => self.handle_put(path, body).await,
            "DELETE" => self.handle_delete(path).await,
            _ => {
                tracing::debug!(node = %self.name, verb = %verb, "Unknown request method");
                Ok((Status::NotImplemented, UNKNOWN_METHOD.as_bytes().to_vec()))
            }
        };

        let (status, body) = match result {
            Ok(outcome) => outcome,
            Err(StorageError::NotFound(_)) => (Status::NotFound, NOT_FOUND.as_bytes().to_vec()),
            Err(StorageError::AlreadyExists(_)) => (Status::Conflict, CONFLICT.as_bytes().to_vec()),
            Err(StorageError::InvalidPath(_)) => (Status::BadRequest, USAGE.as_bytes().to_vec()),
            Err(e) => {
                // No 5xx in the protocol; an unreadable file is reported as missing.
                tracing::error!(node = %self.name, path = %path, error = %e, "Storage failure");
                (Status::NotFound, NOT_FOUND.as_bytes().to_vec())
            }
        };

        Response::new(status, verb, id).with_body(body)
    }

    fn path_lock(&self, path: &str) -> &Mutex<()> {
        &self.path_locks[fnv1a(path.as_bytes()) as usize % self.path_locks.len()]
    }

    async fn handle_get(&self, path: &str) -> Result<(Status, Vec<u8>), StorageError> {
        if let Some(cached) = self.cache.get_entry(path) {
            tracing::info!(node = %self.name, path = %path, "Cache HIT");
            return Ok((Status::Ok, cached));
        }

        tracing::info!(node = %self.name, path = %path, "Cache MISS");
        let content = self.files.fetch(path).await?;
        self.cache.load_entry(path, content.clone());
        Ok((Status::Ok, content))
    }

    async fn handle_post(&self, path: &str, body: &[u8]) -> Result<(Status, Vec<u8>), StorageError> {
        self.files.create(path, body).await?;
        self.cache.load_entry(path, body.to_vec());
        Ok((Status::Created, CREATED.as_bytes().to_vec()))
    }

    async fn handle_put(&self, path: &str, body: &[u8]) -> Result<(Status, Vec<u8>), StorageError> {
        self.files.update(path, body).await?;
        self.cache.load_entry(path, body.to_vec());
        Ok((Status::NoContent, Vec::new()))
    }

    async fn handle_delete(&self, path: &str) -> Result<(Status, Vec<u8>), StorageError> {
        self.files.delete(path).await?;
        self.cache.delete_entry(path);
        Ok((Status::NoContent, Vec::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handler() -> RequestHandler {
        let root = std::env::temp_dir().join(format!("shardgate-handler-{}", uuid::Uuid::new_v4()));
        RequestHandler::new("test", Arc::new(ContentCache::new(16)), FileStore::new(root))
    }

    fn id() -> RequestId {
        RequestId::from("req")
    }

    #[tokio::test]
    async fn get_missing_is_404() {
        let h = handler();
        let resp = h.handle(id(), "GET", "/docs/readme", b"").await;
        assert_eq!(resp.status, Status::NotFound);
        assert_eq!(resp.body, b"File not found\n");
    }

    #[tokio::test]
    async fn post_then_get_is_served_from_cache() {
        let h = handler();
        let created = h.handle(id(), "POST", "/docs/readme", b"hello").await;
        assert_eq!(created.status, Status::Created);
        assert_eq!(created.body, b"Created\n");

        // Remove the file behind the handler's back: only the cache can answer now.
        let file = h.files.resolve("/docs/readme").unwrap();
        std::fs::remove_file(file).unwrap();

        let got = h.handle(id(), "GET", "/docs/readme", b"").await;
        assert_eq!(got.status, Status::Ok);
        assert_eq!(got.body, b"hello");
    }

    #[tokio::test]
    async fn post_over_existing_is_409() {
        let h = handler();
        h.handle(id(), "POST", "/docs/readme", b"one").await;
        let resp = h.handle(id(), "POST", "/docs/readme", b"two").await;
        assert_eq!(resp.status, Status::Conflict);
        assert_eq!(resp.body, CONFLICT.as_bytes());
    }

    #[tokio::test]
    async fn put_updates_or_404s() {
        let h = handler();
        assert_eq!(h.handle(id(), "PUT", "/docs/readme", b"x").await.status, Status::NotFound);

        h.handle(id(), "POST", "/docs/readme", b"old").await;
        let resp = h.handle(id(), "PUT", "/docs/readme", b"new").await;
        assert_eq!(resp.status, Status::NoContent);
        assert!(resp.body.is_empty());
        assert_eq!(h.cache().get_entry("/docs/readme"), Some(b"new".to_vec()));
    }

    #[tokio::test]
    async fn delete_removes_file_and_cache_entry() {
        let h = handler();
        let missing = h.handle(id(), "DELETE", "/docs/missing", b"").await;
        assert_eq!(missing.status, Status::NotFound);
        assert_eq!(missing.body, b"File not found\n");

        h.handle(id(), "POST", "/docs/readme", b"hello").await;
        assert!(h.cache().has_entry("/docs/readme"));

        let resp = h.handle(id(), "DELETE", "/docs/readme", b"").await;
        assert_eq!(resp.status, Status::NoContent);
        assert!(resp.body.is_empty());
        assert!(!h.cache().has_entry("/docs/readme"));
    }

    #[tokio::test]
    async fn root_path_and_unknown_verb() {
        let h = handler();
        let root = h.handle(id(), "GET", "/", b"").await;
        assert_eq!(root.status, Status::BadRequest);
        assert_eq!(root.body, USAGE.as_bytes());

        let patch = h.handle(id(), "PATCH", "/docs/readme", b"").await;
        assert_eq!(patch.status, Status::NotImplemented);
        assert_eq!(patch.method, "PATCH");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_put_and_delete_keep_cache_coherent() {
        let h = handler();
        for round in 0..50u32 {
            h.handle(id(), "POST", "/docs/readme", b"seed").await;

            let body = format!("round-{}", round).into_bytes();
            let put = {
                let h = h.clone();
                let body = body.clone();
                tokio::spawn(async move { h.handle(id(), "PUT", "/docs/readme", &body).await })
            };
            let delete = {
                let h = h.clone();
                tokio::spawn(async move { h.handle(id(), "DELETE", "/docs/readme", b"").await })
            };
            put.await.unwrap();
            assert_eq!(delete.await.unwrap().status, Status::NoContent);

            // The file is gone whichever ran first, so nothing may be cached.
            let file = h.files.resolve("/docs/readme").unwrap();
            assert!(!file.exists());
            assert!(!h.cache().has_entry("/docs/readme"), "stale entry in round {}", round);
            assert_eq!(h.handle(id(), "GET", "/docs/readme", b"").await.status, Status::NotFound);
        }
    }
}

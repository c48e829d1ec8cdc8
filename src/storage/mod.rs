//! Storage node subsystem.
//!
//! # Data Flow
//! ```text
//! bridge connection
//!     → node.rs (read framed request, decode Request-Id)
//!     → handler.rs (dispatch on verb)
//!         → cache.rs (GET hit: no file I/O)
//!         → files.rs (GET miss, POST, PUT, DELETE)
//!     → node.rs (encode response echoing Request-Id)
//! ```
//!
//! # Design Decisions
//! - Not-found and already-exists are explicit error variants, mapped to 404/409
//! - Writes keep the cache coherent: POST/PUT load, DELETE evicts
//! - One node owns one shard; nodes share nothing

pub mod cache;
pub mod files;
pub mod handler;
pub mod node;

use thiserror::Error;

pub use cache::ContentCache;
pub use files::FileStore;
pub use handler::RequestHandler;
pub use node::StorageNode;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("file not found: {0}")]
    NotFound(String),

    #[error("file already exists: {0}")]
    AlreadyExists(String),

    #[error("invalid resource path: {0}")]
    InvalidPath(String),

    #[error("failed to reach front-end: {0}")]
    Connect(std::io::Error),

    #[error("storage node shut down")]
    Closed,

    #[error("bridge framing error: {0}")]
    Wire(#[from] crate::protocol::WireError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

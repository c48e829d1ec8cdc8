//! Sharding front-end.
//!
//! Routes client requests to a fixed set of storage shards by hashing each
//! resource's origin, and correlates the shards' asynchronous responses back to
//! the waiting clients.

// Core pipeline
pub mod correlation;
pub mod frontend;
pub mod net;
pub mod protocol;
pub mod routing;

// Collaborators
pub mod audit;
pub mod storage;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod resilience;

pub use config::{FrontEndConfig, StorageConfig};
pub use frontend::FrontEndServer;
pub use lifecycle::Shutdown;
pub use storage::StorageNode;

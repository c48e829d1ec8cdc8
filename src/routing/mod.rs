//! Shard routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     ShardAcceptor::bind → accept N storage nodes
//!     → sort by peer address → ShardRouter (index = sort position)
//!
//! Request path:
//!     path → hash.rs (origin = first segment, FNV-1a % N)
//!     → shard.rs (send lock → write)
//!
//! Response path:
//!     responder(shard) → shard.rs (receive lock → read one frame)
//! ```
//!
//! # Design Decisions
//! - Shard set is fixed at startup, immutable at runtime
//! - Send and receive locks are independent: each connection is full duplex
//! - Deterministic: same origin always maps to the same shard

pub mod hash;
pub mod router;
pub mod shard;

pub use router::{BridgeError, ShardAcceptor, ShardRouter};
pub use shard::ShardConnection;

//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (frontend::server):
//!     Bind bridge → accept N shards → accept audit collector
//!     → bind ingress → spawn responders
//!
//! Shutdown:
//!     Signal received (signals.rs)
//!     → Shutdown::trigger (shutdown.rs)
//!     → stop ingress, drain receivers
//!     → close shards (responders unblock) → join responders
//!     → close audit sink
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Shutdown order is fixed; the audit sink closes last

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;

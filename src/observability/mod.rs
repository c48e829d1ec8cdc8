//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout via tracing-subscriber
//!     → Prometheus scrape endpoint
//! ```
//!
//! # Design Decisions
//! - Request ID and shard index are attached to every per-request event
//! - Metrics are cheap (atomic increments) and optional

pub mod logging;
pub mod metrics;

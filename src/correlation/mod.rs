//! Request/response correlation.
//!
//! # Data Flow
//! ```text
//! Receiver: new_request(client) → id → envelope → shard
//! Responder: shard → id → get_client_from_request(id) → deliver → request_completed(id)
//! ```
//!
//! # Design Decisions
//! - The only state shared by receivers and responders
//! - Constructed once at startup and passed around in an `Arc`
//! - A lookup moves the connection out; the id stays reserved until retired

pub mod table;

pub use table::{CorrelationTable, TableError};

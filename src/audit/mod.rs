//! Audit trail of delivered responses.
//!
//! Every responder reports `(date, client address, method, status)` for each
//! response it delivers. All shards share one sink, so record order is
//! best-effort: interleaved across shards, not causal.

pub mod sink;

pub use sink::{AuditError, AuditRecord, AuditSink};

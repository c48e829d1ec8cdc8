//! Resilience helpers.
//!
//! The front-end has no retry, timeout or failover on the request
//! path. The only retried operation is a storage node's initial dial.

pub mod backoff;

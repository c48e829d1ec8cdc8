//! Front-end pipeline.
//!
//! # Data Flow
//! ```text
//! client → ingress.rs (bounded accept)
//!        → receiver.rs (read, register, wrap, forward)
//!        → shard
//! shard  → responder.rs (one per shard: decode, look up, deliver, retire, audit)
//!        → client
//! ```
//!
//! # Design Decisions
//! - Receivers and responders share nothing but the correlation table
//! - No retry, timeout or failover: a closed shard retires its responder and
//!   orphans whatever was pending on it
//! - A request that cannot be read or decoded is dropped without a response

pub mod ingress;
pub mod receiver;
pub mod responder;
pub mod server;

pub use ingress::IngressServer;
pub use receiver::{receive, ReceiveError, Received};
pub use responder::{Responder, ResponderExit};
pub use server::{FrontEndServer, ServerError};

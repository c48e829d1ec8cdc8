//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (wait for a receiver slot, then accept)
//!     → connection.rs (ClientConnection: read one request, deliver, close)
//!     → Hand off to a receiver worker
//! ```
//!
//! # Design Decisions
//! - Receiver slots are acquired before accept: saturation is backpressure
//! - Each in-flight receiver is tracked so shutdown can drain them

pub mod connection;
pub mod listener;

pub use connection::{ClientConnection, ConnectionGuard, ConnectionTracker};
pub use listener::{Listener, ListenerError, ReceiverPermit};

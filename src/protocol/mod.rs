//! Wire protocol subsystem.
//!
//! # Data Flow
//! ```text
//! Client bytes
//!     → wire.rs (frame one message: head + Content-Length body)
//!     → request.rs (verb, path, version, headers, body)
//!     → envelope.rs (inject Request-Id after the request line)
//!     → shard connection
//!
//! Shard bytes
//!     → wire.rs (frame one response)
//!     → envelope.rs (extract Request-Id, pass bytes through)
//!     → response.rs (status, date, method for auditing)
//!     → client
//! ```
//!
//! # Design Decisions
//! - Messages are `START LINE\r\nHeaders\r\n\r\nBody`
//! - Body length is always taken from `Content-Length` (absent = 0)
//! - Header names compare case-insensitively
//! - The envelope codec never rewrites bytes beyond the injected header

pub mod envelope;
pub mod request;
pub mod response;
pub mod wire;

pub use envelope::{EnvelopeError, RequestId, REQUEST_ID_HEADER};
pub use request::Request;
pub use response::{Response, ResponseSummary, Status};
pub use wire::{read_message, Message, WireError};

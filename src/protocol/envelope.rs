//! Request-Id envelope codec.
//!
//! Every message crossing a shard connection carries a `Request-Id` header so a
//! response can be matched to the client waiting for it. [`encode`] injects the
//! header right after the start line; storage nodes echo it in their responses;
//! [`decode`] reads it back.
//!
//! [`decode`] hands back the response bytes *unchanged*: the `Request-Id` header
//! stays in what the client finally receives. Callers wanting a stripped payload
//! must strip it themselves.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use super::wire::{find, Message, WireError};

/// Header carrying the correlation token.
pub const REQUEST_ID_HEADER: &str = "Request-Id";

/// Errors raised by the envelope codec.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// Line or section delimiters are missing, or the head is unreadable.
    #[error("malformed envelope: {0}")]
    Malformed(#[from] WireError),

    /// The message has no start line to anchor the header after.
    #[error("malformed envelope: no start line")]
    MissingStartLine,

    /// A response came back without the correlation header.
    #[error("malformed envelope: missing {REQUEST_ID_HEADER} header")]
    MissingRequestId,
}

/// Opaque correlation token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Insert `Request-Id: <id>` directly after the start line.
///
/// Everything after the start line is preserved byte-for-byte.
pub fn encode(request: &[u8], id: &RequestId) -> Result<Vec<u8>, EnvelopeError> {
    let line_end = find(request, b"\r\n").ok_or(EnvelopeError::MissingStartLine)?;
    let (start_line, rest) = request.split_at(line_end + 2);

    let header = format!("{}: {}\r\n", REQUEST_ID_HEADER, id);
    let mut out = Vec::with_capacity(request.len() + header.len());
    out.extend_from_slice(start_line);
    out.extend_from_slice(header.as_bytes());
    out.extend_from_slice(rest);
    Ok(out)
}

/// Extract the `Request-Id` of a framed message.
///
/// The bytes are returned as they came in, header included.
pub fn decode(message: Vec<u8>) -> Result<(RequestId, Vec<u8>), EnvelopeError> {
    let id = {
        let parsed = Message::parse(&message)?;
        parsed
            .header(REQUEST_ID_HEADER)
            .map(RequestId::from)
            .ok_or(EnvelopeError::MissingRequestId)?
    };
    Ok((id, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: &[u8] = b"POST /docs/readme HTTP/1.1\r\nHost: example\r\nContent-Length: 5\r\n\r\nhello";

    #[test]
    fn encode_inserts_after_start_line() {
        let id = RequestId::from("abc123");
        let encoded = encode(REQUEST, &id).unwrap();
        assert_eq!(
            encoded,
            b"POST /docs/readme HTTP/1.1\r\nRequest-Id: abc123\r\nHost: example\r\nContent-Length: 5\r\n\r\nhello"
        );
    }

    #[test]
    fn decode_of_encode_returns_id_and_inserted_message() {
        let id = RequestId::generate();
        let encoded = encode(REQUEST, &id).unwrap();
        let (decoded_id, bytes) = decode(encoded.clone()).unwrap();
        assert_eq!(decoded_id, id);
        assert_eq!(bytes, encoded);
    }

    #[test]
    fn decode_matches_header_case_insensitively() {
        let raw = b"HTTP/1.1 204 No Content\r\nrequest-id: xyz\r\n\r\n".to_vec();
        let (id, bytes) = decode(raw.clone()).unwrap();
        assert_eq!(id.as_str(), "xyz");
        assert_eq!(bytes, raw);
    }

    #[test]
    fn encode_requires_a_line_delimiter() {
        let err = encode(b"GET /docs/readme HTTP/1.1", &RequestId::from("a")).unwrap_err();
        assert!(matches!(err, EnvelopeError::MissingStartLine));
    }

    #[test]
    fn decode_rejects_missing_sections() {
        let err = decode(b"HTTP/1.1 200 OK\r\nRequest-Id: a\r\n".to_vec()).unwrap_err();
        assert!(matches!(err, EnvelopeError::Malformed(WireError::MissingTerminator)));

        let err = decode(b"HTTP/1.1 200 OK\r\n\r\n".to_vec()).unwrap_err();
        assert!(matches!(err, EnvelopeError::MissingRequestId));
    }

    #[test]
    fn generated_ids_differ() {
        assert_ne!(RequestId::generate(), RequestId::generate());
    }
}

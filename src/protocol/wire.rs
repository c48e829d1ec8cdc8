//! Message framing.
//!
//! # Responsibilities
//! - Read exactly one framed message off a buffered stream
//! - Split a framed message into start line, headers and body
//!
//! A message ends after its blank line plus `Content-Length` body bytes. Several
//! messages may share one stream (shard connections), so nothing past the declared
//! body is ever consumed.

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Upper bound on the head (start line + headers) of a single message.
pub const MAX_HEAD_BYTES: usize = 64 * 1024;

/// Upper bound on a declared body.
pub const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

const CRLF: &[u8] = b"\r\n";
const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Errors raised while framing or splitting a message.
#[derive(Debug, Error)]
pub enum WireError {
    /// The peer closed the stream part-way through a message.
    #[error("connection closed mid-message after {0} bytes")]
    Truncated(usize),

    /// The head exceeded [`MAX_HEAD_BYTES`].
    #[error("message head exceeds {MAX_HEAD_BYTES} bytes")]
    HeadTooLarge,

    /// `Content-Length` is not a number or exceeds [`MAX_BODY_BYTES`].
    #[error("invalid Content-Length: {0}")]
    InvalidLength(String),

    /// The blank line separating head and body is missing.
    #[error("missing header terminator")]
    MissingTerminator,

    /// The head is not valid UTF-8.
    #[error("message head is not valid UTF-8")]
    InvalidUtf8,

    /// A header line has no `:` separator.
    #[error("malformed header line: {0:?}")]
    MalformedHeader(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A borrowed view over one framed message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message<'a> {
    pub start_line: &'a str,
    pub headers: Vec<(&'a str, &'a str)>,
    pub body: &'a [u8],
}

impl<'a> Message<'a> {
    /// Split raw bytes into start line, headers and body.
    pub fn parse(bytes: &'a [u8]) -> Result<Self, WireError> {
        let head_end = find(bytes, HEAD_TERMINATOR).ok_or(WireError::MissingTerminator)?;
        let head = std::str::from_utf8(&bytes[..head_end]).map_err(|_| WireError::InvalidUtf8)?;
        let body = &bytes[head_end + HEAD_TERMINATOR.len()..];

        let mut lines = head.split("\r\n");
        let start_line = lines.next().unwrap_or_default();

        let mut headers = Vec::new();
        for line in lines {
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| WireError::MalformedHeader(line.to_string()))?;
            headers.push((name.trim(), value.trim()));
        }

        Ok(Self {
            start_line,
            headers,
            body,
        })
    }

    /// Case-insensitive header lookup. Returns the first match.
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| *v)
    }
}

/// Read one complete message.
///
/// Returns `Ok(None)` when the stream ends cleanly before the first byte of a
/// message, and [`WireError::Truncated`] when it ends anywhere after that.
pub async fn read_message<R>(reader: &mut R) -> Result<Option<Vec<u8>>, WireError>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::with_capacity(512);
    let mut content_length = 0usize;

    loop {
        let line_start = buf.len();
        // Never buffer more than one byte past the head limit.
        let budget = (MAX_HEAD_BYTES + 1 - line_start) as u64;
        let n = (&mut *reader).take(budget).read_until(b'\n', &mut buf).await?;
        if n == 0 {
            return if buf.is_empty() {
                Ok(None)
            } else {
                Err(WireError::Truncated(buf.len()))
            };
        }
        if buf.len() > MAX_HEAD_BYTES {
            return Err(WireError::HeadTooLarge);
        }

        let line = &buf[line_start..];
        if line == CRLF {
            // A leading blank line (stray CRLF between messages) is skipped.
            if line_start == 0 {
                buf.clear();
                continue;
            }
            break;
        }
        if let Some(length) = parse_content_length(line)? {
            content_length = length;
        }
    }

    let head_len = buf.len();
    buf.resize(head_len + content_length, 0);
    if let Err(e) = reader.read_exact(&mut buf[head_len..]).await {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            return Err(WireError::Truncated(head_len));
        }
        return Err(e.into());
    }

    Ok(Some(buf))
}

fn parse_content_length(line: &[u8]) -> Result<Option<usize>, WireError> {
    let Ok(line) = std::str::from_utf8(line) else {
        return Ok(None);
    };
    let Some((name, value)) = line.split_once(':') else {
        return Ok(None);
    };
    if !name.trim().eq_ignore_ascii_case("content-length") {
        return Ok(None);
    }

    let value = value.trim();
    let length: usize = value
        .parse()
        .map_err(|_| WireError::InvalidLength(value.to_string()))?;
    if length > MAX_BODY_BYTES {
        return Err(WireError::InvalidLength(value.to_string()));
    }
    Ok(Some(length))
}

/// Position of the first occurrence of `needle` in `haystack`.
pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

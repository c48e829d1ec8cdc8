//! Response encoding (storage side) and summarizing (audit side).

use chrono::Utc;

use super::envelope::{RequestId, REQUEST_ID_HEADER};
use super::wire::{Message, WireError};

/// Header naming the verb that produced a response.
pub const METHOD_HEADER: &str = "Method";

/// Status codes this system emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Created,
    NoContent,
    BadRequest,
    NotFound,
    Conflict,
    NotImplemented,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::Created => 201,
            Status::NoContent => 204,
            Status::BadRequest => 400,
            Status::NotFound => 404,
            Status::Conflict => 409,
            Status::NotImplemented => 501,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Created => "Created",
            Status::NoContent => "No Content",
            Status::BadRequest => "Bad Request",
            Status::NotFound => "Not Found",
            Status::Conflict => "Conflict",
            Status::NotImplemented => "Not Implemented",
        }
    }
}

/// A response produced by a storage node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub method: String,
    pub request_id: RequestId,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: Status, method: impl Into<String>, request_id: RequestId) -> Self {
        Self {
            status,
            method: method.into(),
            request_id,
            body: Vec::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Serialize with `Request-Id`, `Date`, `Method` and `Content-Length` headers.
    pub fn encode(&self) -> Vec<u8> {
        let head = format!(
            "HTTP/1.1 {} {}\r\n{}: {}\r\nDate: {}\r\n{}: {}\r\nContent-Length: {}\r\n\r\n",
            self.status.code(),
            self.status.reason(),
            REQUEST_ID_HEADER,
            self.request_id,
            Utc::now().to_rfc2822(),
            METHOD_HEADER,
            self.method,
            self.body.len(),
        );

        let mut out = head.into_bytes();
        out.extend_from_slice(&self.body);
        out
    }
}

/// The `(status, date, method)` triple audited for every delivered response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSummary {
    pub status: u16,
    pub date: Option<String>,
    pub method: Option<String>,
}

impl ResponseSummary {
    pub fn parse(bytes: &[u8]) -> Result<Self, WireError> {
        let msg = Message::parse(bytes)?;
        let status = msg
            .start_line
            .split_whitespace()
            .nth(1)
            .and_then(|code| code.parse().ok())
            .ok_or_else(|| WireError::MalformedHeader(msg.start_line.to_string()))?;

        Ok(Self {
            status,
            date: msg.header("Date").map(str::to_string),
            method: msg.header(METHOD_HEADER).map(str::to_string),
        })
    }
}

//! Client request decoding.

use super::wire::{Message, WireError};

/// A decoded request. Owns its parts so it can outlive the frame it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub verb: String,
    pub path: String,
    pub version: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Request {
    /// Decode `VERB path version\r\nHeaders\r\n\r\nBody`.
    pub fn parse(bytes: &[u8]) -> Result<Self, WireError> {
        let msg = Message::parse(bytes)?;

        let mut parts = msg.start_line.split_whitespace();
        let (Some(verb), Some(path), Some(version), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(WireError::MalformedHeader(msg.start_line.to_string()));
        };

        Ok(Self {
            verb: verb.to_string(),
            path: path.to_string(),
            version: version.to_string(),
            headers: msg
                .headers
                .iter()
                .map(|(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            body: msg.body.to_vec(),
        })
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Serialize back to wire form, setting `Content-Length` from the body.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!("{} {} {}\r\n", self.verb, self.path, self.version);
        for (name, value) in &self.headers {
            if name.eq_ignore_ascii_case("content-length") {
                continue;
            }
            out.push_str(&format!("{}: {}\r\n", name, value));
        }
        if !self.body.is_empty() {
            out.push_str(&format!("Content-Length: {}\r\n", self.body.len()));
        }
        out.push_str("\r\n");

        let mut bytes = out.into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}

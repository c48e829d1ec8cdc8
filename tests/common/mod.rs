//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

use shardgate::config::{FrontEndConfig, StorageConfig};
use shardgate::protocol::{envelope, read_message, Request, Response, Status};

/// Front-end config on fixed loopback ports `base`, `base + 1`, `base + 2`.
/// Audit starts disabled.
pub fn frontend_config(base: u16, shards: usize) -> FrontEndConfig {
    let mut config = FrontEndConfig::default();
    config.listener.bind_address = format!("127.0.0.1:{}", base);
    config.listener.receivers = 8;
    config.bridge.bind_address = format!("127.0.0.1:{}", base + 1);
    config.bridge.shards = shards;
    config.audit.enabled = false;
    config.audit.bind_address = format!("127.0.0.1:{}", base + 2);
    config
}

pub fn storage_config(bridge_address: &str) -> StorageConfig {
    let root = std::env::temp_dir().join(format!("shardgate-it-{}", uuid::Uuid::new_v4()));
    StorageConfig {
        bridge_address: bridge_address.to_string(),
        root: root.to_string_lossy().into_owned(),
        connect_attempts: 50,
        connect_base_delay_ms: 20,
        connect_max_delay_ms: 100,
        ..StorageConfig::default()
    }
}

pub fn remove_root(config: &StorageConfig) {
    let _ = std::fs::remove_dir_all(PathBuf::from(&config.root));
}

/// Dial `addr` until it accepts.
pub async fn connect_with_retry(addr: &str) -> TcpStream {
    for _ in 0..100 {
        if let Ok(stream) = TcpStream::connect(addr).await {
            return stream;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("{} never accepted", addr);
}

/// Connect to the audit channel and collect every line until it closes.
pub fn start_audit_collector(addr: String) -> JoinHandle<Vec<serde_json::Value>> {
    tokio::spawn(async move {
        let stream = connect_with_retry(&addr).await;
        let mut lines = BufReader::new(stream).lines();
        let mut records = Vec::new();
        while let Ok(Some(line)) = lines.next_line().await {
            records.push(serde_json::from_str(&line).unwrap());
        }
        records
    })
}

/// Send one raw request and read until the front-end closes the connection.
pub async fn send_raw(addr: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(request).await.unwrap();
    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.unwrap();
    response
}

pub async fn request(addr: SocketAddr, verb: &str, path: &str, body: &str) -> Vec<u8> {
    let raw = Request {
        verb: verb.to_string(),
        path: path.to_string(),
        version: "HTTP/1.1".to_string(),
        headers: vec![("Host".to_string(), "test".to_string())],
        body: body.as_bytes().to_vec(),
    }
    .to_bytes();
    send_raw(addr, &raw).await
}

pub fn status_of(response: &[u8]) -> u16 {
    let text = String::from_utf8_lossy(response);
    text.split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .unwrap_or_else(|| panic!("no status line in {:?}", text))
}

pub fn body_of(response: &[u8]) -> &[u8] {
    let pos = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("no header terminator");
    &response[pos + 4..]
}

/// First origin-bearing path that routes to `shard`.
pub fn path_for_shard(shard: usize, shards: usize) -> String {
    (0..)
        .map(|i| format!("/origin{}/item", i))
        .find(|path| shardgate::routing::hash::shard_for(path, shards) == shard)
        .unwrap()
}

/// A hand-driven shard: answers each request with `200 OK` and its path as body.
pub fn start_echo_shard(stream: TcpStream) -> JoinHandle<()> {
    tokio::spawn(async move {
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);
        while let Ok(Some(message)) = read_message(&mut reader).await {
            let (id, bytes) = envelope::decode(message).unwrap();
            let request = Request::parse(&bytes).unwrap();
            let response = Response::new(Status::Ok, request.verb, id).with_body(request.path);
            if write_half.write_all(&response.encode()).await.is_err() {
                break;
            }
        }
    })
}

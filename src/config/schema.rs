//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files, and every
//! section has defaults so a minimal file (or none) is valid.

use serde::{Deserialize, Serialize};

/// Root configuration for the sharding front-end.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FrontEndConfig {
    /// Client-facing listener.
    pub listener: ListenerConfig,

    /// Storage node side.
    pub bridge: BridgeConfig,

    /// Audit channel.
    pub audit: AuditConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Client listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Receiver pool size. Acceptance blocks while every receiver is busy.
    pub receivers: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            receivers: 32,
        }
    }
}

/// Storage node bridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Address storage nodes dial in to.
    pub bind_address: String,

    /// Number of storage nodes to wait for. Fixed for the life of the process.
    pub shards: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:9000".to_string(),
            shards: 3,
        }
    }
}

/// Audit channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuditConfig {
    /// When false, records are discarded and no collector is awaited.
    pub enabled: bool,

    /// Address the audit collector dials in to.
    pub bind_address: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "0.0.0.0:9100".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Storage node configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Front-end bridge address to dial.
    pub bridge_address: String,

    /// Directory holding stored resources.
    pub root: String,

    /// Maximum cached resources. Oldest insertions are evicted first.
    pub cache_entries: usize,

    /// Requests handled concurrently.
    pub workers: usize,

    /// Dial attempts before giving up on the front-end.
    pub connect_attempts: u32,

    /// Base delay between dial attempts in milliseconds.
    pub connect_base_delay_ms: u64,

    /// Maximum delay between dial attempts in milliseconds.
    pub connect_max_delay_ms: u64,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bridge_address: "127.0.0.1:9000".to_string(),
            root: "./data".to_string(),
            cache_entries: 1024,
            workers: 8,
            connect_attempts: 10,
            connect_base_delay_ms: 100,
            connect_max_delay_ms: 2000,
            log_level: "info".to_string(),
        }
    }
}

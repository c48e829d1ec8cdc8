//! Configuration validation.
//!
//! Serde handles syntax; this checks values. Every problem is reported, not
//! just the first.

use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;

use super::schema::{FrontEndConfig, StorageConfig};

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            field,
            format!("{:?} is not a socket address", value),
        ));
    }
}

pub fn validate_config(config: &FrontEndConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.bridge.shards == 0 {
        errors.push(ValidationError::new("bridge.shards", "must be at least 1"));
    }
    if config.listener.receivers == 0 {
        errors.push(ValidationError::new("listener.receivers", "must be at least 1"));
    }

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    check_address(&mut errors, "bridge.bind_address", &config.bridge.bind_address);
    if config.audit.enabled {
        check_address(&mut errors, "audit.bind_address", &config.audit.bind_address);
    }
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let mut seen = HashSet::new();
    let mut binds = vec![
        ("listener.bind_address", &config.listener.bind_address),
        ("bridge.bind_address", &config.bridge.bind_address),
    ];
    if config.audit.enabled {
        binds.push(("audit.bind_address", &config.audit.bind_address));
    }
    for (field, address) in binds {
        // Port 0 asks the OS for a fresh port, so it never collides.
        if address.ends_with(":0") {
            continue;
        }
        if !seen.insert(address.as_str()) {
            errors.push(ValidationError::new(
                field,
                format!("{} is already used by another listener", address),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

pub fn validate_storage_config(config: &StorageConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.root.trim().is_empty() {
        errors.push(ValidationError::new("root", "must not be empty"));
    }
    if config.workers == 0 {
        errors.push(ValidationError::new("workers", "must be at least 1"));
    }
    if config.connect_attempts == 0 {
        errors.push(ValidationError::new("connect_attempts", "must be at least 1"));
    }
    if config.bridge_address.trim().is_empty() {
        errors.push(ValidationError::new("bridge_address", "must not be empty"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

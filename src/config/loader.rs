//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::schema::{FrontEndConfig, StorageConfig};
use crate::config::validation::{validate_config, validate_storage_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content)?)
}

/// Load and validate front-end configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<FrontEndConfig, ConfigError> {
    let config: FrontEndConfig = read_toml(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Load and validate storage node configuration from a TOML file.
pub fn load_storage_config(path: &Path) -> Result<StorageConfig, ConfigError> {
    let config: StorageConfig = read_toml(path)?;
    validate_storage_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("shardgate-{}-{}.toml", name, uuid::Uuid::new_v4()));
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn loads_valid_file() {
        let path = write_temp(
            "valid",
            r#"
            [listener]
            bind_address = "127.0.0.1:8080"
            receivers = 4

            [bridge]
            bind_address = "127.0.0.1:9000"
            shards = 2
            "#,
        );
        let config = load_config(&path).unwrap();
        assert_eq!(config.listener.receivers, 4);
        assert_eq!(config.bridge.shards, 2);
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn invalid_values_fail_validation() {
        let path = write_temp("invalid", "[bridge]\nshards = 0\n");
        let err = load_config(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("bridge.shards"));
        fs::remove_file(path).unwrap();
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/shardgate.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

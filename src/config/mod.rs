//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → FrontEndConfig / StorageConfig (validated, immutable)
//!     → CLI flags override selected fields (see the binaries)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; shard count cannot change at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_storage_config, ConfigError};
pub use schema::{
    AuditConfig, BridgeConfig, FrontEndConfig, ListenerConfig, ObservabilityConfig, StorageConfig,
};
pub use validation::{validate_config, validate_storage_config, ValidationError};

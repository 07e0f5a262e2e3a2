//! catalog-check configuration
//!
//! Provides configuration management for catalog runs:
//! - Run configuration (catalog-check.toml)
//! - Environment variable overrides (CATALOG_CHECK_*)
//! - Relative path resolution against the config file's directory
//!
//! # Configuration Hierarchy
//!
//! Configuration is loaded and merged in the following order (later overrides earlier):
//! 1. Run config (./catalog-check.toml, searched upwards)
//! 2. Environment variables (CATALOG_CHECK_*)
//! 3. CLI flags
//!
//! # Example
//!
//! ```no_run
//! use catalog_check_config::ConfigLoader;
//! use std::path::Path;
//!
//! let loader = ConfigLoader::new();
//! let config = loader.load_from_directory(Path::new(".")).unwrap();
//! ```

pub mod loader;
pub mod settings;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid configuration: {0}")]
    ValidationError(String),

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

// Re-export main types
pub use loader::{Config, ConfigLoader, CONFIG_FILE_NAME};
pub use settings::{CheckConfig, CompilerConfig, FactsConfig, NodesConfig, ReportConfig};

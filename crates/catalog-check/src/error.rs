/// Harness error types
use std::path::PathBuf;
use thiserror::Error;

pub type CheckResult<T> = Result<T, CatalogCheckError>;

#[derive(Debug, Error)]
pub enum CatalogCheckError {
    #[error("Node directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Invalid pattern '{pattern}': {error}")]
    InvalidPattern {
        pattern: String,
        error: regex::Error,
    },

    #[error("Failed to discover nodes in {}: {error}", path.display())]
    Discovery { path: PathBuf, error: String },

    #[error("Scenario file not found: {}", path.display())]
    ScenarioNotFound { path: PathBuf },

    #[error("Invalid scenario file {}: {error}", path.display())]
    ScenarioParse { path: PathBuf, error: String },

    #[error("Failed to load facts from {}: {error}", path.display())]
    FactsLoad { path: PathBuf, error: String },

    #[error("Failed to write report: {0}")]
    Report(String),

    #[error("I/O error at {}: {error}", path.display())]
    IoError {
        path: PathBuf,
        error: std::io::Error,
    },
}

impl CatalogCheckError {
    /// Create a directory not found error
    pub fn directory_not_found(path: impl Into<PathBuf>) -> Self {
        Self::DirectoryNotFound { path: path.into() }
    }

    /// Create an invalid pattern error
    pub fn invalid_pattern(pattern: impl Into<String>, error: regex::Error) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            error,
        }
    }

    /// Create a discovery error
    pub fn discovery(path: impl Into<PathBuf>, error: impl ToString) -> Self {
        Self::Discovery {
            path: path.into(),
            error: error.to_string(),
        }
    }

    /// Create a facts load error
    pub fn facts_load(path: impl Into<PathBuf>, error: impl ToString) -> Self {
        Self::FactsLoad {
            path: path.into(),
            error: error.to_string(),
        }
    }

    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            error,
        }
    }
}

//! Central error types for the asklepios node monitor
//!
//! Uses `thiserror` for ergonomic, type-safe error handling with
//! automatic `Display` and `Error` trait implementations.

use std::path::PathBuf;

use thiserror::Error;

/// Central error type for the asklepios node monitor
#[derive(Error, Debug)]
pub enum Error {
    /// Kubernetes API error from kube-rs
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    /// Config file exists but could not be parsed
    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseError {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Filesystem or socket error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Resource not found in the cluster
    #[error("Resource not found: {kind}/{name}")]
    NotFound { kind: String, name: String },
}

/// Result type alias for monitor operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    /// Whether the fault is expected to clear on a later cycle
    pub fn is_retriable(&self) -> bool {
        matches!(self, Error::KubeError(_) | Error::NotFound { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retriable_classification() {
        let not_found = Error::NotFound {
            kind: "Node".to_string(),
            name: "m1".to_string(),
        };
        assert!(not_found.is_retriable());
        assert_eq!(not_found.to_string(), "Resource not found: Node/m1");

        assert!(!Error::ConfigError("bad".to_string()).is_retriable());
    }
}

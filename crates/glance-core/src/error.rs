//! Error types shared across glance crates.

use std::path::PathBuf;

use thiserror::Error;

/// Errors reported by external collaborators (shell, thumbnail, icon services).
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The service cannot handle this file.
    #[error("Unsupported file: {path}")]
    Unsupported { path: PathBuf },

    /// The service produced nothing for this file.
    #[error("No {what} available for {path}")]
    Unavailable { path: PathBuf, what: &'static str },

    /// Other error.
    #[error("{message}")]
    Other { message: String },
}

impl ServiceError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create an error for a missing artifact.
    pub fn unavailable(path: impl Into<PathBuf>, what: &'static str) -> Self {
        Self::Unavailable {
            path: path.into(),
            what,
        }
    }
}

/// Errors loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for this schema.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values are individually valid but inconsistent.
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },
}

/// The UI-affine context has shut down and can no longer run actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("UI context is closed")]
pub struct UiClosed;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_io() {
        let err = ServiceError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, ServiceError::NotFound { .. }));

        let err = ServiceError::io(
            "/test/path",
            std::io::Error::new(std::io::ErrorKind::InvalidData, "bad"),
        );
        assert!(matches!(err, ServiceError::Io { .. }));
    }

    #[test]
    fn test_unavailable_message() {
        let err = ServiceError::unavailable("/a.png", "thumbnail");
        assert_eq!(err.to_string(), "No thumbnail available for /a.png");
    }
}

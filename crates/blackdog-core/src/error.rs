//! Error types for BlackDog.
//!
//! Errors fall into three families: not-found errors (unknown plugin or
//! version) that the repository server turns into a plain 404, transient
//! fetch errors that batch operations log and skip, and parse/cache errors
//! raised when a page or cache file does not have the expected shape.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Main error type for the BlackDog library.
#[derive(Debug, Error)]
pub enum BlackDogError {
    // Lookup errors
    #[error("Plugin {name} could not be found")]
    NoSuchPlugin { name: String },

    #[error("Version {version} could not be found")]
    NoSuchPluginVersion { version: String },

    #[error("Plugin or version cannot be empty")]
    InvalidPluginVersion,

    // Network errors
    #[error("Network error: {message}")]
    Network {
        message: String,
        /// Optional cause description
        cause: Option<String>,
    },

    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    #[error("{url} answered with HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    // Scraping errors
    #[error("Parse error: {message}")]
    Parse { message: String },

    // File system errors
    #[error("IO error at {path:?}: {message}")]
    Io {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    #[error("Malformed cache file {}: {message}", path.display())]
    Cache { message: String, path: PathBuf },
}

/// Result type alias for BlackDog operations.
pub type Result<T> = std::result::Result<T, BlackDogError>;

impl From<std::io::Error> for BlackDogError {
    fn from(err: std::io::Error) -> Self {
        BlackDogError::Io {
            message: err.to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<reqwest::Error> for BlackDogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            BlackDogError::Timeout(crate::config::NetworkConfig::REQUEST_TIMEOUT)
        } else {
            BlackDogError::Network {
                message: err.to_string(),
                cause: std::error::Error::source(&err).map(|s| s.to_string()),
            }
        }
    }
}

impl From<url::ParseError> for BlackDogError {
    fn from(err: url::ParseError) -> Self {
        BlackDogError::Parse {
            message: format!("invalid URL: {}", err),
        }
    }
}

impl BlackDogError {
    /// Create an IO error with path context.
    pub fn io_with_path(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        BlackDogError::Io {
            message: err.to_string(),
            path: Some(path.into()),
            source: Some(err),
        }
    }

    /// Create a parse error from anything printable.
    pub fn parse(message: impl Into<String>) -> Self {
        BlackDogError::Parse {
            message: message.into(),
        }
    }

    /// Whether this error means the requested plugin or version does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            BlackDogError::NoSuchPlugin { .. } | BlackDogError::NoSuchPluginVersion { .. }
        )
    }

    /// Whether this error is a fetch failure that only makes one item unavailable.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            BlackDogError::Network { .. }
                | BlackDogError::Timeout(_)
                | BlackDogError::HttpStatus { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BlackDogError::NoSuchPlugin {
            name: "worldedit".into(),
        };
        assert_eq!(err.to_string(), "Plugin worldedit could not be found");

        let err = BlackDogError::NoSuchPluginVersion {
            version: "5.6.3".into(),
        };
        assert_eq!(err.to_string(), "Version 5.6.3 could not be found");
    }

    #[test]
    fn test_not_found_classification() {
        assert!(BlackDogError::NoSuchPlugin { name: "x".into() }.is_not_found());
        assert!(BlackDogError::NoSuchPluginVersion { version: "1".into() }.is_not_found());
        assert!(!BlackDogError::parse("bad row").is_not_found());
    }

    #[test]
    fn test_transient_errors() {
        assert!(BlackDogError::Timeout(Duration::from_secs(5)).is_transient());
        assert!(BlackDogError::HttpStatus {
            url: "http://example.com".into(),
            status: 503
        }
        .is_transient());
        assert!(!BlackDogError::NoSuchPlugin { name: "x".into() }.is_transient());
    }
}

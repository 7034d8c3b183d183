//! Error handling for username probing operations.
//!
//! Per-platform failures (transport problems, broken platform definitions)
//! are caught by the dispatcher and turned into `error` outcomes. Only
//! session-level failures reach the caller of `check_username`.

use std::fmt;
use std::time::Duration;

/// Main error type for handle-check operations.
#[derive(Debug, Clone)]
pub enum HandleCheckError {
    /// Username failed syntax validation
    InvalidUsername { username: String, reason: String },

    /// Network-related errors (connection refused, DNS failure, TLS, etc.)
    NetworkError {
        message: String,
        source: Option<String>,
    },

    /// The platform was reached, but the exchange could not be completed:
    /// too many redirects or an unreadable body. Built by the HTTP prober.
    HttpError {
        platform: String,
        message: String,
        status_code: Option<u16>,
    },

    /// A request took longer than the configured timeout
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// Catalog or configuration content could not be parsed
    ParseError { message: String },

    /// Invalid settings or a platform definition missing a required field
    ConfigError { message: String },

    /// File I/O errors when reading catalogs or config files
    FileError { path: String, message: String },

    /// No platforms left after applying the category/platform filters
    EmptySelection {
        category: Option<String>,
        platforms: Option<Vec<String>>,
    },

    /// The session was cancelled before every platform finished
    Interrupted { completed: usize, total: usize },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl HandleCheckError {
    /// Create a new invalid username error.
    pub fn invalid_username<U: Into<String>, R: Into<String>>(username: U, reason: R) -> Self {
        Self::InvalidUsername {
            username: username.into(),
            reason: reason.into(),
        }
    }

    /// Create a new network error with source information.
    pub fn network_with_source<M: Into<String>, S: Into<String>>(message: M, source: S) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a new parse error.
    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::FileError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl fmt::Display for HandleCheckError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUsername { username, reason } => {
                write!(f, "Invalid username '{}': {}", username, reason)
            }
            Self::NetworkError { message, source } => {
                if let Some(source) = source {
                    write!(f, "Network error: {} (source: {})", message, source)
                } else {
                    write!(f, "Network error: {}", message)
                }
            }
            Self::HttpError {
                platform,
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "HTTP error for '{}' (HTTP {}): {}", platform, code, message)
                } else {
                    write!(f, "HTTP error for '{}': {}", platform, message)
                }
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::ParseError { message } => write!(f, "Parse error: {}", message),
            Self::ConfigError { message } => write!(f, "Configuration error: {}", message),
            Self::FileError { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::EmptySelection {
                category,
                platforms,
            } => {
                write!(f, "No platforms found matching the specified criteria")?;
                if let Some(category) = category {
                    write!(f, " (category: {})", category)?;
                }
                if let Some(platforms) = platforms {
                    write!(f, " (platforms: {})", platforms.join(", "))?;
                }
                Ok(())
            }
            Self::Interrupted { completed, total } => {
                write!(f, "Check interrupted after {}/{} platforms", completed, total)
            }
            Self::Internal { message } => write!(f, "Internal error: {}", message),
        }
    }
}

impl std::error::Error for HandleCheckError {}

impl From<reqwest::Error> for HandleCheckError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            // reqwest does not expose the configured limit, the prober
            // replaces this with the real value when it has one.
            Self::timeout("HTTP request", Duration::ZERO)
        } else if err.is_connect() {
            Self::network_with_source("Connection failed", err.to_string())
        } else {
            Self::network_with_source("HTTP request failed", err.to_string())
        }
    }
}

impl From<serde_json::Error> for HandleCheckError {
    fn from(err: serde_json::Error) -> Self {
        Self::parse(format!("JSON parsing failed: {}", err))
    }
}

impl From<std::io::Error> for HandleCheckError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(format!("I/O error: {}", err))
    }
}

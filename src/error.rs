//! Error handling for the collector
//!
//! Provides structured error types with contextual information for:
//! - Network errors (connection failures, timeouts, DNS)
//! - Configuration errors (invalid settings, missing files)
//! - Probe errors (a fetcher failing against one instance)
//! - Store errors (lookups of unknown instance URLs)
//! - IO and reporting errors

use std::io;
use thiserror::Error;

/// Main result type used throughout the application
pub type Result<T> = std::result::Result<T, CollectorError>;

/// Error enum covering all application error scenarios
#[derive(Error, Debug, Clone)]
pub enum CollectorError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Network connectivity and protocol errors
    #[error("Network error: {message}")]
    Network { message: String },

    /// Lookup of an instance URL the store has never seen
    #[error("Unknown instance: {url}")]
    InstanceNotFound { url: String },

    /// A fetcher failed against one instance
    #[error("Probe error: {fetcher} on {target} - {message}")]
    Probe {
        fetcher: String,
        target: String,
        message: String,
    },

    /// Validation errors for user input
    #[error("Validation error: {field} - {message}")]
    Validation { field: String, message: String },

    /// Output and reporting errors
    #[error("Output error: {format} - {message}")]
    Output { format: String, message: String },

    /// File I/O errors
    #[error("IO error: {operation} - {message}")]
    Io { operation: String, message: String },

    /// Timeout errors with contextual information
    #[error("Timeout: {operation} after {duration_secs}s")]
    Timeout {
        operation: String,
        duration_secs: u64,
    },

    /// Generic internal errors with context
    #[error("Internal error: {context} - {message}")]
    Internal { context: String, message: String },
}

impl CollectorError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create an unknown-instance error
    pub fn instance_not_found<S: Into<String>>(url: S) -> Self {
        Self::InstanceNotFound { url: url.into() }
    }

    /// Create a probe error
    pub fn probe<F: Into<String>, T: Into<String>, M: Into<String>>(
        fetcher: F,
        target: T,
        message: M,
    ) -> Self {
        Self::Probe {
            fetcher: fetcher.into(),
            target: target.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an output error
    pub fn output<F: Into<String>, M: Into<String>>(format: F, message: M) -> Self {
        Self::Output {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Create an IO error
    pub fn io<O: Into<String>, M: Into<String>>(operation: O, message: M) -> Self {
        Self::Io {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout<O: Into<String>>(operation: O, duration_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration_secs,
        }
    }

    /// Create an internal error
    pub fn internal<C: Into<String>, M: Into<String>>(context: C, message: M) -> Self {
        Self::Internal {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Check if error is recoverable (can be retried by a caller)
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Timeout { .. })
    }

    /// Check if error is a configuration issue
    pub fn is_config_error(&self) -> bool {
        matches!(self, Self::Configuration { .. } | Self::Validation { .. })
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Internal { .. } => ErrorSeverity::Critical,
            Self::Configuration { .. } | Self::Validation { .. } => ErrorSeverity::High,
            Self::InstanceNotFound { .. } => ErrorSeverity::High,
            Self::Network { .. } | Self::Timeout { .. } | Self::Io { .. } => ErrorSeverity::Medium,
            Self::Probe { .. } | Self::Output { .. } => ErrorSeverity::Low,
        }
    }
}

/// Error severity levels for logging and monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "LOW"),
            Self::Medium => write!(f, "MEDIUM"),
            Self::High => write!(f, "HIGH"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}

// Implement conversions from common error types
impl From<io::Error> for CollectorError {
    fn from(error: io::Error) -> Self {
        Self::io("IO operation", error.to_string())
    }
}

impl From<serde_json::Error> for CollectorError {
    fn from(error: serde_json::Error) -> Self {
        Self::output("JSON", error.to_string())
    }
}

impl From<config::ConfigError> for CollectorError {
    fn from(error: config::ConfigError) -> Self {
        Self::config(error.to_string())
    }
}

impl From<reqwest::Error> for CollectorError {
    fn from(error: reqwest::Error) -> Self {
        Self::network(error.to_string())
    }
}

impl From<url::ParseError> for CollectorError {
    fn from(error: url::ParseError) -> Self {
        Self::validation("url", error.to_string())
    }
}

impl From<anyhow::Error> for CollectorError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal("anyhow", error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = CollectorError::network("Connection refused");
        assert!(matches!(error, CollectorError::Network { .. }));
        assert!(error.is_recoverable());
    }

    #[test]
    fn test_error_severity() {
        let config_error = CollectorError::config("Invalid setting");
        assert_eq!(config_error.severity(), ErrorSeverity::High);

        let probe_error = CollectorError::probe("version", "https://example.org/", "bad body");
        assert_eq!(probe_error.severity(), ErrorSeverity::Low);
        assert!(!probe_error.is_recoverable());
    }

    #[test]
    fn test_lookup_error_display() {
        let error = CollectorError::instance_not_found("https://missing.example/");
        assert_eq!(
            error.to_string(),
            "Unknown instance: https://missing.example/"
        );
    }
}

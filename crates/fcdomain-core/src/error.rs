//! Error types for the custom-domain reconciler
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for reconciler operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the custom-domain reconciler
#[derive(Error, Debug)]
pub enum Error {
    /// A certificate or private key path could not be read
    #[error("Certificate file error ({path}): {source}")]
    CertificateFile {
        /// The path that failed to resolve
        path: String,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// The platform rejected the domain for missing ICP compliance.
    /// Not retryable.
    #[error("ICP compliance required: {0}")]
    IcpComplianceRequired(String),

    /// Domain creation failed with an unexpected remote error.
    /// Not retried.
    #[error("Domain creation failed: {0}")]
    DomainCreationFailed(String),

    /// Temporary domain issuance failed
    #[error("Auto domain unavailable: {0}")]
    AutoDomainUnavailable(String),

    /// Domain deletion failed with an error other than "not found"
    #[error("Failed to delete domain {domain}: {message}")]
    DomainDeletionFailed {
        /// The domain name being deleted
        domain: String,
        /// The remote error message
        message: String,
    },

    /// Resource not found on the remote platform
    #[error("Not found: {0}")]
    NotFound(String),

    /// Remote API error with the original message preserved
    #[error("API error: {message}")]
    Api {
        /// Provider error code, when the platform supplied one
        code: Option<String>,
        /// Remote error message
        message: String,
    },

    /// HTTP client errors (transport-level)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an API error without a provider code
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api {
            code: None,
            message: msg.into(),
        }
    }

    /// Create an API error with a provider code
    pub fn api_with_code(code: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Api {
            code: Some(code.into()),
            message: msg.into(),
        }
    }

    /// The remote message carried by this error, when there is one
    pub fn remote_message(&self) -> &str {
        match self {
            Self::Api { message, .. } => message,
            Self::NotFound(msg)
            | Self::Http(msg)
            | Self::DomainCreationFailed(msg)
            | Self::IcpComplianceRequired(msg)
            | Self::AutoDomainUnavailable(msg)
            | Self::Other(msg) => msg,
            Self::DomainDeletionFailed { message, .. } => message,
            _ => "",
        }
    }

    /// The provider error code, when the platform supplied one
    pub fn remote_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_carries_code_when_present() {
        let err = Error::api_with_code("DomainNameNotFound", "no such domain");
        assert_eq!(err.to_string(), "API error: no such domain");
        assert_eq!(err.remote_code(), Some("DomainNameNotFound"));
    }

    #[test]
    fn api_error_without_code() {
        let err = Error::api("boom");
        assert_eq!(err.remote_code(), None);
    }

    #[test]
    fn remote_message_preserved() {
        let err = Error::DomainCreationFailed("the original message".to_string());
        assert_eq!(err.remote_message(), "the original message");
    }
}

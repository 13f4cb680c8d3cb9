//! Error types for the VIP helper
//!
//! This module defines all error types used throughout the crate.
//!
//! "Not found" conditions met while reconciling a floating IP (missing
//! interface, missing address) are *not* errors: they are reported through
//! [`crate::helper::AssignOutcome`] and [`crate::helper::AddressStatus`].
//! The variants here cover configuration problems and provider failures.

use thiserror::Error;

/// Result type alias for VIP helper operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the VIP helper
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (missing or malformed fields)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested object does not exist (configuration files, registry entries)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Authentication errors reported by the cloud provider
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Throttling reported by the cloud provider
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Any other cloud provider failure
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// The provider answered, but not in a shape we can act on
    #[error("Unexpected provider response: {0}")]
    UnexpectedResponse(String),

    /// I/O errors (reading configuration files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create an unexpected response error
    pub fn unexpected_response(msg: impl Into<String>) -> Self {
        Self::UnexpectedResponse(msg.into())
    }

    /// Whether this error came from the cloud provider API
    ///
    /// Authentication, throttling, transport and malformed-response failures
    /// all count. Configuration and local I/O problems do not.
    pub fn is_provider_error(&self) -> bool {
        matches!(
            self,
            Self::Authentication(_)
                | Self::RateLimited(_)
                | Self::Provider { .. }
                | Self::UnexpectedResponse(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_classification() {
        assert!(Error::auth("bad key").is_provider_error());
        assert!(Error::rate_limited("slow down").is_provider_error());
        assert!(Error::provider("ec2", "boom").is_provider_error());
        assert!(Error::unexpected_response("no body").is_provider_error());

        assert!(!Error::config("missing region").is_provider_error());
        assert!(!Error::not_found("file").is_provider_error());
    }

    #[test]
    fn test_provider_error_display() {
        let err = Error::provider("ec2", "RequestExpired");
        assert_eq!(err.to_string(), "Provider error (ec2): RequestExpired");
    }
}

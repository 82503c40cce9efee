//! # Courier Error Types
//!
//! Typed error handling for the courier pricing and checkout engine.
//! All fallible operations return `Result<T, CourierError>`.

use thiserror::Error;

/// Core error type for pricing and payment operations
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Malformed or missing request data (coordinates, labels, email)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Payment provider API error
    #[error("Provider error [{provider}]: {message}")]
    Provider { provider: String, message: String },

    /// Network/HTTP error communicating with the provider
    #[error("Network error: {0}")]
    Network(String),

    /// Webhook signature verification failed
    #[error("Webhook verification failed: {0}")]
    WebhookVerificationFailed(String),

    /// Webhook payload parsing error
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// Returns true if a resubmission of the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CourierError::Network(_) | CourierError::Provider { .. }
        )
    }

    /// Returns the HTTP status code appropriate for this error.
    ///
    /// Any failure reaching for the provider, transport included, surfaces
    /// as 500 to callers; invalid input is the caller's to fix and maps
    /// to 400.
    pub fn status_code(&self) -> u16 {
        match self {
            CourierError::Configuration(_) => 500,
            CourierError::InvalidInput(_) => 400,
            CourierError::Provider { .. } => 500,
            CourierError::Network(_) => 500,
            CourierError::WebhookVerificationFailed(_) => 401,
            CourierError::WebhookParse(_) => 400,
            CourierError::Serialization(_) => 500,
            CourierError::Internal(_) => 500,
        }
    }
}

/// Result type alias for courier operations
pub type CourierResult<T> = Result<T, CourierError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_errors() {
        assert!(CourierError::Network("timeout".into()).is_retryable());
        assert!(CourierError::Provider {
            provider: "stripe".into(),
            message: "rate limited".into()
        }
        .is_retryable());
        assert!(!CourierError::InvalidInput("bad coords".into()).is_retryable());
        assert!(!CourierError::Configuration("no key".into()).is_retryable());
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(CourierError::InvalidInput("x".into()).status_code(), 400);
        assert_eq!(CourierError::Configuration("x".into()).status_code(), 500);
        assert_eq!(
            CourierError::Provider {
                provider: "stripe".into(),
                message: "boom".into()
            }
            .status_code(),
            500
        );
        assert_eq!(
            CourierError::WebhookVerificationFailed("sig".into()).status_code(),
            401
        );
    }

    #[test]
    fn test_transport_failures_surface_as_500() {
        // Callers see one status for anything that went wrong reaching the
        // provider, whether the API answered with an error or the
        // connection itself failed.
        let err = CourierError::Network("error sending request".into());
        assert_eq!(err.status_code(), 500);
    }
}

//! # Client Error Types
//!
//! Errors raised by services, storage and the storefront.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Client Error Categories                            │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Transport     │  │    Storefront   │  │     Local                │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Http           │  │  Superseded     │  │  Storage                │ │
//! │  │  NotFound       │  │  NoActiveSession│  │  Config                 │ │
//! │  │  Rejected       │  │  BasketChanged  │  │  Serialization          │ │
//! │  │  Server         │  │  Core           │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bistro_core::{CoreError, SessionToken};
use thiserror::Error;

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Client error type.
#[derive(Debug, Error)]
pub enum ClientError {
    // =========================================================================
    // Transport Errors
    // =========================================================================
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// 404 from the API.
    #[error("Not found: {0}")]
    NotFound(String),

    /// 400/422 from the API, e.g. an unknown or expired coupon.
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Any other non-success status.
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// The response body did not have the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    // =========================================================================
    // Storefront Errors
    // =========================================================================
    /// A newer item was opened while this one was loading.
    #[error("Configuration session {token} was superseded")]
    SessionSuperseded { token: SessionToken },

    /// No item is currently being configured.
    #[error("No item is being configured")]
    NoActiveSession,

    /// The basket changed while a coupon was being validated.
    #[error("Basket changed during coupon validation")]
    BasketChanged,

    /// Business rule violation from bistro-core.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Local Errors
    // =========================================================================
    /// Reading or writing the persisted basket failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Configuration could not be loaded, saved or validated.
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ClientError {
    /// True for errors the customer can fix by changing their input.
    pub fn is_user_error(&self) -> bool {
        matches!(self, ClientError::Rejected(_) | ClientError::Core(_))
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<bistro_core::ValidationError> for ClientError {
    fn from(err: bistro_core::ValidationError) -> Self {
        ClientError::Core(CoreError::Validation(err))
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

impl From<toml::de::Error> for ClientError {
    fn from(err: toml::de::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ClientError {
    fn from(err: toml::ser::Error) -> Self {
        ClientError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ClientError::SessionSuperseded {
            token: SessionToken::new(3),
        };
        assert_eq!(err.to_string(), "Configuration session #3 was superseded");

        let err = ClientError::Server {
            status: 503,
            message: "maintenance".to_string(),
        };
        assert_eq!(err.to_string(), "Server error 503: maintenance");
    }

    #[test]
    fn test_core_errors_are_transparent() {
        let err = ClientError::from(CoreError::EmptyBasket);
        assert_eq!(err.to_string(), CoreError::EmptyBasket.to_string());
        assert!(err.is_user_error());
        assert!(!ClientError::NoActiveSession.is_user_error());
    }
}

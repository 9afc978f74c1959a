//! Client error types

use bazaar_core::cart::CartError;
use bazaar_core::catalog::FilterError;
use reqwest::StatusCode;
use thiserror::Error;

/// Client error type
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed before a response arrived
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Base URL or path could not be joined
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Authentication required or token rejected
    #[error("Authentication required")]
    Unauthorized,

    /// Resource not found (stale or deleted product id)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Server rejected the request as invalid
    #[error("Validation error: {0}")]
    Validation(String),

    /// Server answered with a 5xx status
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// Unexpected non-success status
    #[error("Unexpected status ({status}): {message}")]
    Status { status: u16, message: String },

    /// Filter parameters did not validate locally
    #[error("Invalid filter: {0}")]
    Filter(#[from] FilterError),

    /// Cart change rejected locally
    #[error("Invalid cart change: {0}")]
    Cart(#[from] CartError),

    /// Local storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Missing or malformed configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Map a non-success HTTP status and its body to an error.
    #[must_use]
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status {
            StatusCode::UNAUTHORIZED => Self::Unauthorized,
            StatusCode::NOT_FOUND => Self::NotFound(message),
            StatusCode::BAD_REQUEST => Self::Validation(message),
            s if s.is_server_error() => Self::Server {
                status: s.as_u16(),
                message,
            },
            s => Self::Status {
                status: s.as_u16(),
                message,
            },
        }
    }

    /// Whether retrying the same request may succeed.
    ///
    /// Transport failures (connect, timeout) and 5xx responses are
    /// transient; anything the server answered with a 4xx is not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            Self::Server { .. } => true,
            _ => false,
        }
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status() {
        assert!(matches!(
            ClientError::from_status(StatusCode::UNAUTHORIZED, String::new()),
            ClientError::Unauthorized
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::NOT_FOUND, "gone".to_string()),
            ClientError::NotFound(m) if m == "gone"
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::BAD_REQUEST, String::new()),
            ClientError::Validation(_)
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::CONFLICT, String::new()),
            ClientError::Status { status: 409, .. }
        ));
    }

    #[test]
    fn test_transient_errors() {
        let server = ClientError::from_status(StatusCode::BAD_GATEWAY, String::new());
        assert!(server.is_transient());
        assert!(!ClientError::from_status(StatusCode::BAD_REQUEST, String::new()).is_transient());
        assert!(!ClientError::NotFound("p1".to_string()).is_transient());
    }
}

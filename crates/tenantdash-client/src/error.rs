//! Client error types

use tenantdash_schema::SchemaError;

use crate::transport::HttpMethod;

/// Transport and HTTP status failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// Server answered with a non-success status
    #[error("{method} {endpoint} returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Request method
        method: HttpMethod,
        /// Endpoint relative to the API root
        endpoint: String,
        /// Response body text
        body: String,
    },

    /// Connection, timeout or protocol failure
    #[error("transport failure: {0}")]
    Transport(String),

    /// Success status with a body that is not JSON
    #[error("response from {endpoint} is not valid JSON: {message}")]
    InvalidBody {
        /// Endpoint relative to the API root
        endpoint: String,
        /// Parser message
        message: String,
    },

    /// A JSON body was required but none came back
    #[error("empty response from {0}")]
    EmptyBody(String),

    /// Client could not be constructed
    #[error("client configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// HTTP status, if the server answered
    #[inline]
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if another attempt may succeed
    ///
    /// Connection failures and server errors (>= 500) are transient; client
    /// errors are not.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::InvalidBody { .. } | Self::EmptyBody(_) | Self::Config(_) => false,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Entity operation failures
#[derive(Debug, thiserror::Error)]
pub enum EntityError {
    /// Underlying request failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Payload did not match the entity schema
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Operation needs a server-assigned id
    #[error("{entity} has no id; cannot {operation}")]
    Unsaved {
        /// Entity type name
        entity: &'static str,
        /// Operation attempted
        operation: &'static str,
    },

    /// Entity does not offer the operation
    #[error("{entity} does not support {operation}")]
    Unsupported {
        /// Entity type name
        entity: &'static str,
        /// Operation attempted
        operation: &'static str,
    },

    /// Resource name not recognised
    #[error("unknown resource '{0}'")]
    UnknownResource(String),
}

impl EntityError {
    /// HTTP status, if the failure came from a server answer
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api(e) => e.status(),
            _ => None,
        }
    }

    /// Check if the server reported the resource missing
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Result type for entity operations
pub type EntityResult<T> = Result<T, EntityError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16) -> ApiError {
        ApiError::Status {
            status: code,
            method: HttpMethod::Get,
            endpoint: "queries/1".into(),
            body: String::new(),
        }
    }

    #[test]
    fn retry_classification() {
        assert!(status(500).is_retryable());
        assert!(status(503).is_retryable());
        assert!(!status(400).is_retryable());
        assert!(!status(404).is_retryable());
        assert!(ApiError::Transport("reset".into()).is_retryable());
        assert!(!ApiError::EmptyBody("x".into()).is_retryable());
    }

    #[test]
    fn not_found_detection() {
        assert!(EntityError::from(status(404)).is_not_found());
        assert!(!EntityError::from(status(400)).is_not_found());
        assert_eq!(
            EntityError::Unsupported {
                entity: "Widget",
                operation: "get"
            }
            .status(),
            None
        );
    }

    #[test]
    fn status_display() {
        assert_eq!(status(503).to_string(), "GET queries/1 returned 503: ");
    }
}

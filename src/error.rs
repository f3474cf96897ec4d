//! Error types for the Sandwich provisioning plugin.
//!
//! This module provides the error hierarchy for all operations in the
//! resource lifecycle: configuration, remote API calls, state polling,
//! and identifier handling.
//!
//! Errors are classified explicitly (`NotFound`, `Conflict`, transient)
//! instead of being inspected by downcasting, so callers can branch on
//! absence and already-converged signals without string matching.

use thiserror::Error;

/// The main error type for the Sandwich provisioning plugin.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Provider configuration errors.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Sandwich API errors.
    #[error("Sandwich API error: {0}")]
    Api(#[from] ApiError),

    /// State polling errors.
    #[error("State wait error: {0}")]
    Wait(#[from] WaitError),

    /// Composite identifier errors.
    #[error("Identifier error: {0}")]
    Identifier(#[from] IdentifierError),

    /// The resource kind does not support the requested lifecycle hook.
    #[error("Operation '{operation}' is not supported for {kind}")]
    UnsupportedOperation {
        /// Resource kind name.
        kind: &'static str,
        /// The unsupported hook.
        operation: &'static str,
    },

    /// The lifecycle hook was invoked on a record without a handle.
    #[error("{kind} record has no handle; the resource was never created or is already gone")]
    MissingHandle {
        /// Resource kind name.
        kind: &'static str,
    },

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Provider configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required configuration value is missing.
    #[error("Missing configuration value: {name}")]
    MissingValue {
        /// Name of the missing value.
        name: String,
    },

    /// A required project name was neither set on the record nor configured
    /// as the provider default.
    #[error("{field}: required field is not set")]
    MissingProjectName {
        /// The record field that was consulted.
        field: &'static str,
    },

    /// The configured default project does not exist on the control plane.
    #[error("Configured project '{name}' does not exist")]
    UnknownProject {
        /// The configured project name.
        name: String,
    },
}

/// Errors returned by the Sandwich control-plane API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The resource does not exist.
    ///
    /// Absence is sometimes success (deletion polls, delete-tolerant flows)
    /// and sometimes failure; the driver layer decides based on operation
    /// intent.
    #[error("{kind} '{id}' not found")]
    NotFound {
        /// Resource kind name.
        kind: &'static str,
        /// Identifier that was requested.
        id: String,
    },

    /// The request conflicts with the resource's current state, e.g. a
    /// detach of a volume that is already detached.
    #[error("Conflicting request: {message}")]
    Conflict {
        /// Error message from the API.
        message: String,
    },

    /// Authentication failed.
    #[error("Sandwich authentication failed: {message}")]
    AuthenticationFailed {
        /// Description of the auth failure.
        message: String,
    },

    /// Rate limited by the API server.
    #[error("Sandwich API rate limited, retry after {retry_after_secs} seconds")]
    RateLimited {
        /// Seconds to wait before retrying.
        retry_after_secs: u64,
    },

    /// The API rejected the request for any other reason.
    #[error("Sandwich API request failed: {status} - {message}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Error message from the API.
        message: String,
    },

    /// Network-level failure talking to the API server.
    #[error("Network error communicating with the Sandwich API: {message}")]
    Network {
        /// Description of the network error.
        message: String,
    },

    /// The API returned a body that could not be decoded.
    #[error("Invalid response from the Sandwich API: {message}")]
    InvalidResponse {
        /// Description of the response issue.
        message: String,
    },
}

/// Errors raised by the state waiter.
#[derive(Debug, Error)]
pub enum WaitError {
    /// The polling deadline elapsed before the resource reached a target
    /// state.
    #[error("Timeout waiting for {kind} '{handle}' (last state: '{last_state}')")]
    Timeout {
        /// Resource kind name.
        kind: &'static str,
        /// Handle of the polled resource.
        handle: String,
        /// Last state label observed before the deadline.
        last_state: String,
    },

    /// The resource reported a state label outside the declared pending and
    /// target sets. Waiting further would never converge, so this is fatal.
    #[error("Unexpected state '{state}' for {kind} '{handle}'")]
    UnexpectedState {
        /// Resource kind name.
        kind: &'static str,
        /// Handle of the polled resource.
        handle: String,
        /// The offending state label.
        state: String,
    },
}

/// Composite identifier errors.
#[derive(Debug, Error)]
pub enum IdentifierError {
    /// The identifier string does not have the expected shape.
    #[error("Malformed identifier '{value}', expected {expected}")]
    Malformed {
        /// The offending identifier string.
        value: String,
        /// Human description of the expected shape.
        expected: &'static str,
    },
}

/// Result type alias for provisioning operations.
pub type Result<T> = std::result::Result<T, ProvisionError>;

impl ProvisionError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Returns true if this error is an absence signal from the API.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Api(ApiError::NotFound { .. }))
    }

    /// Returns true if this error is a conflict signal from the API.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Api(ApiError::Conflict { .. }))
    }

    /// Returns true if the failed request may be retried by the client
    /// layer. Only transport-level transience qualifies; every other
    /// classification is surfaced immediately.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Api(ApiError::RateLimited { .. } | ApiError::Network { .. })
        )
    }

    /// Returns the suggested retry delay in seconds, if applicable.
    #[must_use]
    pub const fn retry_delay_secs(&self) -> Option<u64> {
        match self {
            Self::Api(ApiError::RateLimited { retry_after_secs }) => Some(*retry_after_secs),
            Self::Api(ApiError::Network { .. }) => Some(5),
            _ => None,
        }
    }
}

impl ApiError {
    /// Creates a not-found error for the given kind and identifier.
    #[must_use]
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Creates a request-failed error.
    #[must_use]
    pub fn request_failed(status: u16, message: impl Into<String>) -> Self {
        Self::RequestFailed {
            status,
            message: message.into(),
        }
    }

    /// Creates a network error.
    #[must_use]
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Creates an invalid-response error.
    #[must_use]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_classification() {
        let err = ProvisionError::from(ApiError::not_found("volume", "abc"));
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_conflict_classification() {
        let err = ProvisionError::from(ApiError::Conflict {
            message: String::from("already detached"),
        });
        assert!(err.is_conflict());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_retryable_classification() {
        let rate_limited = ProvisionError::from(ApiError::RateLimited {
            retry_after_secs: 30,
        });
        assert!(rate_limited.is_retryable());
        assert_eq!(rate_limited.retry_delay_secs(), Some(30));

        let fatal = ProvisionError::from(ApiError::request_failed(500, "boom"));
        assert!(!fatal.is_retryable());
        assert_eq!(fatal.retry_delay_secs(), None);
    }
}

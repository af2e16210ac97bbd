// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2026 EvalHub Contributors

//! Error types for the EvalHub model-management core
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Main error type for EvalHub operations
#[derive(Error, Debug)]
pub enum EvalError {
    /// Malformed or missing input (bad model ID, empty capability set, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Unknown model ID or template name
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation blocked by an invariant (e.g. deleting the default model)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Concurrent mutation lost the race after bounded retries
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Failure from the provider invocation boundary
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Provider-level error types, wrapped per-probe / per-entry by the
/// Tester and Comparator rather than aborting the whole operation.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Authentication failed (invalid API key)
    #[error("Authentication failed: invalid API key")]
    AuthenticationFailed,

    /// Rate limited by the provider
    #[error("Rate limited: retry after {0} seconds")]
    RateLimited(u32),

    /// Timeout waiting for response
    #[error("Request timed out")]
    Timeout,

    /// Network connectivity error
    #[error("Network error: {0}")]
    Network(String),

    /// Invalid response from the provider
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    /// Provider returned an error
    #[error("Provider error ({status}): {message}")]
    ServerError { status: u16, message: String },
}

/// Result type alias for EvalHub operations
pub type Result<T> = std::result::Result<T, EvalError>;

impl EvalError {
    /// Model-not-found helper, used by every component that resolves IDs.
    pub fn model_not_found(model_id: &str) -> Self {
        EvalError::NotFound(format!("model '{}' is not registered", model_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = EvalError::Validation("capabilities must not be empty".to_string());
        assert!(err.to_string().contains("Validation error"));
        assert!(err.to_string().contains("capabilities"));
    }

    #[test]
    fn test_not_found_error_display() {
        let err = EvalError::model_not_found("gpt-9");
        assert!(err.to_string().contains("Not found"));
        assert!(err.to_string().contains("gpt-9"));
    }

    #[test]
    fn test_forbidden_error_display() {
        let err = EvalError::Forbidden("cannot delete default model".to_string());
        assert!(err.to_string().contains("Forbidden"));
        assert!(err.to_string().contains("default model"));
    }

    #[test]
    fn test_conflict_error_display() {
        let err = EvalError::Conflict("registry mutation retries exhausted".to_string());
        assert!(err.to_string().contains("Conflict"));
    }

    #[test]
    fn test_provider_error_rate_limited() {
        let err = ProviderError::RateLimited(30);
        assert!(err.to_string().contains("Rate limited"));
        assert!(err.to_string().contains("30"));
    }

    #[test]
    fn test_provider_error_timeout() {
        let err = ProviderError::Timeout;
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_provider_error_server_error() {
        let err = ProviderError::ServerError {
            status: 503,
            message: "overloaded".to_string(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("overloaded"));
    }

    #[test]
    fn test_eval_error_from_provider_error() {
        let err: EvalError = ProviderError::AuthenticationFailed.into();
        assert!(err.to_string().contains("Provider error"));
    }

    #[test]
    fn test_eval_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: EvalError = io_err.into();
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_result_type_alias() {
        fn ok_fn() -> Result<i32> {
            Ok(7)
        }
        assert_eq!(ok_fn().unwrap(), 7);
    }
}

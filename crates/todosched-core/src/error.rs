//! Core error types for todosched-core.
//!
//! A small hierarchy built with thiserror: `ApiError` for anything that goes
//! wrong talking to the task service, `ConfigError` for the TOML config file,
//! `ValidationError` for bad input, all folded into `CoreError`.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for todosched-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Task service errors
    #[error("Todoist error: {0}")]
    Api(#[from] ApiError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Emptying the target project failed part-way; nothing was imported.
    #[error("Failed to prepare project '{project}' for replace_project mode: {source}")]
    ReplaceAborted {
        project: String,
        #[source]
        source: ApiError,
    },
}

/// Errors returned by a [`TaskApi`](crate::integrations::TaskApi) implementation.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The service answered with a non-success status.
    #[error("HTTP {status} from {endpoint}: {body}")]
    Status {
        status: u16,
        endpoint: String,
        body: String,
    },

    /// Connection, TLS or timeout failure.
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// The response body did not have the expected shape.
    #[error("unexpected response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },

    /// No API token configured.
    #[error("Todoist API token is not configured (set todoist.api_token or TODOIST_API_TOKEN)")]
    MissingToken,

    /// Entity lookup by id failed.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },
}

impl ApiError {
    /// HTTP status, when the failure came from a response.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::NotFound { .. } => Some(404),
            _ => None,
        }
    }
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseFailed(String),
}

/// Validation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Required field absent or blank
    #[error("Missing required field '{0}'")]
    MissingField(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// Invalid range between two fields
    #[error("Invalid range: {start_field} ({start}) must be before {end_field} ({end})")]
    InvalidRange {
        start_field: String,
        start: String,
        end_field: String,
        end: String,
    },

    /// An import item could not be decoded at all
    #[error("Malformed item: {0}")]
    Malformed(String),
}

impl ValidationError {
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        ValidationError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_message_wraps_with_service_prefix() {
        let err: CoreError = ApiError::Status {
            status: 403,
            endpoint: "/projects".into(),
            body: "Forbidden".into(),
        }
        .into();
        assert_eq!(err.to_string(), "Todoist error: HTTP 403 from /projects: Forbidden");
    }

    #[test]
    fn status_is_exposed_for_response_failures_only() {
        let status = ApiError::Status {
            status: 429,
            endpoint: "/tasks".into(),
            body: String::new(),
        };
        assert_eq!(status.status(), Some(429));
        assert_eq!(ApiError::MissingToken.status(), None);
    }

    #[test]
    fn replace_abort_names_the_project() {
        let err = CoreError::ReplaceAborted {
            project: "Timetable".into(),
            source: ApiError::MissingToken,
        };
        let msg = err.to_string();
        assert!(msg.starts_with("Failed to prepare project 'Timetable'"), "{msg}");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn invalid_range_names_both_fields() {
        let err = ValidationError::InvalidRange {
            start_field: "start_datetime".into(),
            start: "10:00".into(),
            end_field: "end_datetime".into(),
            end: "09:00".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("start_datetime"));
        assert!(msg.contains("end_datetime"));
    }
}

//! # Client Error Types
//!
//! Error types for remote operations, configuration and settings.
//!
//! ## Retry Classification
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    RequestError → ErrorKind                             │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │   Transient     │  │     Client      │  │      Cancelled          │ │
//! │  │   (retried)     │  │  (surfaced now) │  │  (never surfaced)       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Network        │  │  HTTP 4xx       │  │  cancel()               │ │
//! │  │  HTTP 5xx       │  │  (except 408,   │  │  superseded by a newer  │ │
//! │  │  HTTP 408, 429  │  │   429)          │  │  execute()              │ │
//! │  │                 │  │  Decode         │  │                         │ │
//! │  └────────┬────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │           │ attempts used up                                            │
//! │           ▼                                                             │
//! │  ┌─────────────────┐                                                   │
//! │  │   Exhausted     │  wraps the last transient cause                   │
//! │  └─────────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use torque_core::ValidationError;
use ts_rs::TS;

/// Result type alias for remote operations.
pub type RequestResult<T> = Result<T, RequestError>;

/// Result type alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

// =============================================================================
// Request Error
// =============================================================================

/// Failure of a single remote operation, or of a whole retried call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    /// Server answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http {
        status: u16,
        message: String,
        /// Application error code from the response body, if any.
        code: Option<String>,
    },

    /// No response: connection refused, DNS failure, timeout.
    #[error("Network error: {0}")]
    Network(String),

    /// Response payload did not have the expected shape.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// Aborted by `cancel()`, a newer `execute()`, or disposal.
    #[error("Request was cancelled")]
    Cancelled,

    /// A call configured with retries failed every attempt with a
    /// transient error. Single-attempt calls surface the error itself.
    #[error("Gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: u32,
        last: Box<RequestError>,
    },
}

/// Retry classification of a [`RequestError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transient,
    Client,
    Cancelled,
    Exhausted,
}

impl RequestError {
    /// Shorthand for an HTTP failure without an application code.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        RequestError::Http {
            status,
            message: message.into(),
            code: None,
        }
    }

    /// Classifies the error for retry decisions.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RequestError::Network(_) => ErrorKind::Transient,
            RequestError::Http { status, .. } => match status {
                408 | 429 => ErrorKind::Transient,
                400..=499 => ErrorKind::Client,
                _ => ErrorKind::Transient,
            },
            RequestError::Decode(_) => ErrorKind::Client,
            RequestError::Cancelled => ErrorKind::Cancelled,
            RequestError::Exhausted { .. } => ErrorKind::Exhausted,
        }
    }

    /// Returns true if another attempt might succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, RequestError::Cancelled)
    }

    /// HTTP status of this error or of the last cause behind it.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            RequestError::Http { status, .. } => Some(*status),
            RequestError::Exhausted { last, .. } => last.status_code(),
            _ => None,
        }
    }

    /// Stable machine-readable code shown alongside the message.
    pub fn code(&self) -> String {
        match self {
            RequestError::Http {
                code: Some(code), ..
            } => code.clone(),
            RequestError::Http { status, .. } => format!("HTTP_{}", status),
            RequestError::Network(_) => "NETWORK_ERROR".to_string(),
            RequestError::Decode(_) => "DECODE_ERROR".to_string(),
            RequestError::Cancelled => "ABORTED".to_string(),
            RequestError::Exhausted { .. } => "RETRIES_EXHAUSTED".to_string(),
        }
    }
}

impl From<serde_json::Error> for RequestError {
    fn from(err: serde_json::Error) -> Self {
        RequestError::Decode(err.to_string())
    }
}

// =============================================================================
// Error Info
// =============================================================================

/// What the frontend sees in `RequestState.error` and `on_error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub message: String,
    pub code: String,
    pub status_code: Option<u16>,
    pub kind: ErrorKind,
    #[ts(as = "String")]
    pub timestamp: DateTime<Utc>,
}

impl From<&RequestError> for ErrorInfo {
    fn from(err: &RequestError) -> Self {
        let message = match err {
            RequestError::Http { message, .. } if !message.is_empty() => message.clone(),
            RequestError::Network(_) => {
                "Unable to connect to server. Please check your connection.".to_string()
            }
            other => other.to_string(),
        };

        ErrorInfo {
            message,
            code: err.code(),
            status_code: err.status_code(),
            kind: err.kind(),
            timestamp: Utc::now(),
        }
    }
}

// =============================================================================
// Config Error
// =============================================================================

/// Client configuration failures.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid client configuration: {0}")]
    Invalid(String),

    #[error("Failed to load config: {0}")]
    LoadFailed(String),

    #[error("Failed to save config: {0}")]
    SaveFailed(String),

    #[error("Invalid pricing configuration: {0}")]
    Pricing(#[from] ValidationError),
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::LoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ConfigError {
    fn from(err: toml::ser::Error) -> Self {
        ConfigError::SaveFailed(err.to_string())
    }
}

// =============================================================================
// Settings Error
// =============================================================================

/// Failure of a shop settings update.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Rejected locally; nothing was sent.
    #[error("Invalid settings: {0}")]
    Validation(#[from] ValidationError),

    /// The server rejected or never received the update.
    #[error("Settings request failed: {0}")]
    Request(#[from] RequestError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        assert_eq!(RequestError::Network("refused".into()).kind(), ErrorKind::Transient);
        assert_eq!(RequestError::http(503, "down").kind(), ErrorKind::Transient);
        assert_eq!(RequestError::http(500, "boom").kind(), ErrorKind::Transient);
        assert_eq!(RequestError::http(429, "slow down").kind(), ErrorKind::Transient);
        assert_eq!(RequestError::http(408, "timeout").kind(), ErrorKind::Transient);

        assert_eq!(RequestError::http(401, "unauthorized").kind(), ErrorKind::Client);
        assert_eq!(RequestError::http(404, "missing").kind(), ErrorKind::Client);
        assert_eq!(RequestError::Decode("bad".into()).kind(), ErrorKind::Client);

        assert_eq!(RequestError::Cancelled.kind(), ErrorKind::Cancelled);
        assert!(!RequestError::Cancelled.is_retryable());
    }

    #[test]
    fn test_exhausted_keeps_last_cause() {
        let err = RequestError::Exhausted {
            attempts: 3,
            last: Box::new(RequestError::http(502, "bad gateway")),
        };
        assert_eq!(err.kind(), ErrorKind::Exhausted);
        assert_eq!(err.status_code(), Some(502));
        assert_eq!(err.code(), "RETRIES_EXHAUSTED");
        assert_eq!(err.to_string(), "Gave up after 3 attempts: HTTP 502: bad gateway");
    }

    #[test]
    fn test_error_info_from_request_error() {
        let info = ErrorInfo::from(&RequestError::Http {
            status: 422,
            message: "VIN is invalid".into(),
            code: Some("VIN_INVALID".into()),
        });
        assert_eq!(info.message, "VIN is invalid");
        assert_eq!(info.code, "VIN_INVALID");
        assert_eq!(info.status_code, Some(422));
        assert_eq!(info.kind, ErrorKind::Client);

        let info = ErrorInfo::from(&RequestError::Network("connection refused".into()));
        assert_eq!(info.code, "NETWORK_ERROR");
        assert_eq!(info.status_code, None);
        assert!(info.message.contains("Unable to connect"));

        let info = ErrorInfo::from(&RequestError::http(500, ""));
        assert_eq!(info.code, "HTTP_500");
        assert_eq!(info.message, "HTTP 500: ");
    }
}

//! Cloud error types

use std::fmt;
use thiserror::Error;

/// Classification of a failed API call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    NotFound,
    Unauthorized,
    RateLimited,
    /// Any other 4xx
    Client,
    /// 5xx
    Server,
    /// Connection or protocol failure, no response
    Transport,
    /// The call's deadline passed
    Timeout,
    /// Response body could not be decoded
    Decode,
}

impl ApiErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            404 => Self::NotFound,
            401 | 403 => Self::Unauthorized,
            429 => Self::RateLimited,
            500..=599 => Self::Server,
            _ => Self::Client,
        }
    }
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not found",
            Self::Unauthorized => "unauthorized",
            Self::RateLimited => "rate limited",
            Self::Client => "client error",
            Self::Server => "server error",
            Self::Transport => "transport error",
            Self::Timeout => "timeout",
            Self::Decode => "decode error",
        };
        f.write_str(s)
    }
}

/// Error returned by a [`crate::CloudApi`] call
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}{}: {message}", .status.map(|s| format!(" ({})", s)).unwrap_or_default())]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::from_status(status), Some(status), message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::from_status(404, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == ApiErrorKind::NotFound
    }
}

/// Cloud orchestration errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Timed out after {seconds}s waiting for {what}. Remove {resource} manually if it was left behind")]
    Timeout {
        what: String,
        resource: String,
        seconds: u64,
    },

    #[error("{resource} entered the unexpected state \"{state}\". Remove {resource} manually before retrying")]
    UnexpectedState { resource: String, state: String },

    #[error("Remote command failed: {0}")]
    CommandFailed(String),

    #[error("Unable to connect to {host} after {attempts} attempts: {message}")]
    ConnectFailed {
        host: String,
        attempts: u32,
        message: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CloudError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CloudError::Api(e) if e.is_not_found())
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;

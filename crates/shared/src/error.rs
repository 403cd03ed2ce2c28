use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Validation,
    NotFound,
    CameraUnavailable,
    Internal,
}

impl ErrorCode {
    /// Best-effort mapping from an HTTP status to the backend's error
    /// vocabulary, for responses whose body carried no usable envelope.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => Self::Validation,
            404 => Self::NotFound,
            503 => Self::CameraUnavailable,
            _ => Self::Internal,
        }
    }
}

/// An application-level failure reported by the backend. The message is
/// the server's own wording and is surfaced to the user verbatim.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

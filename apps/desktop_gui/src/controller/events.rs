//! UI/backend events and error modeling for the control panel.

use client_core::{ClientError, RegistrationImage};
use shared::domain::{FaceId, FaceRecord};

/// Completions flowing from the backend worker to the UI. Each variant
/// corresponds to exactly one command finishing, so the reducer can tie
/// every state change to the response that caused it.
pub enum UiEvent {
    CameraStarted { message: String },
    CameraStopped { message: String },
    RecognitionToggled { enabled: bool, message: String },
    FrameCaptured { jpeg: Vec<u8> },
    UploadLoaded { image: RegistrationImage },
    FaceRegistered { message: String },
    FacesLoaded { faces: Vec<FaceRecord> },
    FaceDeleted { message: String },
    DatabaseReset { message: String },
    VideoFrame { jpeg: Vec<u8> },
    FeedEnded,
    FacePreviewLoaded { id: FaceId, jpeg: Vec<u8> },
    FacePreviewFailed { id: FaceId, reason: String },
    Info(String),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    /// Blocked client-side before any request was sent.
    Validation,
    /// Network failure or an unreadable non-2xx response.
    Transport,
    /// The server answered with a failure payload; its message is shown
    /// verbatim.
    Api,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    StartCamera,
    StopCamera,
    ToggleRecognition,
    Capture,
    Register,
    UploadRead,
    LoadFaces,
    Delete,
    Reset,
    Feed,
    General,
}

impl UiErrorContext {
    pub fn label(self) -> &'static str {
        match self {
            Self::BackendStartup => "Backend startup",
            Self::StartCamera => "Start camera",
            Self::StopCamera => "Stop camera",
            Self::ToggleRecognition => "Recognition toggle",
            Self::Capture => "Capture",
            Self::Register => "Registration",
            Self::UploadRead => "Upload",
            Self::LoadFaces => "Face list",
            Self::Delete => "Delete",
            Self::Reset => "Reset",
            Self::Feed => "Live feed",
            Self::General => "Operation",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    /// Typed classification straight from the client error: transport
    /// failures get generic wording, application failures keep the
    /// server's message untouched.
    pub fn from_client(context: UiErrorContext, err: &ClientError) -> Self {
        let (category, message) = match err {
            ClientError::Api(api) => (UiErrorCategory::Api, api.message.clone()),
            ClientError::InvalidBaseUrl { .. } => (UiErrorCategory::Validation, err.to_string()),
            other if other.is_transport() => (
                UiErrorCategory::Transport,
                "Server unreachable or sent an unreadable response; check the URL/network and retry."
                    .to_string(),
            ),
            other => (UiErrorCategory::Unknown, other.to_string()),
        };
        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        Self {
            category: UiErrorCategory::Unknown,
            context,
            message: message.into(),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

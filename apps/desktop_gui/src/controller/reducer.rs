//! Reducer for the control panel: session flags, the pending
//! registration buffer, and the pure render function the egui shell
//! draws from. Everything here runs without a live UI, which is where
//! the state-machine tests live.

use std::path::PathBuf;

use client_core::RegistrationImage;
use shared::domain::{FaceId, FaceRecord, ImageSource};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiErrorContext, UiEvent};

/// Camera/recognition flags. Flipped only by successful responses,
/// never by a pending or failed request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    pub camera_active: bool,
    pub recognition_active: bool,
}

/// One flag per operation so the triggering control stays disabled while
/// its request is pending. The worker runs commands sequentially, these
/// flags only prevent duplicate submissions from the UI side.
#[derive(Debug, Clone, Copy, Default)]
pub struct InFlight {
    pub camera: bool,
    pub recognition: bool,
    pub capture: bool,
    pub upload_read: bool,
    pub register: bool,
    pub list: bool,
    pub delete: bool,
    pub reset: bool,
}

impl InFlight {
    fn registration_busy(&self) -> bool {
        self.capture || self.upload_read || self.register
    }

    fn any(&self) -> bool {
        self.camera
            || self.recognition
            || self.registration_busy()
            || self.list
            || self.delete
            || self.reset
    }
}

/// Image bytes plus name held between capture/file-select and
/// confirm-register. Discarded on success or explicit cancel; a failed
/// registration keeps it for retry.
#[derive(Debug, Clone)]
pub struct PendingRegistration {
    pub name: String,
    pub image: RegistrationImage,
    pub source: ImageSource,
}

/// Destructive actions awaiting the user's explicit confirmation. No
/// request exists until the confirm intent arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    DeleteFace { id: FaceId, name: String },
    ResetDatabase,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub severity: Severity,
    pub text: String,
}

impl StatusLine {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            text: text.into(),
        }
    }
}

impl Default for StatusLine {
    fn default() -> Self {
        Self::info("Ready")
    }
}

/// User intentions coming out of the egui layer. The shell never talks
/// to the backend directly; it hands intents here and dispatches
/// whatever command comes back.
pub enum Intent {
    ToggleCamera,
    ToggleRecognition,
    NameChanged(String),
    Capture,
    UploadPicked(PathBuf),
    PendingNameChanged(String),
    ConfirmRegister,
    DiscardPending,
    RequestDelete { id: FaceId, name: String },
    RequestReset,
    ConfirmDestructive,
    CancelDestructive,
    RefreshFaces,
}

#[derive(Default)]
pub struct Controller {
    pub session: SessionState,
    pub name_input: String,
    /// Direct projection of the last successful list response. Never
    /// merged or edited locally.
    pub faces: Vec<FaceRecord>,
    pub pending: Option<PendingRegistration>,
    pub confirmation: Option<Confirmation>,
    pub in_flight: InFlight,
    pub status: StatusLine,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    fn reject(&mut self, context: UiErrorContext, message: &str) {
        self.status = StatusLine::error(format!("{}: {message}", context.label()));
    }

    /// Validates an intent against the current state and, when the
    /// preconditions hold, marks the operation in flight and returns the
    /// command to queue. Validation failures produce a status message
    /// and no command at all.
    pub fn handle(&mut self, intent: Intent) -> Option<BackendCommand> {
        match intent {
            Intent::NameChanged(name) => {
                self.name_input = name;
                None
            }
            Intent::ToggleCamera => {
                if self.in_flight.camera {
                    return None;
                }
                self.in_flight.camera = true;
                if self.session.camera_active {
                    Some(BackendCommand::StopCamera)
                } else {
                    Some(BackendCommand::StartCamera)
                }
            }
            Intent::ToggleRecognition => {
                if self.in_flight.recognition {
                    return None;
                }
                if !self.session.camera_active {
                    self.reject(
                        UiErrorContext::ToggleRecognition,
                        "start the camera before toggling recognition",
                    );
                    return None;
                }
                self.in_flight.recognition = true;
                Some(BackendCommand::ToggleRecognition)
            }
            Intent::Capture => {
                if self.in_flight.registration_busy() {
                    return None;
                }
                if !self.session.camera_active {
                    self.reject(UiErrorContext::Capture, "camera is not active");
                    return None;
                }
                if self.name_input.trim().is_empty() {
                    self.reject(UiErrorContext::Capture, "please enter a name for this face");
                    return None;
                }
                self.in_flight.capture = true;
                Some(BackendCommand::CaptureFrame)
            }
            Intent::UploadPicked(path) => {
                if self.in_flight.registration_busy() {
                    return None;
                }
                if self.name_input.trim().is_empty() {
                    self.reject(
                        UiErrorContext::UploadRead,
                        "please enter a name for this face",
                    );
                    return None;
                }
                self.in_flight.upload_read = true;
                Some(BackendCommand::ReadUploadFile { path })
            }
            Intent::PendingNameChanged(name) => {
                if let Some(pending) = &mut self.pending {
                    pending.name = name;
                }
                None
            }
            Intent::ConfirmRegister => {
                if self.in_flight.register {
                    return None;
                }
                let Some(pending) = &self.pending else {
                    self.reject(UiErrorContext::Register, "no captured or uploaded image");
                    return None;
                };
                let name = pending.name.trim();
                if name.is_empty() {
                    self.reject(
                        UiErrorContext::Register,
                        "please enter a name for this face",
                    );
                    return None;
                }
                self.in_flight.register = true;
                Some(BackendCommand::RegisterFace {
                    name: name.to_string(),
                    image: pending.image.clone(),
                })
            }
            Intent::DiscardPending => {
                self.pending = None;
                None
            }
            Intent::RequestDelete { id, name } => {
                self.confirmation = Some(Confirmation::DeleteFace { id, name });
                None
            }
            Intent::RequestReset => {
                self.confirmation = Some(Confirmation::ResetDatabase);
                None
            }
            Intent::CancelDestructive => {
                self.confirmation = None;
                None
            }
            Intent::ConfirmDestructive => match self.confirmation.take() {
                Some(Confirmation::DeleteFace { id, .. }) => {
                    self.in_flight.delete = true;
                    Some(BackendCommand::DeleteFace { id })
                }
                Some(Confirmation::ResetDatabase) => {
                    self.in_flight.reset = true;
                    Some(BackendCommand::ResetDatabase)
                }
                None => None,
            },
            Intent::RefreshFaces => self.reload_faces(),
        }
    }

    /// Applies a completion event. Only success events flip session
    /// flags; every error leaves the session and face list exactly as
    /// they were. May return a follow-up command (the post-mutation list
    /// reload).
    pub fn apply(&mut self, event: &UiEvent) -> Option<BackendCommand> {
        match event {
            UiEvent::CameraStarted { message } => {
                self.in_flight.camera = false;
                self.session.camera_active = true;
                self.status = StatusLine::info(message.clone());
                None
            }
            UiEvent::CameraStopped { message } => {
                self.in_flight.camera = false;
                self.session.camera_active = false;
                // Recognition only means anything on a live feed.
                self.session.recognition_active = false;
                self.status = StatusLine::info(message.clone());
                None
            }
            UiEvent::RecognitionToggled { enabled, message } => {
                self.in_flight.recognition = false;
                self.session.recognition_active = *enabled;
                self.status = StatusLine::info(message.clone());
                None
            }
            UiEvent::FrameCaptured { jpeg } => {
                self.in_flight.capture = false;
                self.pending = Some(PendingRegistration {
                    name: self.name_input.trim().to_string(),
                    image: RegistrationImage::captured_frame(jpeg.clone()),
                    source: ImageSource::Capture,
                });
                self.status = StatusLine::info("Frame captured; confirm to register");
                None
            }
            UiEvent::UploadLoaded { image } => {
                self.in_flight.upload_read = false;
                self.pending = Some(PendingRegistration {
                    name: self.name_input.trim().to_string(),
                    image: image.clone(),
                    source: ImageSource::Upload,
                });
                self.status = StatusLine::info("Image loaded; confirm to register");
                None
            }
            UiEvent::FaceRegistered { message } => {
                self.in_flight.register = false;
                self.pending = None;
                self.status = StatusLine::info(message.clone());
                self.reload_faces()
            }
            UiEvent::FacesLoaded { faces } => {
                self.in_flight.list = false;
                // Full replacement, never a merge.
                self.faces = faces.clone();
                None
            }
            UiEvent::FaceDeleted { message } => {
                self.in_flight.delete = false;
                self.status = StatusLine::info(message.clone());
                self.reload_faces()
            }
            UiEvent::DatabaseReset { message } => {
                self.in_flight.reset = false;
                self.status = StatusLine::info(message.clone());
                self.reload_faces()
            }
            UiEvent::Info(message) => {
                self.status = StatusLine::info(message.clone());
                None
            }
            UiEvent::Error(err) => {
                self.clear_in_flight_for(err.context());
                // Session flags and the face list stay untouched on
                // failure; only the status line changes.
                self.status =
                    StatusLine::error(format!("{}: {}", err.context().label(), err.message()));
                None
            }
            // Frames and previews are texture concerns; the shell
            // consumes them before the reducer sees anything.
            UiEvent::VideoFrame { .. }
            | UiEvent::FeedEnded
            | UiEvent::FacePreviewLoaded { .. }
            | UiEvent::FacePreviewFailed { .. } => None,
        }
    }

    fn reload_faces(&mut self) -> Option<BackendCommand> {
        if self.in_flight.list {
            return None;
        }
        self.in_flight.list = true;
        Some(BackendCommand::LoadFaces)
    }

    fn clear_in_flight_for(&mut self, context: UiErrorContext) {
        match context {
            UiErrorContext::StartCamera | UiErrorContext::StopCamera => {
                self.in_flight.camera = false
            }
            UiErrorContext::ToggleRecognition => self.in_flight.recognition = false,
            UiErrorContext::Capture => self.in_flight.capture = false,
            UiErrorContext::UploadRead => self.in_flight.upload_read = false,
            UiErrorContext::Register => self.in_flight.register = false,
            UiErrorContext::LoadFaces => self.in_flight.list = false,
            UiErrorContext::Delete => self.in_flight.delete = false,
            UiErrorContext::Reset => self.in_flight.reset = false,
            UiErrorContext::BackendStartup | UiErrorContext::Feed | UiErrorContext::General => {}
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonView {
    pub label: &'static str,
    pub enabled: bool,
}

/// Everything the shell needs to draw the controls, computed fresh from
/// state on every frame so enablement can never go stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlsView {
    pub camera_button: ButtonView,
    pub recognition_button: ButtonView,
    pub capture_button: ButtonView,
    pub upload_button: ButtonView,
    pub register_button: ButtonView,
    pub refresh_button: ButtonView,
    pub reset_button: ButtonView,
    pub camera_badge: &'static str,
    pub recognition_badge: &'static str,
    pub face_count: usize,
    pub busy: bool,
}

pub fn render(state: &Controller) -> ControlsView {
    let name_filled = !state.name_input.trim().is_empty();
    let registration_busy = state.in_flight.registration_busy();
    ControlsView {
        camera_button: ButtonView {
            label: if state.session.camera_active {
                "Stop Camera"
            } else {
                "Start Camera"
            },
            enabled: !state.in_flight.camera,
        },
        recognition_button: ButtonView {
            label: if state.session.recognition_active {
                "Disable Recognition"
            } else {
                "Enable Recognition"
            },
            enabled: state.session.camera_active && !state.in_flight.recognition,
        },
        capture_button: ButtonView {
            label: "Capture Face",
            enabled: state.session.camera_active && name_filled && !registration_busy,
        },
        upload_button: ButtonView {
            label: "Upload Image",
            enabled: name_filled && !registration_busy,
        },
        register_button: ButtonView {
            label: "Register",
            enabled: state
                .pending
                .as_ref()
                .is_some_and(|pending| !pending.name.trim().is_empty())
                && !state.in_flight.register,
        },
        refresh_button: ButtonView {
            label: "Refresh",
            enabled: !state.in_flight.list,
        },
        reset_button: ButtonView {
            label: "Reset Database",
            enabled: !state.in_flight.reset,
        },
        camera_badge: if state.session.camera_active {
            "Camera: On"
        } else {
            "Camera: Off"
        },
        recognition_badge: if state.session.recognition_active {
            "Recognition: On"
        } else {
            "Recognition: Off"
        },
        face_count: state.faces.len(),
        busy: state.in_flight.any(),
    }
}

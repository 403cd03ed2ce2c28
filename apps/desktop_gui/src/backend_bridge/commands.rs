//! Backend commands queued from UI to backend worker.

use client_core::RegistrationImage;
use shared::domain::FaceId;
use std::path::PathBuf;

pub enum BackendCommand {
    StartCamera,
    StopCamera,
    ToggleRecognition,
    CaptureFrame,
    RegisterFace {
        name: String,
        image: RegistrationImage,
    },
    /// Read a user-picked file off the UI thread and hand it back as a
    /// pending registration image.
    ReadUploadFile {
        path: PathBuf,
    },
    LoadFaces,
    DeleteFace {
        id: FaceId,
    },
    ResetDatabase,
    FetchFacePreview {
        id: FaceId,
        image_path: String,
    },
}

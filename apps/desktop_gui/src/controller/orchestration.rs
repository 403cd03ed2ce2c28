//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::reducer::StatusLine;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut StatusLine,
) {
    let cmd_name = match &cmd {
        BackendCommand::StartCamera => "start_camera",
        BackendCommand::StopCamera => "stop_camera",
        BackendCommand::ToggleRecognition => "toggle_recognition",
        BackendCommand::CaptureFrame => "capture_frame",
        BackendCommand::RegisterFace { .. } => "register_face",
        BackendCommand::ReadUploadFile { .. } => "read_upload_file",
        BackendCommand::LoadFaces => "load_faces",
        BackendCommand::DeleteFace { .. } => "delete_face",
        BackendCommand::ResetDatabase => "reset_database",
        BackendCommand::FetchFacePreview { .. } => "fetch_face_preview",
    };

    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *status = StatusLine::error("Command queue is full; please retry");
        }
        Err(TrySendError::Disconnected(_)) => {
            *status = StatusLine::error(
                "Backend command processor disconnected (possible startup/runtime failure); restart the app",
            );
        }
    }
}

//! Backend worker: owns the async runtime and the HTTP client, executes
//! commands strictly in arrival order, and reports every completion back
//! through the UI event queue.

use std::path::Path;
use std::thread;

use crossbeam_channel::{Receiver, Sender};
use futures::StreamExt;

use client_core::{FaceApiClient, RegistrationImage};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(server_url: String, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(run_worker(server_url, cmd_rx, ui_tx));
    });
}

async fn run_worker(
    server_url: String,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    let client = match FaceApiClient::new(&server_url) {
        Ok(client) => client,
        Err(err) => {
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_client(
                UiErrorContext::BackendStartup,
                &err,
            )));
            tracing::error!("rejected server url '{server_url}': {err}");
            return;
        }
    };
    let _ = ui_tx.try_send(UiEvent::Info("Backend worker ready".to_string()));

    let mut feed_task: Option<tokio::task::JoinHandle<()>> = None;

    // Commands run one at a time in arrival order; the live feed is the
    // only concurrent piece and it never touches command state.
    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            BackendCommand::StartCamera => match client.start_camera().await {
                Ok(ack) => {
                    let _ = ui_tx.try_send(UiEvent::CameraStarted {
                        message: ack.message_or("Camera started").to_string(),
                    });
                    if let Some(task) = feed_task.take() {
                        task.abort();
                    }
                    feed_task = Some(spawn_feed_task(client.clone(), ui_tx.clone()));
                }
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_client(
                        UiErrorContext::StartCamera,
                        &err,
                    )));
                }
            },
            BackendCommand::StopCamera => {
                if let Some(task) = feed_task.take() {
                    task.abort();
                }
                match client.stop_camera().await {
                    Ok(ack) => {
                        let _ = ui_tx.try_send(UiEvent::CameraStopped {
                            message: ack.message_or("Camera stopped").to_string(),
                        });
                    }
                    Err(err) => {
                        let _ = ui_tx.try_send(UiEvent::Error(UiError::from_client(
                            UiErrorContext::StopCamera,
                            &err,
                        )));
                    }
                }
            }
            BackendCommand::ToggleRecognition => match client.toggle_recognition().await {
                Ok(toggled) => {
                    let message = toggled
                        .ack
                        .message_or(if toggled.enabled {
                            "Face recognition enabled"
                        } else {
                            "Face recognition disabled"
                        })
                        .to_string();
                    let _ = ui_tx.try_send(UiEvent::RecognitionToggled {
                        enabled: toggled.enabled,
                        message,
                    });
                }
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_client(
                        UiErrorContext::ToggleRecognition,
                        &err,
                    )));
                }
            },
            BackendCommand::CaptureFrame => match client.capture_frame().await {
                Ok(jpeg) => {
                    let _ = ui_tx.try_send(UiEvent::FrameCaptured { jpeg });
                }
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_client(
                        UiErrorContext::Capture,
                        &err,
                    )));
                }
            },
            BackendCommand::RegisterFace { name, image } => {
                match client.register_face(&name, image).await {
                    Ok(ack) => {
                        let _ = ui_tx.try_send(UiEvent::FaceRegistered {
                            message: ack.message_or("Face registered successfully").to_string(),
                        });
                    }
                    Err(err) => {
                        let _ = ui_tx.try_send(UiEvent::Error(UiError::from_client(
                            UiErrorContext::Register,
                            &err,
                        )));
                    }
                }
            }
            BackendCommand::ReadUploadFile { path } => match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    let _ = ui_tx.try_send(UiEvent::UploadLoaded {
                        image: upload_image(&path, bytes),
                    });
                }
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::UploadRead,
                        format!("could not read '{}': {err}", path.display()),
                    )));
                }
            },
            BackendCommand::LoadFaces => match client.list_faces().await {
                Ok(faces) => {
                    let _ = ui_tx.try_send(UiEvent::FacesLoaded { faces });
                }
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_client(
                        UiErrorContext::LoadFaces,
                        &err,
                    )));
                }
            },
            BackendCommand::DeleteFace { id } => match client.delete_face(id).await {
                Ok(ack) => {
                    let _ = ui_tx.try_send(UiEvent::FaceDeleted {
                        message: ack.message_or("Face deleted").to_string(),
                    });
                }
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_client(
                        UiErrorContext::Delete,
                        &err,
                    )));
                }
            },
            BackendCommand::ResetDatabase => match client.reset_database().await {
                Ok(ack) => {
                    let _ = ui_tx.try_send(UiEvent::DatabaseReset {
                        message: ack.message_or("Face database has been reset").to_string(),
                    });
                }
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_client(
                        UiErrorContext::Reset,
                        &err,
                    )));
                }
            },
            BackendCommand::FetchFacePreview { id, image_path } => {
                match client.fetch_image(&image_path).await {
                    Ok(jpeg) => {
                        let _ = ui_tx.try_send(UiEvent::FacePreviewLoaded { id, jpeg });
                    }
                    Err(err) => {
                        let _ = ui_tx.try_send(UiEvent::FacePreviewFailed {
                            id,
                            reason: err.to_string(),
                        });
                    }
                }
            }
        }
    }

    if let Some(task) = feed_task.take() {
        task.abort();
    }
    tracing::debug!("command queue closed; backend worker exiting");
}

/// Streams the MJPEG feed into the UI queue until the stream ends, the
/// UI disconnects, or the task is aborted by a camera stop.
fn spawn_feed_task(
    client: FaceApiClient,
    ui_tx: Sender<UiEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let feed = match client.open_video_feed().await {
            Ok(feed) => feed,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_client(
                    UiErrorContext::Feed,
                    &err,
                )));
                let _ = ui_tx.try_send(UiEvent::FeedEnded);
                return;
            }
        };
        let mut feed = std::pin::pin!(feed);
        while let Some(frame) = feed.next().await {
            match frame {
                // try_send on purpose: dropping frames beats blocking the
                // stream when the UI queue backs up.
                Ok(jpeg) => match ui_tx.try_send(UiEvent::VideoFrame { jpeg }) {
                    Ok(()) | Err(crossbeam_channel::TrySendError::Full(_)) => {}
                    Err(crossbeam_channel::TrySendError::Disconnected(_)) => break,
                },
                Err(err) => {
                    tracing::warn!("live feed interrupted: {err}");
                    break;
                }
            }
        }
        let _ = ui_tx.try_send(UiEvent::FeedEnded);
    })
}

fn upload_image(path: &Path, bytes: Vec<u8>) -> RegistrationImage {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("upload.jpg")
        .to_string();
    let mime_type = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();
    RegistrationImage {
        bytes,
        filename,
        mime_type,
    }
}

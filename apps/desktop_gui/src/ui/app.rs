use std::{collections::HashMap, time::Duration};

use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use egui::TextureHandle;

use shared::domain::{FaceId, FaceRecord};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::controller::orchestration::dispatch_backend_command;
use crate::controller::reducer::{render, Confirmation, Controller, Intent, Severity, StatusLine};

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub server_url: String,
    pub name_prefill: Option<String>,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5001".to_string(),
            name_prefill: None,
        }
    }
}

enum PreviewState {
    Loading,
    Ready(TextureHandle),
    Error(String),
}

/// egui shell around the reducer. All domain state lives in
/// [`Controller`]; this struct only holds textures and channel ends.
pub struct ControlPanelApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,

    controller: Controller,
    server_url: String,

    feed_texture: Option<TextureHandle>,
    pending_texture: Option<TextureHandle>,
    previews: HashMap<FaceId, PreviewState>,
}

impl ControlPanelApp {
    pub fn bootstrap(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        startup: StartupConfig,
    ) -> Self {
        let mut controller = Controller::new();
        if let Some(name) = startup.name_prefill {
            controller.name_input = name;
        }
        Self {
            cmd_tx,
            ui_rx,
            controller,
            server_url: startup.server_url,
            feed_texture: None,
            pending_texture: None,
            previews: HashMap::new(),
        }
    }

    fn submit(&mut self, intent: Intent) {
        if let Some(cmd) = self.controller.handle(intent) {
            dispatch_backend_command(&self.cmd_tx, cmd, &mut self.controller.status);
        }
    }

    fn process_ui_events(&mut self, ctx: &egui::Context) {
        while let Ok(event) = self.ui_rx.try_recv() {
            // Texture side of the event first, then the reducer.
            match &event {
                UiEvent::VideoFrame { jpeg } => {
                    if let Some(texture) = decode_texture(ctx, "live-feed", jpeg) {
                        self.feed_texture = Some(texture);
                    }
                    continue;
                }
                UiEvent::FeedEnded | UiEvent::CameraStopped { .. } => {
                    self.feed_texture = None;
                }
                UiEvent::FrameCaptured { jpeg } => {
                    self.pending_texture = decode_texture(ctx, "pending-registration", jpeg);
                }
                UiEvent::UploadLoaded { image } => {
                    self.pending_texture =
                        decode_texture(ctx, "pending-registration", &image.bytes);
                }
                UiEvent::FaceRegistered { .. } => {
                    self.pending_texture = None;
                }
                UiEvent::FacePreviewLoaded { id, jpeg } => {
                    let state = match decode_texture(ctx, &format!("face-preview-{}", id.0), jpeg)
                    {
                        Some(texture) => PreviewState::Ready(texture),
                        None => PreviewState::Error("undecodable image".to_string()),
                    };
                    self.previews.insert(*id, state);
                    continue;
                }
                UiEvent::FacePreviewFailed { id, reason } => {
                    self.previews.insert(*id, PreviewState::Error(reason.clone()));
                    continue;
                }
                UiEvent::FacesLoaded { faces } => {
                    self.sync_previews(faces);
                }
                _ => {}
            }

            if let Some(followup) = self.controller.apply(&event) {
                dispatch_backend_command(&self.cmd_tx, followup, &mut self.controller.status);
            }
        }
    }

    /// Drops previews for deleted faces and requests the missing ones.
    fn sync_previews(&mut self, faces: &[FaceRecord]) {
        self.previews.retain(|id, _| faces.iter().any(|f| f.id == *id));
        for face in faces {
            if !self.previews.contains_key(&face.id) {
                self.previews.insert(face.id, PreviewState::Loading);
                dispatch_backend_command(
                    &self.cmd_tx,
                    BackendCommand::FetchFacePreview {
                        id: face.id,
                        image_path: face.image_path.clone(),
                    },
                    &mut self.controller.status,
                );
            }
        }
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        let view = render(&self.controller);
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.heading("Face Registration");
                ui.separator();
                ui.label(egui::RichText::new(view.camera_badge).strong().color(
                    if self.controller.session.camera_active {
                        egui::Color32::from_rgb(67, 181, 129)
                    } else {
                        egui::Color32::GRAY
                    },
                ));
                ui.label(egui::RichText::new(view.recognition_badge).strong().color(
                    if self.controller.session.recognition_active {
                        egui::Color32::from_rgb(67, 181, 129)
                    } else {
                        egui::Color32::GRAY
                    },
                ));
                ui.label(format!("Registered: {}", view.face_count));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.small(egui::RichText::new(&self.server_url).weak());
                    if view.busy {
                        ui.spinner();
                    }
                });
            });
            ui.add_space(4.0);
        });
    }

    fn show_status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.add_space(2.0);
            let StatusLine { severity, text } = &self.controller.status;
            let color = match severity {
                Severity::Info => ui.visuals().text_color(),
                Severity::Error => egui::Color32::from_rgb(220, 100, 100),
            };
            ui.label(egui::RichText::new(text).color(color));
            ui.add_space(2.0);
        });
    }

    fn show_faces_panel(&mut self, ctx: &egui::Context) {
        let mut intents = Vec::new();
        egui::SidePanel::right("faces_panel")
            .default_width(280.0)
            .show(ctx, |ui| {
                ui.add_space(6.0);
                ui.horizontal(|ui| {
                    ui.strong("Registered faces");
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        let view = render(&self.controller);
                        if ui
                            .add_enabled(
                                view.refresh_button.enabled,
                                egui::Button::new(view.refresh_button.label),
                            )
                            .clicked()
                        {
                            intents.push(Intent::RefreshFaces);
                        }
                    });
                });
                ui.separator();

                if self.controller.faces.is_empty() {
                    ui.weak("No faces registered yet.");
                }

                egui::ScrollArea::vertical().show(ui, |ui| {
                    for face in &self.controller.faces {
                        ui.horizontal(|ui| {
                            match self.previews.get(&face.id) {
                                Some(PreviewState::Ready(texture)) => {
                                    ui.add(
                                        egui::Image::new(texture)
                                            .max_size(egui::vec2(48.0, 48.0))
                                            .corner_radius(4.0),
                                    );
                                }
                                Some(PreviewState::Loading) => {
                                    ui.add_sized([48.0, 48.0], egui::Spinner::new());
                                }
                                Some(PreviewState::Error(_)) | None => {
                                    ui.add_sized(
                                        [48.0, 48.0],
                                        egui::Label::new(egui::RichText::new("?").weak()),
                                    );
                                }
                            }
                            ui.vertical(|ui| {
                                ui.strong(&face.name);
                                ui.small(format!("#{}", face.id.0));
                            });
                            ui.with_layout(
                                egui::Layout::right_to_left(egui::Align::Center),
                                |ui| {
                                    if ui.small_button("Delete").clicked() {
                                        intents.push(Intent::RequestDelete {
                                            id: face.id,
                                            name: face.name.clone(),
                                        });
                                    }
                                },
                            );
                        });
                        ui.separator();
                    }
                });

                ui.add_space(6.0);
                let view = render(&self.controller);
                if ui
                    .add_enabled(
                        view.reset_button.enabled,
                        egui::Button::new(view.reset_button.label),
                    )
                    .clicked()
                {
                    intents.push(Intent::RequestReset);
                }
                ui.add_space(6.0);
            });
        for intent in intents {
            self.submit(intent);
        }
    }

    fn show_central(&mut self, ctx: &egui::Context) {
        let mut intents = Vec::new();
        egui::CentralPanel::default().show(ctx, |ui| {
            let view = render(&self.controller);

            ui.add_space(4.0);
            ui.horizontal(|ui| {
                if ui
                    .add_enabled(
                        view.camera_button.enabled,
                        egui::Button::new(view.camera_button.label),
                    )
                    .clicked()
                {
                    intents.push(Intent::ToggleCamera);
                }
                if ui
                    .add_enabled(
                        view.recognition_button.enabled,
                        egui::Button::new(view.recognition_button.label),
                    )
                    .clicked()
                {
                    intents.push(Intent::ToggleRecognition);
                }
            });

            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.label("Name:");
                let mut name_buf = self.controller.name_input.clone();
                let edit = egui::TextEdit::singleline(&mut name_buf)
                    .id_salt("face_name_input")
                    .hint_text("Who is this?")
                    .desired_width(220.0);
                ui.add(edit);
                if name_buf != self.controller.name_input {
                    intents.push(Intent::NameChanged(name_buf));
                }

                if ui
                    .add_enabled(
                        view.capture_button.enabled,
                        egui::Button::new(view.capture_button.label),
                    )
                    .clicked()
                {
                    intents.push(Intent::Capture);
                }
                if ui
                    .add_enabled(
                        view.upload_button.enabled,
                        egui::Button::new(view.upload_button.label),
                    )
                    .clicked()
                {
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("Images", &["png", "jpg", "jpeg", "gif", "webp", "bmp"])
                        .pick_file()
                    {
                        intents.push(Intent::UploadPicked(path));
                    }
                }
            });

            ui.add_space(8.0);
            ui.separator();
            ui.add_space(8.0);

            match (&self.feed_texture, self.controller.session.camera_active) {
                (Some(texture), _) => {
                    ui.centered_and_justified(|ui| {
                        ui.add(
                            egui::Image::new(texture)
                                .max_size(ui.available_size())
                                .corner_radius(6.0),
                        );
                    });
                }
                (None, true) => {
                    ui.centered_and_justified(|ui| {
                        ui.spinner();
                    });
                }
                (None, false) => {
                    ui.centered_and_justified(|ui| {
                        ui.weak("Camera is off. Start it to see the live feed.");
                    });
                }
            }
        });
        for intent in intents {
            self.submit(intent);
        }
    }

    fn show_registration_window(&mut self, ctx: &egui::Context) {
        if self.controller.pending.is_none() {
            return;
        }
        let mut intents = Vec::new();
        egui::Window::new("Confirm registration")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                if let Some(texture) = &self.pending_texture {
                    ui.vertical_centered(|ui| {
                        ui.add(
                            egui::Image::new(texture)
                                .max_size(egui::vec2(320.0, 240.0))
                                .corner_radius(6.0),
                        );
                    });
                }
                if let Some(pending) = &self.controller.pending {
                    ui.small(format!("Source: {}", pending.source.label()));
                    ui.add_space(4.0);
                    ui.label("Register as:");
                    let mut name_buf = pending.name.clone();
                    ui.add(
                        egui::TextEdit::singleline(&mut name_buf)
                            .id_salt("pending_name_input")
                            .desired_width(f32::INFINITY),
                    );
                    if name_buf != pending.name {
                        intents.push(Intent::PendingNameChanged(name_buf));
                    }
                }
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    let view = render(&self.controller);
                    if ui
                        .add_enabled(
                            view.register_button.enabled,
                            egui::Button::new(view.register_button.label),
                        )
                        .clicked()
                    {
                        intents.push(Intent::ConfirmRegister);
                    }
                    if ui.button("Cancel").clicked() {
                        intents.push(Intent::DiscardPending);
                        self.pending_texture = None;
                    }
                });
            });
        for intent in intents {
            self.submit(intent);
        }
    }

    fn show_confirmation_window(&mut self, ctx: &egui::Context) {
        let Some(confirmation) = self.controller.confirmation.clone() else {
            return;
        };
        let (title, prompt) = match &confirmation {
            Confirmation::DeleteFace { name, .. } => (
                "Delete face",
                format!("Delete the registered face for '{name}'? This cannot be undone."),
            ),
            Confirmation::ResetDatabase => (
                "Reset database",
                "Remove every registered face? This cannot be undone.".to_string(),
            ),
        };
        let mut intents = Vec::new();
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(prompt);
                ui.add_space(8.0);
                ui.horizontal(|ui| {
                    if ui.button("Confirm").clicked() {
                        intents.push(Intent::ConfirmDestructive);
                    }
                    if ui.button("Cancel").clicked() {
                        intents.push(Intent::CancelDestructive);
                    }
                });
            });
        for intent in intents {
            self.submit(intent);
        }
    }
}

impl eframe::App for ControlPanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events(ctx);

        self.show_header(ctx);
        self.show_status_bar(ctx);
        self.show_faces_panel(ctx);
        self.show_central(ctx);
        self.show_registration_window(ctx);
        self.show_confirmation_window(ctx);

        // Fast cadence while frames are streaming, relaxed otherwise.
        let cadence = if self.controller.session.camera_active {
            Duration::from_millis(16)
        } else {
            Duration::from_millis(100)
        };
        ctx.request_repaint_after(cadence);
    }
}

fn decode_texture(ctx: &egui::Context, name: &str, bytes: &[u8]) -> Option<TextureHandle> {
    let decoded = image::load_from_memory(bytes).ok()?;
    let rgba = decoded.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let color_image = egui::ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
    Some(ctx.load_texture(name.to_string(), color_image, egui::TextureOptions::LINEAR))
}

mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use crossbeam_channel::bounded;
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::backend_bridge::runtime;
use crate::controller::events::UiEvent;
use crate::ui::{ControlPanelApp, StartupConfig};

/// Desktop control panel for the face-recognition backend.
#[derive(Parser)]
#[command(name = "face_panel", version)]
struct Cli {
    /// Base URL of the face-recognition backend.
    #[arg(long, default_value = "http://127.0.0.1:5001")]
    server_url: String,

    /// Prefill the registration name field.
    #[arg(long)]
    name: Option<String>,
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let cli = Cli::parse();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    runtime::launch(cli.server_url.clone(), cmd_rx, ui_tx);

    // Populate the face list before the first frame renders.
    let _ = cmd_tx.try_send(BackendCommand::LoadFaces);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Face Registration Panel")
            .with_inner_size([1100.0, 720.0])
            .with_min_inner_size([820.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Face Registration Panel",
        options,
        Box::new(move |_cc| {
            let startup = StartupConfig {
                server_url: cli.server_url,
                name_prefill: cli.name,
            };
            Ok(Box::new(ControlPanelApp::bootstrap(cmd_tx, ui_rx, startup)))
        }),
    )
}

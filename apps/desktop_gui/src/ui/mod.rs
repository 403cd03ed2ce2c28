//! UI layer: the egui app shell and texture plumbing.

pub mod app;

pub use app::{ControlPanelApp, StartupConfig};

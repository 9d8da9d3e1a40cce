use std::path::PathBuf;

mod backend_bridge;
mod controller;
mod ui;

use clap::Parser;
use client_core::config::{load_settings, ClientSettings};
use crossbeam_channel::bounded;
use eframe::egui;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;
use crate::ui::DesktopGuiApp;

#[derive(Parser, Debug)]
#[command(about = "Desktop front end for the event registration service")]
struct Args {
    /// Backend base URL, e.g. http://127.0.0.1:5000
    #[arg(long)]
    server_url: Option<String>,
    /// Directory holding the persisted session
    #[arg(long)]
    data_dir: Option<PathBuf>,
    /// How long notices stay on screen
    #[arg(long)]
    notice_seconds: Option<u64>,
}

impl Args {
    fn apply(self, settings: &mut ClientSettings) {
        if let Some(server_url) = self.server_url {
            settings.server_url = server_url;
        }
        if let Some(data_dir) = self.data_dir {
            settings.data_dir = Some(data_dir);
        }
        if let Some(notice_seconds) = self.notice_seconds {
            settings.notice_seconds = notice_seconds;
        }
    }
}

fn main() -> eframe::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let mut settings = load_settings();
    Args::parse().apply(&mut settings);
    tracing::info!(server_url = %settings.server_url, "starting desktop gui");
    let notice_duration = settings.notice_duration();

    let (cmd_tx, cmd_rx) = bounded::<BackendCommand>(256);
    let (ui_tx, ui_rx) = bounded::<UiEvent>(2048);
    backend_bridge::runtime::launch(settings, cmd_rx, ui_tx);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Event Registration")
            .with_inner_size([1200.0, 820.0])
            .with_min_inner_size([720.0, 560.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Event Registration",
        options,
        Box::new(move |_cc| Ok(Box::new(DesktopGuiApp::new(cmd_tx, ui_rx, notice_duration)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_loaded_settings() {
        let mut settings = ClientSettings::default();
        let args = Args::parse_from([
            "desktop_gui",
            "--server-url",
            "http://events.local:8080",
            "--notice-seconds",
            "7",
        ]);

        args.apply(&mut settings);

        assert_eq!(settings.server_url, "http://events.local:8080");
        assert_eq!(settings.notice_seconds, 7);
        assert_eq!(settings.data_dir, None);
    }
}

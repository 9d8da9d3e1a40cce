//! Backend commands queued from UI to backend worker.

use client_core::UiAction;

pub enum BackendCommand {
    /// Routed through the controller's `(view, action)` table.
    Action(UiAction),
    /// Download and decode an image; `url` may be relative to the server.
    FetchImage { url: String },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::Action(action) => action.name(),
            BackendCommand::FetchImage { .. } => "fetch_image",
        }
    }
}

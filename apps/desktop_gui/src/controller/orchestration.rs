//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

/// Queues `cmd` for the worker. On failure the returned text says why, for
/// the status line.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
) -> Result<(), String> {
    let cmd_name = cmd.name();

    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            Ok(())
        }
        Err(TrySendError::Full(_)) => {
            tracing::warn!(command = cmd_name, "ui command queue full");
            Err("UI command queue is full; please retry".to_string())
        }
        Err(TrySendError::Disconnected(_)) => Err(
            "Backend command processor disconnected (possible startup/runtime failure); restart the app"
                .to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use client_core::{UiAction, View};
    use crossbeam_channel::bounded;

    #[test]
    fn reports_full_queue_without_blocking() {
        let (tx, _rx) = bounded(1);
        dispatch_backend_command(&tx, BackendCommand::Action(UiAction::Logout)).expect("first");
        let err = dispatch_backend_command(
            &tx,
            BackendCommand::Action(UiAction::Navigate(View::Home)),
        )
        .expect_err("queue full");
        assert!(err.contains("full"));
    }

    #[test]
    fn reports_disconnected_worker() {
        let (tx, rx) = bounded(4);
        drop(rx);
        let err = dispatch_backend_command(
            &tx,
            BackendCommand::FetchImage {
                url: "/static/a.png".into(),
            },
        )
        .expect_err("disconnected");
        assert!(err.contains("disconnected"));
    }
}

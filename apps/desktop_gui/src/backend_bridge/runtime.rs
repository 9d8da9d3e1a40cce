//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use anyhow::Context;
use client_core::{
    config::ClientSettings, AppController, ClientEvent, FileSessionStore, HttpBackend,
};
use crossbeam_channel::{Receiver, Sender};
use tokio::sync::broadcast::error::RecvError;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};
use crate::ui::images::decode_image;

pub fn launch(settings: ClientSettings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
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

        runtime.block_on(async move {
            let (controller, images) = match build_controller(&settings) {
                Ok(pair) => pair,
                Err(err) => {
                    tracing::error!("backend worker startup failure: {err:#}");
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!("{err:#}"),
                    )));
                    return;
                }
            };

            let mut events = controller.subscribe_events();
            let ui_tx_events = ui_tx.clone();
            tokio::spawn(async move {
                loop {
                    let evt = match events.recv().await {
                        Ok(ClientEvent::StateChanged(snapshot)) => UiEvent::State(snapshot),
                        Ok(ClientEvent::Notice(notice)) => UiEvent::Notice(notice),
                        Err(RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "ui event forwarder lagged");
                            continue;
                        }
                        Err(RecvError::Closed) => break,
                    };
                    if ui_tx_events.send(evt).is_err() {
                        break;
                    }
                }
            });

            {
                let controller = Arc::clone(&controller);
                tokio::spawn(async move { controller.start().await });
            }
            let _ = ui_tx.try_send(UiEvent::Info(format!(
                "Connected to {}",
                controller.base_url()
            )));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    // One task per action; the controller drops overlapping toggles.
                    BackendCommand::Action(action) => {
                        let controller = Arc::clone(&controller);
                        tokio::spawn(async move {
                            controller.dispatch(action).await;
                        });
                    }
                    BackendCommand::FetchImage { url } => {
                        let images = images.clone();
                        let ui_tx = ui_tx.clone();
                        tokio::spawn(async move {
                            let evt = match images.fetch_bytes(&url).await {
                                Ok(bytes) => match decode_image(&bytes) {
                                    Ok(image) => UiEvent::ImageLoaded { url, image },
                                    Err(reason) => {
                                        tracing::warn!(%url, "image decode failed: {reason}");
                                        UiEvent::ImageFailed { url, reason }
                                    }
                                },
                                Err(err) => {
                                    tracing::debug!(%url, "image fetch failed: {err}");
                                    UiEvent::ImageFailed {
                                        url,
                                        reason: err.to_string(),
                                    }
                                }
                            };
                            let _ = ui_tx.try_send(evt);
                        });
                    }
                }
            }
            tracing::info!("ui command channel closed; backend worker exiting");
        });
    });
}

fn build_controller(settings: &ClientSettings) -> anyhow::Result<(Arc<AppController>, HttpBackend)> {
    let backend = HttpBackend::new(&settings.server_url)
        .with_context(|| format!("backend worker startup failure: server {}", settings.server_url))?;
    let data_dir = settings.resolved_data_dir();
    std::fs::create_dir_all(&data_dir).with_context(|| {
        format!(
            "backend worker startup failure: could not prepare data directory '{}'",
            data_dir.display()
        )
    })?;
    let store = FileSessionStore::in_dir(&data_dir);
    tracing::info!(path = %store.path().display(), "session storage ready");
    let controller = AppController::new(
        Arc::new(backend.clone()),
        Arc::new(store),
        backend.base_url().clone(),
    );
    Ok((controller, backend))
}

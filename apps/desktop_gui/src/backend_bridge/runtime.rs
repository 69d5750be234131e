//! Runtime bridge between UI command queue and backend event intake.

use std::{io, thread};

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;

/// Spawns the worker thread. Decodes run on the blocking pool, network
/// calls as tasks; each finished job comes back as one [`UiEvent`].
pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("classifier-backend".to_string())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()
            {
                Ok(runtime) => runtime,
                Err(err) => {
                    tracing::error!("failed to build backend runtime: {err}");
                    send_ui_event(
                        &ui_tx,
                        UiEvent::BackendFailed(format!(
                            "backend worker startup failure: failed to build runtime: {err}"
                        )),
                    );
                    return;
                }
            };
            tracing::info!("backend worker ready");

            while let Ok(cmd) = cmd_rx.recv() {
                tracing::debug!(command = cmd.name(), "backend command received");
                let ui_tx = ui_tx.clone();
                match cmd {
                    BackendCommand::DecodePreview(job) => {
                        runtime.spawn_blocking(move || {
                            send_ui_event(&ui_tx, UiEvent::PreviewReady(job.run()));
                        });
                    }
                    BackendCommand::Predict(job) => {
                        runtime.spawn(async move {
                            send_ui_event(&ui_tx, UiEvent::PredictionReady(job.run().await));
                        });
                    }
                    BackendCommand::CheckHealth(job) => {
                        runtime.spawn(async move {
                            send_ui_event(&ui_tx, UiEvent::HealthChecked(job.run().await));
                        });
                    }
                }
            }
            tracing::info!("backend command queue closed; worker exiting");
        })
}

fn send_ui_event(ui_tx: &Sender<UiEvent>, event: UiEvent) {
    let name = event.name();
    match ui_tx.try_send(event) {
        Ok(()) => {}
        Err(TrySendError::Full(_)) => {
            tracing::warn!(event = name, "ui event queue full; dropping event")
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::debug!(event = name, "ui closed; dropping event")
        }
    }
}

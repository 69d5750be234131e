//! Command orchestration helpers from UI actions to backend command queue.

use client_core::{PredictCompletion, PreviewCompletion, UploadError};
use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::UiEvent;

/// Queues `cmd`. A lifecycle job that cannot be queued is turned into a
/// failed completion so the caller can feed it straight back and the
/// controller never waits on work that will not run.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut Option<String>,
) -> Option<UiEvent> {
    let cmd_name = cmd.name();
    let (cmd, reason) = match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            return None;
        }
        Err(TrySendError::Full(cmd)) => (cmd, "UI command queue is full; please retry"),
        Err(TrySendError::Disconnected(cmd)) => (
            cmd,
            "Backend worker disconnected (possible startup/runtime failure)",
        ),
    };
    tracing::warn!(command = cmd_name, "{reason}");
    *status = Some(reason.to_string());

    match cmd {
        BackendCommand::DecodePreview(job) => Some(UiEvent::PreviewReady(PreviewCompletion {
            file_id: job.file_id(),
            outcome: Err(UploadError::unreadable(reason)),
        })),
        BackendCommand::Predict(job) => Some(UiEvent::PredictionReady(PredictCompletion {
            file_id: job.file_id(),
            outcome: Err(UploadError::NetworkFailure(reason.to_string())),
        })),
        BackendCommand::CheckHealth(_) => Some(UiEvent::HealthChecked(None)),
    }
}

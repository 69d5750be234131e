//! Backend commands queued from UI to backend worker.

use client_core::{DecodeJob, HealthJob, PredictJob};

pub enum BackendCommand {
    DecodePreview(DecodeJob),
    Predict(PredictJob),
    CheckHealth(HealthJob),
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            BackendCommand::DecodePreview(_) => "decode_preview",
            BackendCommand::Predict(_) => "predict",
            BackendCommand::CheckHealth(_) => "check_health",
        }
    }
}

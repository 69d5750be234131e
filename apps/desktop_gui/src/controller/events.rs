//! Events flowing from the backend worker back to the UI thread.

use client_core::{PredictCompletion, PreviewCompletion};
use shared::protocol::HealthResponse;

pub enum UiEvent {
    PreviewReady(PreviewCompletion),
    PredictionReady(PredictCompletion),
    /// `None` when the probe failed.
    HealthChecked(Option<HealthResponse>),
    BackendFailed(String),
}

impl UiEvent {
    pub fn name(&self) -> &'static str {
        match self {
            UiEvent::PreviewReady(_) => "preview_ready",
            UiEvent::PredictionReady(_) => "prediction_ready",
            UiEvent::HealthChecked(_) => "health_checked",
            UiEvent::BackendFailed(_) => "backend_failed",
        }
    }
}

/// Service liveness as shown in the top bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceStatus {
    Unknown,
    Checking,
    Online {
        model_loaded: Option<bool>,
        classes: usize,
    },
    Unreachable,
}

impl ServiceStatus {
    pub fn from_health(health: Option<&HealthResponse>) -> Self {
        match health {
            Some(health) => ServiceStatus::Online {
                model_loaded: health.model_loaded,
                classes: health.supported_classes.len(),
            },
            None => ServiceStatus::Unreachable,
        }
    }

    pub fn label(&self) -> String {
        match self {
            ServiceStatus::Unknown => "Service: not checked".to_string(),
            ServiceStatus::Checking => "Service: checking...".to_string(),
            ServiceStatus::Online {
                model_loaded: Some(false),
                ..
            } => "Service: online, model not loaded".to_string(),
            ServiceStatus::Online { classes: 0, .. } => "Service: online".to_string(),
            ServiceStatus::Online { classes, .. } => format!("Service: online ({classes} classes)"),
            ServiceStatus::Unreachable => "Service: unreachable".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_maps_to_status_label() {
        let health = HealthResponse {
            status: Some("healthy".into()),
            model_loaded: Some(true),
            supported_classes: vec!["Sedan".into(), "SUV".into()],
            ..Default::default()
        };
        let status = ServiceStatus::from_health(Some(&health));
        assert_eq!(status.label(), "Service: online (2 classes)");

        let unloaded = HealthResponse {
            model_loaded: Some(false),
            ..Default::default()
        };
        assert_eq!(
            ServiceStatus::from_health(Some(&unloaded)).label(),
            "Service: online, model not loaded"
        );
        assert_eq!(
            ServiceStatus::from_health(None),
            ServiceStatus::Unreachable
        );
    }
}

//! The upload lifecycle controller and the view capability it drives.
//!
//! The controller is synchronous and single-owner. Slow work (reading and
//! decoding the preview, the predict call, the health check) is handed back
//! to the caller as a job; the caller runs it wherever it likes and feeds
//! the completion back in. Completions that no longer match the current
//! session are dropped by the reducer.

use std::sync::Arc;

use shared::{
    domain::{FileId, Zone},
    protocol::HealthResponse,
};
use tracing::{debug, info, warn};

use crate::{
    error::UploadError,
    intake::{self, CandidateFile, SelectedFile},
    preview::{self, Preview},
    reducer::{self, Effect, LifecycleEvent, LifecycleState},
    render::{render_result, ResultView},
    transport::ClassificationService,
    types::PredictionResult,
};

/// What the controller needs from a UI. Adapters are expected to be fully
/// bound; missing elements are their problem at construction time.
pub trait View {
    /// Hide every zone, then show `zone`.
    fn show_zone(&mut self, zone: Zone);
    fn set_preview(&mut self, preview: &Preview);
    fn clear_preview(&mut self);
    fn render_result(&mut self, result: &ResultView);
    fn set_error_message(&mut self, message: &str);
    fn clear_file_input(&mut self);
    fn set_drag_highlight(&mut self, active: bool);
}

pub struct UploadLifecycleController<V: View> {
    view: V,
    service: Arc<dyn ClassificationService>,
    state: LifecycleState,
    next_file_id: u64,
}

impl<V: View> UploadLifecycleController<V> {
    pub fn new(mut view: V, service: Arc<dyn ClassificationService>) -> Self {
        view.show_zone(Zone::Upload);
        Self {
            view,
            service,
            state: LifecycleState::default(),
            next_file_id: 1,
        }
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn zone(&self) -> Zone {
        self.state.zone()
    }

    pub fn state(&self) -> &LifecycleState {
        &self.state
    }

    pub fn selected_file(&self) -> Option<&SelectedFile> {
        self.state.selected()
    }

    /// Best-effort liveness probe; never touches the lifecycle.
    pub fn health_job(&self) -> HealthJob {
        HealthJob {
            service: Arc::clone(&self.service),
        }
    }

    /// Validates `candidate`. On success it becomes the selected file and a
    /// decode job is returned; on failure the Error zone is shown.
    pub fn select_file(&mut self, candidate: CandidateFile) -> Option<DecodeJob> {
        debug!(
            name = %candidate.name,
            mime_type = %candidate.mime_type,
            size_bytes = candidate.size_bytes,
            "processing file"
        );
        let event = match intake::validate(&candidate) {
            Ok(()) => {
                let file_id = FileId(self.next_file_id);
                self.next_file_id += 1;
                LifecycleEvent::FileAccepted(SelectedFile::new(file_id, candidate))
            }
            Err(err) => {
                warn!(name = %candidate.name, kind = ?err.kind(), "rejected file: {err}");
                LifecycleEvent::FileRejected(err)
            }
        };
        self.dispatch(event).into_iter().find_map(|job| match job {
            Job::Decode(job) => Some(job),
            Job::Predict(_) => None,
        })
    }

    /// Shows the Error zone for a pick that never became a candidate, e.g.
    /// a path that could not be stat'ed.
    pub fn reject_file(&mut self, error: UploadError) {
        warn!(kind = ?error.kind(), "rejected file: {error}");
        self.dispatch(LifecycleEvent::FileRejected(error));
    }

    /// Convenience for drop events: clears the highlight, then intakes.
    pub fn drop_file(&mut self, candidate: CandidateFile) -> Option<DecodeJob> {
        self.drag_leave();
        self.select_file(candidate)
    }

    pub fn drag_over(&mut self) {
        self.dispatch(LifecycleEvent::DragOver);
    }

    pub fn drag_leave(&mut self) {
        self.dispatch(LifecycleEvent::DragLeave);
    }

    pub fn preview_finished(&mut self, completion: PreviewCompletion) {
        let event = match completion.outcome {
            Ok(preview) => LifecycleEvent::PreviewDecoded(preview),
            Err(error) => LifecycleEvent::PreviewFailed {
                file_id: completion.file_id,
                error,
            },
        };
        self.dispatch(event);
    }

    /// Starts classification of the selected file. Returns `None` when there
    /// is nothing to submit or a request is already in flight.
    pub fn confirm_classification(&mut self) -> Option<PredictJob> {
        self.dispatch(LifecycleEvent::ConfirmRequested)
            .into_iter()
            .find_map(|job| match job {
                Job::Predict(job) => Some(job),
                Job::Decode(_) => None,
            })
    }

    pub fn prediction_finished(&mut self, completion: PredictCompletion) {
        let event = match completion.outcome {
            Ok(result) => LifecycleEvent::PredictionSucceeded {
                file_id: completion.file_id,
                result,
            },
            Err(error) => LifecycleEvent::PredictionFailed {
                file_id: completion.file_id,
                error,
            },
        };
        self.dispatch(event);
    }

    pub fn start_over(&mut self) {
        self.dispatch(LifecycleEvent::StartOver);
    }

    fn dispatch(&mut self, event: LifecycleEvent) -> Vec<Job> {
        let effects = reducer::reduce(&mut self.state, event);
        let mut jobs = Vec::new();
        for effect in effects {
            match effect {
                Effect::Enter(zone) => self.enter(zone),
                Effect::DecodePreview(file) => jobs.push(Job::Decode(DecodeJob { file })),
                Effect::SubmitPrediction(file) => {
                    info!(file_id = %file.id, name = %file.name, "submitting image for classification");
                    jobs.push(Job::Predict(PredictJob {
                        file,
                        service: Arc::clone(&self.service),
                    }));
                }
                Effect::ClearFileInput => self.view.clear_file_input(),
                Effect::SetDragHighlight(active) => self.view.set_drag_highlight(active),
                Effect::Rejected(err) => warn!(kind = ?err.kind(), "{err}"),
                Effect::Ignored { event, file_id } => debug!(
                    event,
                    file_id = ?file_id,
                    zone = %self.state.zone(),
                    "ignoring event that no longer applies"
                ),
            }
        }
        jobs
    }

    fn enter(&mut self, zone: Zone) {
        match zone {
            Zone::Upload => self.view.clear_preview(),
            Zone::Preview => {
                if let Some(preview) = self.state.preview() {
                    self.view.set_preview(preview);
                }
            }
            Zone::Processing => {}
            Zone::Results => {
                if let Some(result) = self.state.result() {
                    let rendered = render_result(result);
                    debug!(
                        label = %rendered.label,
                        not_a_car = rendered.not_a_car,
                        "rendering classification result"
                    );
                    self.view.render_result(&rendered);
                }
            }
            Zone::Error => {
                if let Some(err) = self.state.error() {
                    self.view.set_error_message(&err.to_string());
                }
            }
        }
        debug!(zone = %zone, "entering zone");
        self.view.show_zone(zone);
    }
}

enum Job {
    Decode(DecodeJob),
    Predict(PredictJob),
}

/// Reads and decodes the selected file for the Preview zone.
#[derive(Debug)]
pub struct DecodeJob {
    file: SelectedFile,
}

impl DecodeJob {
    pub fn file_id(&self) -> FileId {
        self.file.id
    }

    pub fn file(&self) -> &SelectedFile {
        &self.file
    }

    /// Blocking.
    pub fn run(self) -> PreviewCompletion {
        let outcome = preview::decode_preview(&self.file);
        if let Err(err) = &outcome {
            warn!(file_id = %self.file.id, "error reading file: {err:?}");
        }
        PreviewCompletion {
            file_id: self.file.id,
            outcome,
        }
    }
}

#[derive(Debug)]
pub struct PreviewCompletion {
    pub file_id: FileId,
    pub outcome: Result<Preview, UploadError>,
}

/// The single in-flight predict call of a lifecycle.
pub struct PredictJob {
    file: SelectedFile,
    service: Arc<dyn ClassificationService>,
}

impl PredictJob {
    pub fn file_id(&self) -> FileId {
        self.file.id
    }

    pub fn file(&self) -> &SelectedFile {
        &self.file
    }

    pub async fn run(self) -> PredictCompletion {
        let outcome = self.service.predict(&self.file).await;
        match &outcome {
            Ok(result) => info!(
                file_id = %self.file.id,
                predicted_class = %result.predicted_class,
                confidence = result.confidence,
                "classification finished"
            ),
            Err(err) => warn!(file_id = %self.file.id, kind = ?err.kind(), "classification error: {err}"),
        }
        PredictCompletion {
            file_id: self.file.id,
            outcome,
        }
    }
}

#[derive(Debug)]
pub struct PredictCompletion {
    pub file_id: FileId,
    pub outcome: Result<PredictionResult, UploadError>,
}

pub struct HealthJob {
    service: Arc<dyn ClassificationService>,
}

impl HealthJob {
    /// Failures are logged and swallowed.
    pub async fn run(self) -> Option<HealthResponse> {
        match self.service.health().await {
            Ok(health) => {
                info!(
                    status = health.status.as_deref().unwrap_or("unknown"),
                    model_loaded = ?health.model_loaded,
                    supported_classes = health.supported_classes.len(),
                    extra = %serde_json::Value::Object(health.extra.clone()),
                    "classification service health"
                );
                Some(health)
            }
            Err(err) => {
                warn!("classification service health check failed: {err:#}");
                None
            }
        }
    }
}

//! Zone state machine. `reduce` is a pure function of the current state and
//! one event; it returns the effects the controller has to carry out.

use shared::domain::{FileId, Zone};

use crate::{
    error::UploadError, intake::SelectedFile, preview::Preview, types::PredictionResult,
};

#[derive(Debug, Clone, Default)]
pub struct LifecycleState {
    zone: Zone,
    selected: Option<SelectedFile>,
    awaiting_preview: Option<FileId>,
    preview: Option<Preview>,
    result: Option<PredictionResult>,
    error: Option<UploadError>,
    drag_active: bool,
}

impl LifecycleState {
    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn preview(&self) -> Option<&Preview> {
        self.preview.as_ref()
    }

    pub fn result(&self) -> Option<&PredictionResult> {
        self.result.as_ref()
    }

    pub fn error(&self) -> Option<&UploadError> {
        self.error.as_ref()
    }

    pub fn drag_active(&self) -> bool {
        self.drag_active
    }

    fn selected_id(&self) -> Option<FileId> {
        self.selected.as_ref().map(|file| file.id)
    }

    fn enter(&mut self, zone: Zone, effects: &mut Vec<Effect>) {
        self.zone = zone;
        effects.push(Effect::Enter(zone));
    }
}

#[derive(Debug)]
pub enum LifecycleEvent {
    /// A candidate passed validation and is now the selected file.
    FileAccepted(SelectedFile),
    FileRejected(UploadError),
    PreviewDecoded(Preview),
    PreviewFailed { file_id: FileId, error: UploadError },
    ConfirmRequested,
    PredictionSucceeded { file_id: FileId, result: PredictionResult },
    PredictionFailed { file_id: FileId, error: UploadError },
    StartOver,
    DragOver,
    DragLeave,
}

impl LifecycleEvent {
    pub fn name(&self) -> &'static str {
        match self {
            LifecycleEvent::FileAccepted(_) => "file_accepted",
            LifecycleEvent::FileRejected(_) => "file_rejected",
            LifecycleEvent::PreviewDecoded(_) => "preview_decoded",
            LifecycleEvent::PreviewFailed { .. } => "preview_failed",
            LifecycleEvent::ConfirmRequested => "confirm_requested",
            LifecycleEvent::PredictionSucceeded { .. } => "prediction_succeeded",
            LifecycleEvent::PredictionFailed { .. } => "prediction_failed",
            LifecycleEvent::StartOver => "start_over",
            LifecycleEvent::DragOver => "drag_over",
            LifecycleEvent::DragLeave => "drag_leave",
        }
    }
}

#[derive(Debug)]
pub enum Effect {
    /// Deactivate every zone, activate this one.
    Enter(Zone),
    DecodePreview(SelectedFile),
    SubmitPrediction(SelectedFile),
    ClearFileInput,
    SetDragHighlight(bool),
    /// The event was refused; zone unchanged.
    Rejected(UploadError),
    /// The event no longer applies (stale completion, wrong zone).
    Ignored {
        event: &'static str,
        file_id: Option<FileId>,
    },
}

pub fn reduce(state: &mut LifecycleState, event: LifecycleEvent) -> Vec<Effect> {
    let mut effects = Vec::new();
    let event_name = event.name();

    match event {
        LifecycleEvent::FileAccepted(file) => {
            state.awaiting_preview = Some(file.id);
            state.selected = Some(file.clone());
            state.preview = None;
            state.result = None;
            state.error = None;
            if state.zone != Zone::Upload {
                state.enter(Zone::Upload, &mut effects);
            }
            effects.push(Effect::DecodePreview(file));
        }
        LifecycleEvent::FileRejected(error) => {
            state.awaiting_preview = None;
            state.error = Some(error);
            state.enter(Zone::Error, &mut effects);
        }
        LifecycleEvent::PreviewDecoded(preview) => {
            if state.awaiting_preview == Some(preview.file_id)
                && state.selected_id() == Some(preview.file_id)
            {
                state.awaiting_preview = None;
                state.preview = Some(preview);
                state.enter(Zone::Preview, &mut effects);
            } else {
                effects.push(Effect::Ignored {
                    event: event_name,
                    file_id: Some(preview.file_id),
                });
            }
        }
        LifecycleEvent::PreviewFailed { file_id, error } => {
            if state.awaiting_preview == Some(file_id) && state.selected_id() == Some(file_id) {
                state.awaiting_preview = None;
                state.error = Some(error);
                state.enter(Zone::Error, &mut effects);
            } else {
                effects.push(Effect::Ignored {
                    event: event_name,
                    file_id: Some(file_id),
                });
            }
        }
        LifecycleEvent::ConfirmRequested => match state.selected.clone() {
            None => effects.push(Effect::Rejected(UploadError::NoFileSelected)),
            Some(file) if state.zone == Zone::Preview => {
                state.result = None;
                state.error = None;
                state.enter(Zone::Processing, &mut effects);
                effects.push(Effect::SubmitPrediction(file));
            }
            Some(file) => effects.push(Effect::Ignored {
                event: event_name,
                file_id: Some(file.id),
            }),
        },
        LifecycleEvent::PredictionSucceeded { file_id, result } => {
            if state.zone == Zone::Processing && state.selected_id() == Some(file_id) {
                state.result = Some(result);
                state.enter(Zone::Results, &mut effects);
            } else {
                effects.push(Effect::Ignored {
                    event: event_name,
                    file_id: Some(file_id),
                });
            }
        }
        LifecycleEvent::PredictionFailed { file_id, error } => {
            if state.zone == Zone::Processing && state.selected_id() == Some(file_id) {
                state.error = Some(error);
                state.enter(Zone::Error, &mut effects);
            } else {
                effects.push(Effect::Ignored {
                    event: event_name,
                    file_id: Some(file_id),
                });
            }
        }
        LifecycleEvent::StartOver => {
            state.selected = None;
            state.awaiting_preview = None;
            state.preview = None;
            state.result = None;
            state.error = None;
            effects.push(Effect::ClearFileInput);
            state.enter(Zone::Upload, &mut effects);
        }
        LifecycleEvent::DragOver => {
            if !state.drag_active {
                state.drag_active = true;
                effects.push(Effect::SetDragHighlight(true));
            }
        }
        LifecycleEvent::DragLeave => {
            if state.drag_active {
                state.drag_active = false;
                effects.push(Effect::SetDragHighlight(false));
            }
        }
    }

    effects
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        intake::{CandidateFile, FileSource},
        preview::PreviewImage,
    };

    fn file(id: u64) -> SelectedFile {
        SelectedFile::new(
            FileId(id),
            CandidateFile {
                name: format!("car-{id}.png"),
                mime_type: "image/png".into(),
                size_bytes: 3,
                source: FileSource::Memory(Arc::from(vec![1u8, 2, 3])),
            },
        )
    }

    fn preview(id: u64) -> Preview {
        Preview {
            file_id: FileId(id),
            file_name: format!("car-{id}.png"),
            data_url: "data:image/png;base64,AQID".into(),
            thumbnail: Some(PreviewImage {
                width: 1,
                height: 1,
                rgba: vec![0, 0, 0, 255],
            }),
        }
    }

    fn prediction() -> PredictionResult {
        PredictionResult {
            predicted_class: "Sedan".into(),
            confidence: 0.9,
            ood_probability: None,
            class_probabilities: None,
            all_probabilities: None,
        }
    }

    fn entered(effects: &[Effect]) -> Vec<Zone> {
        effects
            .iter()
            .filter_map(|effect| match effect {
                Effect::Enter(zone) => Some(*zone),
                _ => None,
            })
            .collect()
    }

    fn in_preview(id: u64) -> LifecycleState {
        let mut state = LifecycleState::default();
        reduce(&mut state, LifecycleEvent::FileAccepted(file(id)));
        reduce(&mut state, LifecycleEvent::PreviewDecoded(preview(id)));
        state
    }

    #[test]
    fn accepted_file_requests_decode_then_enters_preview() {
        let mut state = LifecycleState::default();
        let effects = reduce(&mut state, LifecycleEvent::FileAccepted(file(1)));
        assert_eq!(state.zone(), Zone::Upload);
        assert!(matches!(effects.as_slice(), [Effect::DecodePreview(f)] if f.id == FileId(1)));

        let effects = reduce(&mut state, LifecycleEvent::PreviewDecoded(preview(1)));
        assert_eq!(entered(&effects), vec![Zone::Preview]);
        assert_eq!(state.zone(), Zone::Preview);
        assert!(state.preview().is_some());
    }

    #[test]
    fn confirm_enters_processing_and_submits_once() {
        let mut state = in_preview(1);
        let effects = reduce(&mut state, LifecycleEvent::ConfirmRequested);
        assert_eq!(entered(&effects), vec![Zone::Processing]);
        assert!(effects
            .iter()
            .any(|effect| matches!(effect, Effect::SubmitPrediction(f) if f.id == FileId(1))));

        let again = reduce(&mut state, LifecycleEvent::ConfirmRequested);
        assert!(matches!(again.as_slice(), [Effect::Ignored { .. }]));
        assert_eq!(state.zone(), Zone::Processing);
    }

    #[test]
    fn confirm_without_file_is_rejected_and_zone_unchanged() {
        let mut state = LifecycleState::default();
        let effects = reduce(&mut state, LifecycleEvent::ConfirmRequested);
        assert!(matches!(
            effects.as_slice(),
            [Effect::Rejected(UploadError::NoFileSelected)]
        ));
        assert_eq!(state.zone(), Zone::Upload);
    }

    #[test]
    fn prediction_success_enters_results_with_result() {
        let mut state = in_preview(4);
        reduce(&mut state, LifecycleEvent::ConfirmRequested);
        let effects = reduce(
            &mut state,
            LifecycleEvent::PredictionSucceeded {
                file_id: FileId(4),
                result: prediction(),
            },
        );
        assert_eq!(entered(&effects), vec![Zone::Results]);
        assert!(state.result().is_some());
    }

    #[test]
    fn prediction_failure_enters_error() {
        let mut state = in_preview(4);
        reduce(&mut state, LifecycleEvent::ConfirmRequested);
        reduce(
            &mut state,
            LifecycleEvent::PredictionFailed {
                file_id: FileId(4),
                error: UploadError::NetworkFailure("connection refused".into()),
            },
        );
        assert_eq!(state.zone(), Zone::Error);
        assert_eq!(
            state.error().map(UploadError::kind),
            Some(crate::error::ErrorKind::NetworkFailure)
        );
    }

    #[test]
    fn late_prediction_after_start_over_is_ignored() {
        let mut state = in_preview(7);
        reduce(&mut state, LifecycleEvent::ConfirmRequested);
        reduce(&mut state, LifecycleEvent::StartOver);

        let effects = reduce(
            &mut state,
            LifecycleEvent::PredictionSucceeded {
                file_id: FileId(7),
                result: prediction(),
            },
        );
        assert!(matches!(effects.as_slice(), [Effect::Ignored { .. }]));
        assert_eq!(state.zone(), Zone::Upload);
        assert!(state.result().is_none());
    }

    #[test]
    fn late_prediction_for_replaced_file_is_ignored() {
        let mut state = in_preview(1);
        reduce(&mut state, LifecycleEvent::ConfirmRequested);
        reduce(&mut state, LifecycleEvent::StartOver);
        reduce(&mut state, LifecycleEvent::FileAccepted(file(2)));
        reduce(&mut state, LifecycleEvent::PreviewDecoded(preview(2)));
        reduce(&mut state, LifecycleEvent::ConfirmRequested);

        let effects = reduce(
            &mut state,
            LifecycleEvent::PredictionFailed {
                file_id: FileId(1),
                error: UploadError::ClassificationFailed("old".into()),
            },
        );
        assert!(matches!(effects.as_slice(), [Effect::Ignored { .. }]));
        assert_eq!(state.zone(), Zone::Processing);
    }

    #[test]
    fn stale_preview_for_superseded_file_is_ignored() {
        let mut state = LifecycleState::default();
        reduce(&mut state, LifecycleEvent::FileAccepted(file(1)));
        reduce(&mut state, LifecycleEvent::FileAccepted(file(2)));

        let effects = reduce(&mut state, LifecycleEvent::PreviewDecoded(preview(1)));
        assert!(matches!(effects.as_slice(), [Effect::Ignored { .. }]));
        assert_eq!(state.zone(), Zone::Upload);

        reduce(&mut state, LifecycleEvent::PreviewDecoded(preview(2)));
        assert_eq!(state.zone(), Zone::Preview);
    }

    #[test]
    fn rejection_keeps_previous_selection() {
        let mut state = in_preview(3);
        reduce(
            &mut state,
            LifecycleEvent::FileRejected(UploadError::InvalidType {
                mime_type: "text/plain".into(),
            }),
        );
        assert_eq!(state.zone(), Zone::Error);
        assert_eq!(state.selected().map(|f| f.id), Some(FileId(3)));
    }

    #[test]
    fn preview_failure_enters_error() {
        let mut state = LifecycleState::default();
        reduce(&mut state, LifecycleEvent::FileAccepted(file(5)));
        reduce(
            &mut state,
            LifecycleEvent::PreviewFailed {
                file_id: FileId(5),
                error: UploadError::unreadable("truncated"),
            },
        );
        assert_eq!(state.zone(), Zone::Error);
    }

    #[test]
    fn new_file_from_results_discards_result() {
        let mut state = in_preview(1);
        reduce(&mut state, LifecycleEvent::ConfirmRequested);
        reduce(
            &mut state,
            LifecycleEvent::PredictionSucceeded {
                file_id: FileId(1),
                result: prediction(),
            },
        );

        let effects = reduce(&mut state, LifecycleEvent::FileAccepted(file(2)));
        assert_eq!(entered(&effects), vec![Zone::Upload]);
        assert!(state.result().is_none());
        assert!(state.preview().is_none());
    }

    #[test]
    fn start_over_clears_everything_from_any_zone() {
        for setup in [Zone::Preview, Zone::Processing, Zone::Error] {
            let mut state = in_preview(9);
            match setup {
                Zone::Processing => {
                    reduce(&mut state, LifecycleEvent::ConfirmRequested);
                }
                Zone::Error => {
                    reduce(
                        &mut state,
                        LifecycleEvent::FileRejected(UploadError::TooLarge { size_bytes: 1 }),
                    );
                }
                _ => {}
            }
            let effects = reduce(&mut state, LifecycleEvent::StartOver);
            assert!(matches!(effects.first(), Some(Effect::ClearFileInput)));
            assert_eq!(entered(&effects), vec![Zone::Upload]);
            assert!(state.selected().is_none());
            assert!(state.preview().is_none());
            assert!(state.error().is_none());
        }
    }

    #[test]
    fn drag_highlight_toggles_once() {
        let mut state = LifecycleState::default();
        assert_eq!(reduce(&mut state, LifecycleEvent::DragOver).len(), 1);
        assert!(reduce(&mut state, LifecycleEvent::DragOver).is_empty());
        assert!(matches!(
            reduce(&mut state, LifecycleEvent::DragLeave).as_slice(),
            [Effect::SetDragHighlight(false)]
        ));
    }
}

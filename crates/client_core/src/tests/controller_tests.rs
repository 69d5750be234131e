use std::{
    collections::VecDeque,
    io::Cursor,
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use image::{ImageFormat, Rgba, RgbaImage};
use shared::{
    domain::Zone,
    protocol::{ClassesResponse, HealthResponse, Probabilities},
};

use crate::{
    intake::FileSource, CandidateFile, ClassificationService, PredictionResult, Preview, ResultView, SelectedFile,
    UploadError, UploadLifecycleController, View, MAX_UPLOAD_BYTES,
};

#[derive(Default)]
struct RecordingView {
    visible: Option<Zone>,
    shown: Vec<Zone>,
    preview: Option<String>,
    rendered: Vec<ResultView>,
    error_message: Option<String>,
    file_input_clears: usize,
    highlight: bool,
}

impl View for RecordingView {
    fn show_zone(&mut self, zone: Zone) {
        self.visible = Some(zone);
        self.shown.push(zone);
    }

    fn set_preview(&mut self, preview: &Preview) {
        self.preview = Some(preview.data_url.clone());
    }

    fn clear_preview(&mut self) {
        self.preview = None;
    }

    fn render_result(&mut self, result: &ResultView) {
        self.rendered.push(result.clone());
    }

    fn set_error_message(&mut self, message: &str) {
        self.error_message = Some(message.to_string());
    }

    fn clear_file_input(&mut self) {
        self.file_input_clears += 1;
    }

    fn set_drag_highlight(&mut self, active: bool) {
        self.highlight = active;
    }
}

/// Hands out queued predict outcomes in order.
#[derive(Default)]
struct ScriptedService {
    outcomes: Mutex<VecDeque<Result<PredictionResult, UploadError>>>,
    submitted: Mutex<Vec<String>>,
}

impl ScriptedService {
    fn with(outcomes: Vec<Result<PredictionResult, UploadError>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            submitted: Mutex::new(Vec::new()),
        })
    }

    fn submitted(&self) -> Vec<String> {
        self.submitted.lock().expect("submitted lock").clone()
    }
}

#[async_trait]
impl ClassificationService for ScriptedService {
    async fn health(&self) -> Result<HealthResponse> {
        Err(anyhow!("health is not scripted"))
    }

    async fn predict(&self, file: &SelectedFile) -> Result<PredictionResult, UploadError> {
        self.submitted
            .lock()
            .expect("submitted lock")
            .push(file.name.clone());
        self.outcomes
            .lock()
            .expect("outcomes lock")
            .pop_front()
            .unwrap_or_else(|| Err(UploadError::NetworkFailure("no scripted outcome".into())))
    }

    async fn classes(&self) -> Result<ClassesResponse> {
        Ok(ClassesResponse::default())
    }
}

fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, Rgba([90, 90, 90, 255]));
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

fn png_candidate(name: &str) -> CandidateFile {
    CandidateFile::from_bytes(name, "image/png", png_bytes(6, 4))
}

fn sedan() -> PredictionResult {
    PredictionResult {
        predicted_class: "Sedan".into(),
        confidence: 0.87,
        ood_probability: Some(0.9),
        class_probabilities: Some(
            [("Truck", 0.03), ("Sedan", 0.87), ("SUV", 0.10)]
                .into_iter()
                .collect::<Probabilities>(),
        ),
        all_probabilities: None,
    }
}

fn controller(
    service: Arc<ScriptedService>,
) -> UploadLifecycleController<RecordingView> {
    UploadLifecycleController::new(RecordingView::default(), service)
}

/// Selects `candidate` and runs its decode inline.
fn select_and_decode(
    controller: &mut UploadLifecycleController<RecordingView>,
    candidate: CandidateFile,
) {
    let job = controller.select_file(candidate).expect("decode job");
    let completion = job.run();
    controller.preview_finished(completion);
}

#[test]
fn starts_in_upload_zone() {
    let controller = controller(ScriptedService::with(Vec::new()));
    assert_eq!(controller.zone(), Zone::Upload);
    assert_eq!(controller.view().visible, Some(Zone::Upload));
    assert!(controller.selected_file().is_none());
}

#[test]
fn non_image_is_rejected_into_error_zone() {
    let mut controller = controller(ScriptedService::with(Vec::new()));
    let job = controller.select_file(CandidateFile::from_bytes(
        "notes.txt",
        "text/plain",
        b"hello".to_vec(),
    ));

    assert!(job.is_none());
    assert_eq!(controller.zone(), Zone::Error);
    assert_eq!(
        controller.view().error_message.as_deref(),
        Some("Please select a valid image file.")
    );
    assert!(controller.selected_file().is_none());
}

#[test]
fn oversized_image_is_rejected() {
    let mut controller = controller(ScriptedService::with(Vec::new()));
    let mut candidate = png_candidate("huge.png");
    candidate.size_bytes = MAX_UPLOAD_BYTES + 1;

    assert!(controller.select_file(candidate).is_none());
    assert_eq!(controller.zone(), Zone::Error);
    assert_eq!(
        controller.view().error_message.as_deref(),
        Some("File too large. Please select an image under 10MB.")
    );
}

#[test]
fn image_at_exact_limit_is_accepted() {
    let mut controller = controller(ScriptedService::with(Vec::new()));
    let mut candidate = png_candidate("limit.png");
    candidate.size_bytes = MAX_UPLOAD_BYTES;

    assert!(controller.select_file(candidate).is_some());
    assert_eq!(controller.zone(), Zone::Upload);
    assert!(controller.selected_file().is_some());
}

#[test]
fn valid_image_moves_to_preview_with_data_url() {
    let mut controller = controller(ScriptedService::with(Vec::new()));
    select_and_decode(&mut controller, png_candidate("car.png"));

    assert_eq!(controller.zone(), Zone::Preview);
    let preview = controller.view().preview.clone().expect("preview set");
    assert!(preview.starts_with("data:image/png;base64,"));
    assert_eq!(
        controller.selected_file().map(|file| file.name.as_str()),
        Some("car.png")
    );
}

#[test]
fn undecodable_image_format_still_reaches_preview() {
    let service = ScriptedService::with(vec![Ok(sedan())]);
    let mut controller = controller(Arc::clone(&service));
    let tiff = vec![0x49, 0x49, 0x2a, 0x00, 0x08, 0x00, 0x00, 0x00, 0x00, 0x00];
    select_and_decode(&mut controller, CandidateFile::from_bytes("scan.tiff", "image/tiff", tiff));

    assert_eq!(controller.zone(), Zone::Preview);
    assert!(controller.view().error_message.is_none());
    assert!(controller
        .view()
        .preview
        .as_deref()
        .is_some_and(|url| url.starts_with("data:image/tiff;base64,")));
    assert!(controller.confirm_classification().is_some());
    assert_eq!(controller.zone(), Zone::Processing);
}

#[test]
fn unreadable_file_shows_read_error() {
    let missing = std::env::temp_dir().join("car-classifier-vanished-upload.png");
    let _ = std::fs::remove_file(&missing);
    let mut controller = controller(ScriptedService::with(Vec::new()));
    select_and_decode(
        &mut controller,
        CandidateFile {
            name: "vanished.png".into(),
            mime_type: "image/png".into(),
            size_bytes: 128,
            source: FileSource::Disk(missing),
        },
    );

    assert_eq!(controller.zone(), Zone::Error);
    assert_eq!(
        controller.view().error_message.as_deref(),
        Some("Error reading the selected file")
    );
}

#[test]
fn stale_decode_for_replaced_file_is_ignored() {
    let mut controller = controller(ScriptedService::with(Vec::new()));
    let first = controller
        .select_file(png_candidate("first.png"))
        .expect("first job");
    select_and_decode(&mut controller, png_candidate("second.png"));

    controller.preview_finished(first.run());
    assert_eq!(controller.zone(), Zone::Preview);
    assert_eq!(
        controller.selected_file().map(|file| file.name.as_str()),
        Some("second.png")
    );
}

#[test]
fn confirm_without_file_does_nothing() {
    let service = ScriptedService::with(Vec::new());
    let mut controller = controller(Arc::clone(&service));

    assert!(controller.confirm_classification().is_none());
    assert_eq!(controller.zone(), Zone::Upload);
    assert_eq!(controller.view().shown, vec![Zone::Upload]);
    assert!(service.submitted().is_empty());
}

#[tokio::test]
async fn classifies_sedan_and_renders_breakdown() {
    let service = ScriptedService::with(vec![Ok(sedan())]);
    let mut controller = controller(Arc::clone(&service));
    select_and_decode(&mut controller, png_candidate("car.png"));

    let job = controller.confirm_classification().expect("predict job");
    assert_eq!(controller.zone(), Zone::Processing);
    assert!(controller.confirm_classification().is_none());

    controller.prediction_finished(job.run().await);

    assert_eq!(controller.zone(), Zone::Results);
    assert_eq!(service.submitted(), vec!["car.png"]);
    let rendered = controller.view().rendered.last().expect("rendered");
    assert_eq!(rendered.label, "Sedan");
    assert_eq!(rendered.confidence_text, "87.0% confidence");
    assert!(!rendered.not_a_car);
    let rows = rendered.probabilities.as_ref().expect("breakdown shown");
    let labels: Vec<&str> = rows.iter().map(|row| row.label.as_str()).collect();
    assert_eq!(labels, vec!["Sedan", "SUV", "Truck"]);
    assert_eq!(rows[0].percent_text, "87.0%");
}

#[tokio::test]
async fn not_a_car_hides_breakdown() {
    let mut result = sedan();
    result.predicted_class = "Not a Car".into();
    result.confidence = 0.95;
    let mut controller = controller(ScriptedService::with(vec![Ok(result)]));
    select_and_decode(&mut controller, png_candidate("cat.png"));

    let job = controller.confirm_classification().expect("predict job");
    controller.prediction_finished(job.run().await);

    let rendered = controller.view().rendered.last().expect("rendered");
    assert_eq!(rendered.label, "Not a Car");
    assert_eq!(rendered.confidence_text, "95.0% confidence");
    assert!(rendered.not_a_car);
    assert!(!rendered.shows_probabilities());
}

#[tokio::test]
async fn low_ood_probability_hides_breakdown() {
    let mut result = sedan();
    result.ood_probability = Some(0.3);
    let mut controller = controller(ScriptedService::with(vec![Ok(result)]));
    select_and_decode(&mut controller, png_candidate("blurry.png"));

    let job = controller.confirm_classification().expect("predict job");
    controller.prediction_finished(job.run().await);

    let rendered = controller.view().rendered.last().expect("rendered");
    assert_eq!(rendered.label, "Sedan");
    assert!(!rendered.shows_probabilities());
}

#[tokio::test]
async fn service_failure_shows_message() {
    let mut controller = controller(ScriptedService::with(vec![Err(
        UploadError::ClassificationFailed("Image is too dark".into()),
    )]));
    select_and_decode(&mut controller, png_candidate("dark.png"));

    let job = controller.confirm_classification().expect("predict job");
    controller.prediction_finished(job.run().await);

    assert_eq!(controller.zone(), Zone::Error);
    assert_eq!(
        controller.view().error_message.as_deref(),
        Some("Classification failed: Image is too dark")
    );
}

#[tokio::test]
async fn start_over_clears_selection_and_file_input() {
    let mut controller = controller(ScriptedService::with(vec![Ok(sedan())]));
    select_and_decode(&mut controller, png_candidate("car.png"));
    let job = controller.confirm_classification().expect("predict job");
    controller.prediction_finished(job.run().await);

    controller.start_over();

    assert_eq!(controller.zone(), Zone::Upload);
    assert!(controller.selected_file().is_none());
    assert!(controller.state().result().is_none());
    assert_eq!(controller.view().file_input_clears, 1);
    assert!(controller.view().preview.is_none());
    assert!(controller.confirm_classification().is_none());
}

#[tokio::test]
async fn late_response_after_start_over_is_ignored() {
    let mut controller = controller(ScriptedService::with(vec![Ok(sedan())]));
    select_and_decode(&mut controller, png_candidate("car.png"));
    let job = controller.confirm_classification().expect("predict job");

    controller.start_over();
    controller.prediction_finished(job.run().await);

    assert_eq!(controller.zone(), Zone::Upload);
    assert!(controller.view().rendered.is_empty());
    assert_eq!(controller.view().visible, Some(Zone::Upload));
}

#[tokio::test]
async fn late_response_for_previous_file_is_ignored() {
    let service = ScriptedService::with(vec![Ok(sedan())]);
    let mut controller = controller(Arc::clone(&service));
    select_and_decode(&mut controller, png_candidate("old.png"));
    let stale = controller.confirm_classification().expect("predict job");

    select_and_decode(&mut controller, png_candidate("new.png"));
    controller.prediction_finished(stale.run().await);

    assert_eq!(controller.zone(), Zone::Preview);
    assert!(controller.view().rendered.is_empty());
}

#[test]
fn every_transition_shows_exactly_one_zone() {
    let mut controller = controller(ScriptedService::with(Vec::new()));
    select_and_decode(&mut controller, png_candidate("car.png"));
    controller.start_over();
    let _ = controller.select_file(CandidateFile::from_bytes(
        "doc.pdf",
        "application/pdf",
        b"%PDF".to_vec(),
    ));

    assert_eq!(
        controller.view().shown,
        vec![Zone::Upload, Zone::Preview, Zone::Upload, Zone::Error]
    );
    assert_eq!(controller.view().visible, Some(controller.zone()));
}

#[test]
fn drag_highlight_follows_pointer_and_clears_on_drop() {
    let mut controller = controller(ScriptedService::with(Vec::new()));
    controller.drag_over();
    assert!(controller.view().highlight);
    controller.drag_leave();
    assert!(!controller.view().highlight);

    controller.drag_over();
    let job = controller.drop_file(png_candidate("dropped.png"));
    assert!(job.is_some());
    assert!(!controller.view().highlight);
}

#[test]
fn unopenable_pick_shows_read_error() {
    let mut controller = controller(ScriptedService::with(Vec::new()));
    controller.reject_file(UploadError::unreadable("permission denied"));

    assert_eq!(controller.zone(), Zone::Error);
    assert_eq!(
        controller.view().error_message.as_deref(),
        Some("Error reading the selected file")
    );
}

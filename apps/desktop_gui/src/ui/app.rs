use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use client_core::{
    intake::guess_mime_type, CandidateFile, ClassificationService, UploadError,
    UploadLifecycleController,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::Zone;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{ServiceStatus, UiEvent};
use crate::controller::orchestration::dispatch_backend_command;
use crate::ui::{
    view::EguiView,
    zones::{self, UiAction},
};

const IMAGE_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "webp", "bmp", "tif", "tiff", "avif", "heic", "svg",
];

#[derive(Debug, Clone)]
pub struct StartupConfig {
    pub server_label: String,
    pub health_check_on_startup: bool,
}

pub struct ClassifierApp {
    controller: UploadLifecycleController<EguiView>,
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    server_label: String,
    service_status: ServiceStatus,
    status: Option<String>,
    hovering_files: bool,
    last_dir: Option<PathBuf>,
}

impl ClassifierApp {
    pub fn new(
        service: Arc<dyn ClassificationService>,
        startup: StartupConfig,
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
    ) -> Self {
        let mut app = Self {
            controller: UploadLifecycleController::new(EguiView::default(), service),
            cmd_tx,
            ui_rx,
            server_label: startup.server_label,
            service_status: ServiceStatus::Unknown,
            status: None,
            hovering_files: false,
            last_dir: default_dialog_dir(),
        };
        if startup.health_check_on_startup {
            app.service_status = ServiceStatus::Checking;
            let job = app.controller.health_job();
            app.dispatch(BackendCommand::CheckHealth(job));
        }
        app
    }

    fn dispatch(&mut self, cmd: BackendCommand) {
        if let Some(event) = dispatch_backend_command(&self.cmd_tx, cmd, &mut self.status) {
            self.apply_ui_event(event);
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            self.apply_ui_event(event);
        }
    }

    fn apply_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::PreviewReady(completion) => self.controller.preview_finished(completion),
            UiEvent::PredictionReady(completion) => {
                self.controller.prediction_finished(completion)
            }
            UiEvent::HealthChecked(health) => {
                self.service_status = ServiceStatus::from_health(health.as_ref());
            }
            UiEvent::BackendFailed(message) => {
                tracing::error!("{message}");
                self.status = Some(message);
            }
        }
    }

    fn intake(&mut self, candidate: Result<CandidateFile, UploadError>, dropped: bool) {
        let candidate = match candidate {
            Ok(candidate) => candidate,
            Err(err) => {
                self.controller.drag_leave();
                self.controller.reject_file(err);
                return;
            }
        };
        let job = if dropped {
            self.controller.drop_file(candidate)
        } else {
            self.controller.select_file(candidate)
        };
        if let Some(job) = job {
            self.dispatch(BackendCommand::DecodePreview(job));
        }
    }

    fn browse(&mut self) {
        let mut dialog = rfd::FileDialog::new()
            .set_title("Choose a car image")
            .add_filter("Images", IMAGE_EXTENSIONS)
            .add_filter("All files", &["*"]);
        if let Some(dir) = &self.last_dir {
            dialog = dialog.set_directory(dir);
        }
        let Some(path) = dialog.pick_file() else {
            tracing::debug!("file dialog dismissed");
            return;
        };
        self.last_dir = path.parent().map(Path::to_path_buf);
        self.intake(CandidateFile::from_path(&path), false);
    }

    fn handle_file_drag(&mut self, ctx: &egui::Context) {
        let (hovering, dropped) = ctx.input(|i| {
            (
                !i.raw.hovered_files.is_empty(),
                i.raw.dropped_files.first().cloned(),
            )
        });

        if let Some(file) = dropped {
            self.hovering_files = false;
            self.intake(candidate_from_dropped(&file), true);
            return;
        }
        if hovering != self.hovering_files {
            self.hovering_files = hovering;
            if hovering {
                self.controller.drag_over();
            } else {
                self.controller.drag_leave();
            }
        }
    }

    fn apply_action(&mut self, action: UiAction) {
        tracing::debug!(?action, zone = %self.controller.zone(), "ui action");
        match action {
            UiAction::Browse => self.browse(),
            UiAction::Confirm => {
                if let Some(job) = self.controller.confirm_classification() {
                    self.dispatch(BackendCommand::Predict(job));
                }
            }
            UiAction::StartOver => self.controller.start_over(),
        }
    }

    fn show_top_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.heading("Car Classifier");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(egui::RichText::new(self.service_status.label()).small())
                        .on_hover_text(&self.server_label);
                });
            });
        });
    }

    fn show_status_banner(&mut self, ctx: &egui::Context) {
        let Some(message) = self.status.clone() else {
            return;
        };
        egui::TopBottomPanel::bottom("status_banner").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.label(egui::RichText::new(&message).color(ui.visuals().warn_fg_color));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Dismiss").clicked() {
                        self.status = None;
                    }
                });
            });
        });
    }
}

fn default_dialog_dir() -> Option<PathBuf> {
    dirs::picture_dir()
        .or_else(dirs::desktop_dir)
        .or_else(dirs::download_dir)
        .or_else(dirs::document_dir)
        .or_else(dirs::home_dir)
}

/// Dropped files arrive with bytes on web and with a path on native.
pub fn candidate_from_dropped(file: &egui::DroppedFile) -> Result<CandidateFile, UploadError> {
    if let Some(bytes) = &file.bytes {
        let mime_type = if file.mime.is_empty() {
            guess_mime_type(&file.name)
        } else {
            file.mime.clone()
        };
        return Ok(CandidateFile::from_bytes(
            file.name.clone(),
            mime_type,
            Arc::clone(bytes),
        ));
    }
    match &file.path {
        Some(path) => CandidateFile::from_path(path),
        None => Err(UploadError::unreadable(format!(
            "dropped file '{}' has neither bytes nor a path",
            file.name
        ))),
    }
}

impl eframe::App for ClassifierApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.handle_file_drag(ctx);

        self.show_top_bar(ctx);
        self.show_status_banner(ctx);

        let mut action = None;
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(16.0);
            egui::ScrollArea::vertical().show(ui, |ui| {
                action = zones::show(ui, self.controller.view_mut());
            });
        });
        if let Some(action) = action {
            self.apply_action(action);
        }

        if self.controller.zone() == Zone::Processing {
            ctx.request_repaint_after(Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

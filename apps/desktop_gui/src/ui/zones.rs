//! Painters for the five zones. Exactly one runs per frame.

use client_core::{ResultView, MAX_UPLOAD_BYTES};
use eframe::egui;
use shared::domain::Zone;

use crate::ui::view::EguiView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiAction {
    Browse,
    Confirm,
    StartOver,
}

const PREVIEW_MAX_SIZE: f32 = 420.0;
const RESULT_IMAGE_MAX_SIZE: f32 = 220.0;

pub fn show(ui: &mut egui::Ui, view: &mut EguiView) -> Option<UiAction> {
    match view.zone() {
        Zone::Upload => upload_zone(ui, view),
        Zone::Preview => preview_zone(ui, view),
        Zone::Processing => {
            processing_zone(ui, view);
            None
        }
        Zone::Results => results_zone(ui, view),
        Zone::Error => error_zone(ui, view),
    }
}

fn upload_zone(ui: &mut egui::Ui, view: &EguiView) -> Option<UiAction> {
    let visuals = ui.visuals().clone();
    let (fill, stroke) = if view.drag_highlight() {
        (
            visuals.selection.bg_fill.gamma_multiply(0.25),
            egui::Stroke::new(2.0, visuals.selection.stroke.color),
        )
    } else {
        (
            visuals.faint_bg_color,
            egui::Stroke::new(1.0, visuals.widgets.noninteractive.bg_stroke.color),
        )
    };

    let response = egui::Frame::NONE
        .fill(fill)
        .stroke(stroke)
        .corner_radius(12.0)
        .inner_margin(egui::Margin::symmetric(24, 56))
        .show(ui, |ui| {
            ui.set_min_width(ui.available_width());
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new("Drop a car image here").size(20.0).strong());
                ui.label("or click to browse");
                ui.add_space(8.0);
                ui.small(
                    egui::RichText::new(format!(
                        "Any image file, up to {} MB",
                        MAX_UPLOAD_BYTES / (1024 * 1024)
                    ))
                    .weak(),
                );
                if let Some(name) = view.picked_name() {
                    ui.small(format!("Last selected: {name}"));
                }
            });
        })
        .response
        .interact(egui::Sense::click())
        .on_hover_cursor(egui::CursorIcon::PointingHand);

    response.clicked().then_some(UiAction::Browse)
}

fn preview_image(ui: &mut egui::Ui, view: &mut EguiView, max: f32) {
    let ctx = ui.ctx().clone();
    if let Some((texture, size)) = view.preview_texture(&ctx) {
        ui.add(egui::Image::new((texture, size)).max_size(egui::vec2(max, max)));
        return;
    }
    if view.preview_name().is_none() {
        return;
    }
    // Readable file in a format we can't draw locally.
    egui::Frame::NONE
        .fill(ui.visuals().faint_bg_color)
        .stroke(egui::Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color))
        .corner_radius(8.0)
        .inner_margin(egui::Margin::same(16))
        .show(ui, |ui| {
            ui.set_width((max * 0.6).min(ui.available_width()));
            ui.vertical_centered(|ui| {
                ui.label(egui::RichText::new("Preview not available").weak());
                ui.small("The file will still be sent for classification.");
            });
        });
}

fn preview_zone(ui: &mut egui::Ui, view: &mut EguiView) -> Option<UiAction> {
    let mut action = None;
    ui.vertical_centered(|ui| {
        preview_image(ui, view, PREVIEW_MAX_SIZE);
        if let Some(name) = view.preview_name() {
            ui.label(egui::RichText::new(name).weak());
        }
        ui.add_space(12.0);
        ui.horizontal(|ui| {
            if ui
                .add(egui::Button::new(egui::RichText::new("Classify").strong()))
                .clicked()
            {
                action = Some(UiAction::Confirm);
            }
            if ui.button("Choose a different image").clicked() {
                action = Some(UiAction::Browse);
            }
        });
    });
    action
}

fn processing_zone(ui: &mut egui::Ui, view: &mut EguiView) {
    ui.vertical_centered(|ui| {
        preview_image(ui, view, RESULT_IMAGE_MAX_SIZE);
        ui.add_space(16.0);
        ui.spinner();
        ui.label("Classifying...");
    });
}

fn results_zone(ui: &mut egui::Ui, view: &mut EguiView) -> Option<UiAction> {
    let mut action = None;
    ui.vertical_centered(|ui| {
        preview_image(ui, view, RESULT_IMAGE_MAX_SIZE);
        ui.add_space(12.0);
        if let Some(result) = view.result() {
            result_summary(ui, result);
        }
        ui.add_space(12.0);
        if ui.button("Classify another image").clicked() {
            action = Some(UiAction::StartOver);
        }
    });
    action
}

fn result_summary(ui: &mut egui::Ui, result: &ResultView) {
    let label_color = if result.not_a_car {
        ui.visuals().warn_fg_color
    } else {
        ui.visuals().strong_text_color()
    };
    ui.label(
        egui::RichText::new(&result.label)
            .size(24.0)
            .strong()
            .color(label_color),
    );
    ui.label(&result.confidence_text);
    if result.not_a_car {
        ui.label(egui::RichText::new("This image does not appear to contain a car.").weak());
    }

    let Some(rows) = &result.probabilities else {
        return;
    };
    ui.add_space(8.0);
    egui::Grid::new("probability-breakdown")
        .num_columns(2)
        .spacing([12.0, 6.0])
        .show(ui, |ui| {
            for row in rows {
                ui.label(&row.label);
                ui.add(
                    egui::ProgressBar::new(row.bar_fraction)
                        .desired_width(220.0)
                        .text(&row.percent_text),
                );
                ui.end_row();
            }
        });
}

fn error_zone(ui: &mut egui::Ui, view: &EguiView) -> Option<UiAction> {
    let mut action = None;
    ui.vertical_centered(|ui| {
        egui::Frame::NONE
            .fill(egui::Color32::from_rgb(111, 53, 53))
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
            .corner_radius(8.0)
            .inner_margin(egui::Margin::symmetric(16, 12))
            .show(ui, |ui| {
                ui.label(egui::RichText::new(view.error_message()).color(egui::Color32::WHITE));
            });
        ui.add_space(12.0);
        if ui.button("Try again").clicked() {
            action = Some(UiAction::StartOver);
        }
    });
    action
}

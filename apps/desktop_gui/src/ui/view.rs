//! [`View`] adapter over immediate-mode state. The controller writes here;
//! the zone painters read from here every frame.

use client_core::{Preview, PreviewImage, ResultView, View};
use eframe::egui;
use shared::domain::{FileId, Zone};

struct PreviewSlot {
    file_id: FileId,
    file_name: String,
    thumbnail: Option<PreviewImage>,
    /// Uploaded on first paint.
    texture: Option<egui::TextureHandle>,
}

#[derive(Default)]
pub struct EguiView {
    zone: Zone,
    preview: Option<PreviewSlot>,
    result: Option<ResultView>,
    error_message: String,
    drag_highlight: bool,
    picked_name: Option<String>,
}

impl EguiView {
    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn result(&self) -> Option<&ResultView> {
        self.result.as_ref()
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn drag_highlight(&self) -> bool {
        self.drag_highlight
    }

    /// Name shown next to the picker; cleared when the lifecycle restarts.
    pub fn picked_name(&self) -> Option<&str> {
        self.picked_name.as_deref()
    }

    pub fn preview_name(&self) -> Option<&str> {
        self.preview.as_ref().map(|slot| slot.file_name.as_str())
    }

    /// `None` when nothing is previewed or the file had no decodable
    /// thumbnail.
    pub fn preview_texture(&mut self, ctx: &egui::Context) -> Option<(egui::TextureId, egui::Vec2)> {
        let slot = self.preview.as_mut()?;
        let image = slot.thumbnail.as_ref()?;
        let size = egui::vec2(image.width as f32, image.height as f32);
        let texture = slot.texture.get_or_insert_with(|| {
            let color_image =
                egui::ColorImage::from_rgba_unmultiplied([image.width, image.height], &image.rgba);
            ctx.load_texture(
                format!("upload-preview:{}", slot.file_id),
                color_image,
                egui::TextureOptions::LINEAR,
            )
        });
        Some((texture.id(), size))
    }
}

impl View for EguiView {
    fn show_zone(&mut self, zone: Zone) {
        self.zone = zone;
    }

    fn set_preview(&mut self, preview: &Preview) {
        if self
            .preview
            .as_ref()
            .is_some_and(|slot| slot.file_id == preview.file_id)
        {
            return;
        }
        self.picked_name = Some(preview.file_name.clone());
        self.preview = Some(PreviewSlot {
            file_id: preview.file_id,
            file_name: preview.file_name.clone(),
            thumbnail: preview.thumbnail.clone(),
            texture: None,
        });
    }

    fn clear_preview(&mut self) {
        self.preview = None;
        self.result = None;
    }

    fn render_result(&mut self, result: &ResultView) {
        self.result = Some(result.clone());
    }

    fn set_error_message(&mut self, message: &str) {
        self.error_message = message.to_string();
    }

    fn clear_file_input(&mut self) {
        self.picked_name = None;
    }

    fn set_drag_highlight(&mut self, active: bool) {
        self.drag_highlight = active;
    }
}

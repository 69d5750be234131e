//! Preview decoding for the selected file.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::GenericImageView;
use shared::domain::FileId;

use crate::{error::UploadError, intake::SelectedFile};

/// Longest side of the decoded thumbnail, in pixels.
pub const PREVIEW_MAX_DIMENSION: u32 = 1024;

#[derive(Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub width: usize,
    pub height: usize,
    pub rgba: Vec<u8>,
}

impl fmt::Debug for PreviewImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

/// Displayable form of a selected file: a `data:` URL for markup-based
/// views and an RGBA thumbnail for immediate-mode ones.
///
/// `thumbnail` is `None` when the bytes are readable but not in a format
/// the local decoder understands. The file is still a valid upload.
#[derive(Clone)]
pub struct Preview {
    pub file_id: FileId,
    pub file_name: String,
    pub data_url: String,
    pub thumbnail: Option<PreviewImage>,
}

impl fmt::Debug for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preview")
            .field("file_id", &self.file_id)
            .field("file_name", &self.file_name)
            .field("data_url_len", &self.data_url.len())
            .field("thumbnail", &self.thumbnail)
            .finish()
    }
}

/// Reads and decodes the file. Blocking; run it off the UI thread.
///
/// Only a failed read is an error.
pub fn decode_preview(file: &SelectedFile) -> Result<Preview, UploadError> {
    let bytes = file.read_bytes()?;
    Ok(preview_from_bytes(file.id, &file.name, &file.mime_type, &bytes))
}

pub fn preview_from_bytes(
    file_id: FileId,
    file_name: &str,
    mime_type: &str,
    bytes: &[u8],
) -> Preview {
    let thumbnail = match decode_thumbnail(bytes) {
        Ok(thumbnail) => Some(thumbnail),
        Err(err) => {
            tracing::debug!(%file_id, mime_type, "no thumbnail: {err}");
            None
        }
    };
    Preview {
        file_id,
        file_name: file_name.to_string(),
        data_url: data_url(mime_type, bytes),
        thumbnail,
    }
}

fn decode_thumbnail(bytes: &[u8]) -> image::ImageResult<PreviewImage> {
    let dynamic = image::load_from_memory(bytes)?;
    let (width, height) = dynamic.dimensions();
    let rgba = if width.max(height) > PREVIEW_MAX_DIMENSION {
        dynamic
            .thumbnail(PREVIEW_MAX_DIMENSION, PREVIEW_MAX_DIMENSION)
            .to_rgba8()
    } else {
        dynamic.to_rgba8()
    };
    Ok(PreviewImage {
        width: rgba.width() as usize,
        height: rgba.height() as usize,
        rgba: rgba.into_raw(),
    })
}

pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

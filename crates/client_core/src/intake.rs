//! File intake: raw handles from the picker or a drop, and the validation
//! gate that turns one into the selected file.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

use shared::domain::FileId;

use crate::error::UploadError;

/// Upload ceiling, inclusive.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

const IMAGE_MIME_PREFIX: &str = "image/";

/// Where the bytes of a file live. Disk files are read lazily so that an
/// oversized pick is rejected from its metadata alone.
#[derive(Clone)]
pub enum FileSource {
    Memory(Arc<[u8]>),
    Disk(PathBuf),
}

impl fmt::Debug for FileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileSource::Memory(bytes) => write!(f, "Memory({} bytes)", bytes.len()),
            FileSource::Disk(path) => write!(f, "Disk({})", path.display()),
        }
    }
}

/// A file the user picked or dropped, not yet validated.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub source: FileSource,
}

impl CandidateFile {
    pub fn from_bytes(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: impl Into<Arc<[u8]>>,
    ) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            size_bytes: bytes.len() as u64,
            source: FileSource::Memory(bytes),
        }
    }

    /// Builds a candidate from a path on disk, guessing the MIME type from
    /// the extension.
    pub fn from_path(path: &Path) -> Result<Self, UploadError> {
        let metadata = std::fs::metadata(path).map_err(UploadError::unreadable)?;
        if !metadata.is_file() {
            return Err(UploadError::unreadable(format!(
                "{} is not a regular file",
                path.display()
            )));
        }
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            mime_type: guess_mime_type(&name),
            name,
            size_bytes: metadata.len(),
            source: FileSource::Disk(path.to_path_buf()),
        })
    }
}

/// MIME type for a file name, or an empty string when the extension is
/// unknown (which then fails validation).
pub fn guess_mime_type(name: &str) -> String {
    mime_guess::from_path(name)
        .first_raw()
        .unwrap_or_default()
        .to_string()
}

/// Type first, then size; the first failing rule wins.
pub fn validate(candidate: &CandidateFile) -> Result<(), UploadError> {
    if !candidate.mime_type.starts_with(IMAGE_MIME_PREFIX) {
        return Err(UploadError::InvalidType {
            mime_type: candidate.mime_type.clone(),
        });
    }
    if candidate.size_bytes > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge {
            size_bytes: candidate.size_bytes,
        });
    }
    Ok(())
}

/// The one file the controller currently owns.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub id: FileId,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub source: FileSource,
}

impl SelectedFile {
    pub fn new(id: FileId, candidate: CandidateFile) -> Self {
        Self {
            id,
            name: candidate.name,
            mime_type: candidate.mime_type,
            size_bytes: candidate.size_bytes,
            source: candidate.source,
        }
    }

    pub fn read_bytes(&self) -> Result<Vec<u8>, UploadError> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(bytes.to_vec()),
            FileSource::Disk(path) => std::fs::read(path).map_err(UploadError::unreadable),
        }
    }

    pub async fn read_bytes_async(&self) -> Result<Vec<u8>, UploadError> {
        match &self.source {
            FileSource::Memory(bytes) => Ok(bytes.to_vec()),
            FileSource::Disk(path) => tokio::fs::read(path)
                .await
                .map_err(UploadError::unreadable),
        }
    }
}

use thiserror::Error;

/// Everything that can end an upload attempt. The `Display` text is what the
/// Error zone shows; none of these are fatal and "start over" always
/// recovers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("Please select a valid image file.")]
    InvalidType { mime_type: String },
    #[error("File too large. Please select an image under 10MB.")]
    TooLarge { size_bytes: u64 },
    #[error("Error reading the selected file")]
    UnreadableFile { reason: String },
    #[error("Please select an image first.")]
    NoFileSelected,
    #[error("Classification failed: {0}")]
    NetworkFailure(String),
    #[error("Classification failed: HTTP error! status: {status}{}", detail_suffix(.detail))]
    ServerRejected { status: u16, detail: Option<String> },
    #[error("Classification failed: {0}")]
    ClassificationFailed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidType,
    TooLarge,
    UnreadableFile,
    NoFileSelected,
    NetworkFailure,
    ServerRejected,
    ClassificationFailed,
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            UploadError::InvalidType { .. } => ErrorKind::InvalidType,
            UploadError::TooLarge { .. } => ErrorKind::TooLarge,
            UploadError::UnreadableFile { .. } => ErrorKind::UnreadableFile,
            UploadError::NoFileSelected => ErrorKind::NoFileSelected,
            UploadError::NetworkFailure(_) => ErrorKind::NetworkFailure,
            UploadError::ServerRejected { .. } => ErrorKind::ServerRejected,
            UploadError::ClassificationFailed(_) => ErrorKind::ClassificationFailed,
        }
    }

    pub fn unreadable(reason: impl ToString) -> Self {
        UploadError::UnreadableFile {
            reason: reason.to_string(),
        }
    }
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|detail| format!(" ({detail})"))
        .unwrap_or_default()
}

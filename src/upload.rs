use std::path::Path;
use thiserror::Error;

/// Extensions offered by the file picker. The backend decides what is actually valid.
pub const ACCEPTED_EXTENSIONS: &[&str] = &["pdf", "docx", "md"];

/// Whether the picker should offer `path`.
pub fn is_accepted_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| ACCEPTED_EXTENSIONS.iter().any(|a| a.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}

// ── Upload sub-machine ────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    Uploading { filename: String },
    Done { filename: String },
    Error { filename: String, message: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum UploadError {
    #[error("An upload is already in progress ({0})")]
    InFlight(String),
    #[error("No upload is in progress")]
    NotUploading,
}

impl UploadState {
    pub fn filename(&self) -> Option<&str> {
        match self {
            UploadState::Idle => None,
            UploadState::Uploading { filename }
            | UploadState::Done { filename }
            | UploadState::Error { filename, .. } => Some(filename),
        }
    }

    pub fn is_uploading(&self) -> bool {
        matches!(self, UploadState::Uploading { .. })
    }

    /// Starts tracking `filename`, discarding any earlier terminal state.
    pub fn begin(&mut self, filename: impl Into<String>) -> Result<(), UploadError> {
        if let UploadState::Uploading { filename } = self {
            return Err(UploadError::InFlight(filename.clone()));
        }
        *self = UploadState::Uploading {
            filename: filename.into(),
        };
        Ok(())
    }

    pub fn succeed(&mut self) -> Result<(), UploadError> {
        match std::mem::take(self) {
            UploadState::Uploading { filename } => {
                *self = UploadState::Done { filename };
                Ok(())
            }
            other => {
                *self = other;
                Err(UploadError::NotUploading)
            }
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), UploadError> {
        match std::mem::take(self) {
            UploadState::Uploading { filename } => {
                *self = UploadState::Error {
                    filename,
                    message: message.into(),
                };
                Ok(())
            }
            other => {
                *self = other;
                Err(UploadError::NotUploading)
            }
        }
    }

    /// Back to idle from a terminal state. Returns false while an upload is in flight.
    pub fn clear(&mut self) -> bool {
        if self.is_uploading() {
            return false;
        }
        *self = UploadState::Idle;
        true
    }
}

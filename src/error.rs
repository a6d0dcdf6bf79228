use crate::capture::CaptureError;
use crate::config::ConfigError;
use crate::document::DocumentError;
use crate::storage::StorageError;
use std::path::PathBuf;
use thiserror::Error;

/// Broad class of a paste failure, used to pick how it is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Validation,
    Capture,
    Filesystem,
    Upload,
}

#[derive(Debug, Error)]
pub enum PasteError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("Your selection is not a valid filename!")]
    InvalidSelection { selection: String },

    #[error("Before pasting the image, you need to save current file first.")]
    UnsavedDocument { path: PathBuf },

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error("The image dest directory '{}' is a file. Please check your 'path' config.", path.display())]
    NotADirectory { path: PathBuf },

    #[error("Failed make folder '{}'. message={source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to access '{}'. message={source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Upload(#[from] StorageError),
}

pub type PasteResult<T> = Result<T, PasteError>;

impl PasteError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PasteError::Configuration(_) => ErrorKind::Configuration,
            PasteError::InvalidSelection { .. }
            | PasteError::UnsavedDocument { .. }
            | PasteError::Document(_) => ErrorKind::Validation,
            PasteError::Capture(_) => ErrorKind::Capture,
            PasteError::NotADirectory { .. }
            | PasteError::CreateDirectory { .. }
            | PasteError::Io { .. } => ErrorKind::Filesystem,
            PasteError::Upload(_) => ErrorKind::Upload,
        }
    }

    /// Text shown to the user. Upload failures name the step that failed.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::Upload => format!("Upload to Azure Storage failed. {}", self),
            _ => self.to_string(),
        }
    }

    /// Informational failures are reported as notices rather than errors: the user
    /// did nothing wrong, there was just nothing to paste.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            PasteError::UnsavedDocument { .. }
                | PasteError::InvalidSelection { .. }
                | PasteError::Capture(CaptureError::NoImage)
                | PasteError::Capture(CaptureError::ToolMissing { .. })
        )
    }
}

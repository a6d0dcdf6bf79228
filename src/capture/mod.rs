//! Reading the image on the system clipboard.
//!
//! Backends report a [`CaptureOutcome`], decoded once from whatever the underlying
//! tool produced. The pipeline turns it into a [`CapturedImage`] or a
//! [`CaptureError`] with [`CaptureOutcome::into_result`].

#[cfg(feature = "native-capture")]
mod native;
mod script;

#[cfg(feature = "native-capture")]
pub use native::NativeCapture;
pub use script::{Platform, Script, ScriptCapture};

use crate::config::{CaptureBackend, Settings};
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub const NO_IMAGE_MARKER: &str = "no image";
pub const NO_XCLIP_MARKER: &str = "no xclip";

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("There is not an image in the clipboard.")]
    NoImage,

    #[error("You need to install {tool} command first.")]
    ToolMissing { tool: String },

    #[error("Failed to read the clipboard image: {detail}")]
    ToolFailed { detail: String },
}

/// What a capture attempt produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// A PNG was written to this path.
    Saved(PathBuf),
    /// PNG bytes, for upload.
    Encoded(Vec<u8>),
    NoImage,
    ToolMissing(String),
    ToolError(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapturedImage {
    File(PathBuf),
    Bytes(Vec<u8>),
}

impl CaptureOutcome {
    /// Decode the output of a script that saves the image to a file and prints
    /// its path.
    pub fn from_file_output(stdout: &str) -> Self {
        match stdout.trim() {
            NO_IMAGE_MARKER => CaptureOutcome::NoImage,
            NO_XCLIP_MARKER => CaptureOutcome::ToolMissing("xclip".to_string()),
            "" => CaptureOutcome::ToolError("the capture script printed nothing".to_string()),
            output => {
                let path = output.lines().last().unwrap_or(output).trim();
                CaptureOutcome::Saved(PathBuf::from(path))
            }
        }
    }

    /// Decode the output of a script that prints the image as base64.
    pub fn from_base64_output(stdout: &str) -> Self {
        let payload: String = stdout.split_whitespace().collect();
        match payload.as_str() {
            "noimage" => CaptureOutcome::NoImage,
            "" => CaptureOutcome::ToolError("the capture script printed nothing".to_string()),
            encoded => match STANDARD.decode(encoded) {
                Ok(bytes) => CaptureOutcome::Encoded(bytes),
                Err(e) => CaptureOutcome::ToolError(format!("invalid base64 output: {}", e)),
            },
        }
    }

    pub fn into_result(self) -> Result<CapturedImage, CaptureError> {
        match self {
            CaptureOutcome::Saved(path) => Ok(CapturedImage::File(path)),
            CaptureOutcome::Encoded(bytes) => Ok(CapturedImage::Bytes(bytes)),
            CaptureOutcome::NoImage => Err(CaptureError::NoImage),
            CaptureOutcome::ToolMissing(tool) => Err(CaptureError::ToolMissing { tool }),
            CaptureOutcome::ToolError(detail) => Err(CaptureError::ToolFailed { detail }),
        }
    }
}

#[async_trait]
pub trait ClipboardCapture: Send + Sync {
    /// Write the clipboard image to `target` as PNG.
    async fn save_to_file(&self, target: &Path) -> CaptureOutcome;

    /// Return the clipboard image as PNG bytes.
    async fn read_png(&self) -> CaptureOutcome;
}

/// The capture backend selected by `settings`.
pub fn backend_for(settings: &Settings) -> Arc<dyn ClipboardCapture> {
    match settings.capture_backend {
        #[cfg(feature = "native-capture")]
        CaptureBackend::Native => Arc::new(NativeCapture),
        #[cfg(not(feature = "native-capture"))]
        CaptureBackend::Native => {
            crate::console::console()
                .warning("Native capture is not compiled in; using the helper scripts.");
            Arc::new(ScriptCapture::new(settings.script_dir.clone()))
        }
        CaptureBackend::Script => Arc::new(ScriptCapture::new(settings.script_dir.clone())),
    }
}

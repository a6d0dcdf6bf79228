//! One paste operation, start to finish.
//!
//! The pipeline moves through [`Stage`]s in order, each an awaited step:
//!
//! ```text
//! Idle -> ConfigLoaded -> PathSynthesized -> [Confirmed] -> Captured -> [Uploaded]
//!      -> Rendered -> Inserted
//! ```
//!
//! Failures end it with an error; declined prompts end it with
//! [`PasteOutcome::Aborted`]. Nothing is retried or rolled back.

use crate::capture::{CapturedImage, ClipboardCapture, backend_for};
use crate::config::{AppConfig, Settings};
use crate::console::console;
use crate::document::{DocumentContext, DocumentEditor};
use crate::error::{PasteError, PasteResult};
use crate::naming::{
    apply_confirmed, confirm_default, ensure_image_dir, image_file_name, image_path,
    validate_selection,
};
use crate::prompt::Prompter;
use crate::render::{ImageLocation, render};
use crate::storage::{AzureBlobStore, BlobStore, upload_image};
use chrono::{DateTime, Local, TimeZone};
use std::fmt;
use std::io;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ConfigLoaded,
    PathSynthesized,
    Confirmed,
    Captured,
    Uploaded,
    Rendered,
    Inserted,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Idle => "idle",
            Stage::ConfigLoaded => "config loaded",
            Stage::PathSynthesized => "path synthesized",
            Stage::Confirmed => "confirmed",
            Stage::Captured => "captured",
            Stage::Uploaded => "uploaded",
            Stage::Rendered => "rendered",
            Stage::Inserted => "inserted",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteEvent {
    StageEntered(Stage),
    Aborted(AbortReason),
}

/// Why a paste stopped without an error. These end silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbortReason {
    /// The file name prompt was dismissed.
    NameCancelled,
    /// The user declined to replace an existing local file.
    OverwriteDeclined,
    /// The user declined to replace an existing blob.
    UploadDeclined,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasteOutcome {
    Inserted {
        text: String,
        location: ImageLocation,
    },
    Aborted(AbortReason),
}

pub struct PastePipeline {
    /// `None` picks the backend named by each run's resolved settings.
    capture: Option<Arc<dyn ClipboardCapture>>,
    prompter: Arc<dyn Prompter>,
    editor: Arc<dyn DocumentEditor>,
    store: Option<Arc<dyn BlobStore>>,
    event_sender: Option<mpsc::UnboundedSender<PasteEvent>>,
}

impl PastePipeline {
    pub fn new(
        capture: Arc<dyn ClipboardCapture>,
        prompter: Arc<dyn Prompter>,
        editor: Arc<dyn DocumentEditor>,
    ) -> Self {
        Self {
            capture: Some(capture),
            prompter,
            editor,
            store: None,
            event_sender: None,
        }
    }

    /// A pipeline that captures with the backend chosen by `captureBackend`.
    pub fn configured(prompter: Arc<dyn Prompter>, editor: Arc<dyn DocumentEditor>) -> Self {
        Self {
            capture: None,
            prompter,
            editor,
            store: None,
            event_sender: None,
        }
    }

    /// Use `store` for uploads instead of a client built from the connection string.
    pub fn with_store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_event_sender(mut self, sender: mpsc::UnboundedSender<PasteEvent>) -> Self {
        self.event_sender = Some(sender);
        self
    }

    fn send_event(&self, event: PasteEvent) {
        if let Some(sender) = &self.event_sender {
            let _ = sender.send(event);
        }
    }

    fn enter(&self, stage: Stage, detail: &str) {
        if detail.is_empty() {
            console().verbose(&format!("[{}]", stage));
        } else {
            console().verbose(&format!("[{}] {}", stage, detail));
        }
        self.send_event(PasteEvent::StageEntered(stage));
    }

    fn abort(&self, reason: AbortReason) -> PasteResult<PasteOutcome> {
        console().verbose(&format!("[aborted] {:?}", reason));
        self.send_event(PasteEvent::Aborted(reason));
        Ok(PasteOutcome::Aborted(reason))
    }

    pub async fn run(
        &self,
        config: &AppConfig,
        document: &DocumentContext,
    ) -> PasteResult<PasteOutcome> {
        self.run_at(config, document, &Local::now()).await
    }

    /// Run the pipeline with `now` as the naming timestamp.
    pub async fn run_at<Tz: TimeZone>(
        &self,
        config: &AppConfig,
        document: &DocumentContext,
        now: &DateTime<Tz>,
    ) -> PasteResult<PasteOutcome> {
        self.enter(Stage::Idle, &document.path.display().to_string());

        validate_selection(&document.selected_text)?;
        let settings = Settings::resolve(config, document)?;
        self.enter(Stage::ConfigLoaded, "");

        let capture = match &self.capture {
            Some(capture) => capture.clone(),
            None => backend_for(&settings),
        };
        let document_dir = document.dir();
        let file_name = image_file_name(&settings, &document.selected_text, now);
        let mut target = image_path(&settings, document_dir, &file_name);
        self.enter(Stage::PathSynthesized, &target.display().to_string());

        if settings.confirm_before_save {
            let default = confirm_default(&settings, document_dir, &file_name);
            let Some(answer) = self
                .prompter
                .input("Please specify the filename of the image.", &default)
                .await
            else {
                return self.abort(AbortReason::NameCancelled);
            };
            target = apply_confirmed(&settings, document_dir, &answer);
            self.enter(Stage::Confirmed, &target.display().to_string());
        }

        let location = if let Some(cloud) = &settings.cloud {
            let bytes = capture_bytes(capture.as_ref()).await?;
            self.enter(Stage::Captured, &format!("{} bytes", bytes.len()));

            let store = match &self.store {
                Some(store) => store.clone(),
                None => Arc::new(AzureBlobStore::from_connection_string(
                    &cloud.connection_string,
                )?) as Arc<dyn BlobStore>,
            };
            let key = target.to_string_lossy();
            let uploaded = upload_image(
                store.as_ref(),
                self.prompter.as_ref(),
                &cloud.container_name,
                &key,
                bytes,
            )
            .await?;
            let Some(url) = uploaded else {
                return self.abort(AbortReason::UploadDeclined);
            };
            self.enter(Stage::Uploaded, &url);
            ImageLocation::Remote(url)
        } else {
            if path_exists(&target).await? {
                let message = format!(
                    "File {} existed.Would you want to replace?",
                    target.display()
                );
                if !self.prompter.confirm(&message, "Replace").await {
                    return self.abort(AbortReason::OverwriteDeclined);
                }
            }
            ensure_image_dir(&target).await?;
            capture_file(capture.as_ref(), &target).await?;
            self.enter(Stage::Captured, &target.display().to_string());
            ImageLocation::Local(target)
        };

        let text = render(&settings, &document.language_id, &location);
        self.enter(Stage::Rendered, &text);

        self.editor.insert(document, &text).await?;
        self.enter(Stage::Inserted, "");

        Ok(PasteOutcome::Inserted { text, location })
    }
}

async fn capture_file(capture: &dyn ClipboardCapture, target: &Path) -> PasteResult<()> {
    match capture.save_to_file(target).await.into_result()? {
        CapturedImage::File(written) => {
            if written != target {
                console().debug(&format!(
                    "capture reported {}, expected {}",
                    written.display(),
                    target.display()
                ));
            }
            Ok(())
        }
        CapturedImage::Bytes(bytes) => tokio::fs::write(target, bytes)
            .await
            .map_err(|source| PasteError::Io {
                path: target.to_path_buf(),
                source,
            }),
    }
}

async fn capture_bytes(capture: &dyn ClipboardCapture) -> PasteResult<Vec<u8>> {
    match capture.read_png().await.into_result()? {
        CapturedImage::Bytes(bytes) => Ok(bytes),
        CapturedImage::File(path) => read_file(&path).await,
    }
}

/// A file standing where a parent directory should be means the image does not
/// exist yet; `ensure_image_dir` reports the offending directory afterwards.
async fn path_exists(path: &Path) -> PasteResult<bool> {
    match tokio::fs::try_exists(path).await {
        Ok(exists) => Ok(exists),
        Err(e) if e.kind() == io::ErrorKind::NotADirectory => Ok(false),
        Err(source) => Err(PasteError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn read_file(path: &Path) -> PasteResult<Vec<u8>> {
    tokio::fs::read(path).await.map_err(|source| PasteError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;

pub mod capture;
pub mod cli;
pub mod config;
pub mod console;
pub mod document;
pub mod error;
pub mod naming;
pub mod paths;
pub mod pipeline;
pub mod prompt;
pub mod render;
pub mod storage;
pub mod template;

pub use capture::{CaptureError, CaptureOutcome, CapturedImage, ClipboardCapture};
pub use config::{AppConfig, ConfigError, Settings};
pub use console::{Console, VerbosityLevel, console, init_console};
pub use document::{DocumentContext, DocumentEditor, Position, Selection};
pub use error::{PasteError, PasteResult};
pub use pipeline::{AbortReason, PasteEvent, PasteOutcome, PastePipeline, Stage};
pub use prompt::Prompter;
pub use render::{ImageLocation, render};
pub use storage::{AzureBlobStore, BlobStore};

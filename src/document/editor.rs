use super::{DocumentContext, Position, Selection, apply_edit};
use crate::error::{PasteError, PasteResult};
use async_trait::async_trait;

/// Where rendered image text ends up.
#[async_trait]
pub trait DocumentEditor: Send + Sync {
    async fn insert(&self, document: &DocumentContext, text: &str) -> PasteResult<()>;
}

/// Rewrites the document file in place: inserts at the cursor or replaces the
/// selection. Without a selection the text goes at the start of the document.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileEditor;

#[async_trait]
impl DocumentEditor for FileEditor {
    async fn insert(&self, document: &DocumentContext, text: &str) -> PasteResult<()> {
        let io_error = |source| PasteError::Io {
            path: document.path.clone(),
            source,
        };

        let original = tokio::fs::read_to_string(&document.path)
            .await
            .map_err(io_error)?;
        let selection = document
            .selection
            .unwrap_or_else(|| Selection::cursor(Position::new(1, 1)));
        let edited = apply_edit(&original, selection, text)?;

        tokio::fs::write(&document.path, edited)
            .await
            .map_err(io_error)
    }
}

/// Prints the text to stdout and leaves the document alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutEditor;

#[async_trait]
impl DocumentEditor for StdoutEditor {
    async fn insert(&self, _document: &DocumentContext, text: &str) -> PasteResult<()> {
        println!("{}", text);
        Ok(())
    }
}

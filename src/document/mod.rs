//! The active document: where it lives, what language it is, and where the cursor
//! sits. Also applies the final insert/replace edit to the document text.

mod editor;

pub use editor::{DocumentEditor, FileEditor, StdoutEditor};

use crate::config::PROJECT_CONFIG_FILE;
use crate::template::DocumentVariables;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DocumentError {
    #[error("Invalid position '{value}': expected LINE or LINE:COLUMN (1-based)")]
    InvalidPosition { value: String },

    #[error("Position {position} is outside the document")]
    OutOfRange { position: Position },
}

/// A 1-based line/column position. Columns count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

impl FromStr for Position {
    type Err = DocumentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DocumentError::InvalidPosition {
            value: s.to_string(),
        };
        let (line, column) = match s.split_once(':') {
            Some((line, column)) => (line, column),
            None => (s, "1"),
        };
        let line: usize = line.trim().parse().map_err(|_| invalid())?;
        let column: usize = column.trim().parse().map_err(|_| invalid())?;
        if line == 0 || column == 0 {
            return Err(invalid());
        }
        Ok(Self { line, column })
    }
}

/// A cursor range. An empty selection is a plain cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: Position,
    pub end: Position,
}

impl Selection {
    pub fn new(a: Position, b: Position) -> Self {
        if b < a {
            Self { start: b, end: a }
        } else {
            Self { start: a, end: b }
        }
    }

    pub fn cursor(at: Position) -> Self {
        Self { start: at, end: at }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentContext {
    pub path: PathBuf,
    pub project_root: Option<PathBuf>,
    pub language_id: String,
    pub selection: Option<Selection>,
    pub selected_text: String,
}

impl DocumentContext {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let language_id = language_for_path(&path);
        Self {
            path,
            project_root: None,
            language_id,
            selection: None,
            selected_text: String::new(),
        }
    }

    pub fn with_project_root(mut self, project_root: Option<PathBuf>) -> Self {
        self.project_root = project_root;
        self
    }

    pub fn with_language(mut self, language_id: impl Into<String>) -> Self {
        self.language_id = language_id.into();
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn with_selected_text(mut self, text: impl Into<String>) -> Self {
        self.selected_text = text.into();
        self
    }

    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    pub fn variables(&self) -> DocumentVariables {
        DocumentVariables::new(self.project_root.as_deref(), &self.path)
    }
}

/// Map a file extension to an editor language identifier.
pub fn language_for_path(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "md" | "markdown" | "mdx" | "mkd" => "markdown".to_string(),
        "adoc" | "asciidoc" | "asc" => "asciidoc".to_string(),
        "" => "plaintext".to_string(),
        _ => ext,
    }
}

/// Nearest ancestor of `start` that looks like a project root.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(".git").exists() || dir.join(PROJECT_CONFIG_FILE).exists())
        .map(Path::to_path_buf)
}

/// Byte offset of `position` in `text`. The column one past the last character of a
/// line addresses the line end.
pub fn byte_offset(text: &str, position: Position) -> Result<usize, DocumentError> {
    let out_of_range = || DocumentError::OutOfRange { position };

    let mut line_start = 0;
    for _ in 1..position.line {
        let newline = text[line_start..].find('\n').ok_or_else(out_of_range)?;
        line_start += newline + 1;
    }

    let line_end = text[line_start..]
        .find('\n')
        .map(|i| line_start + i)
        .unwrap_or(text.len());
    let line = &text[line_start..line_end];
    let column = position.column - 1;

    if column == line.chars().count() {
        return Ok(line_end);
    }
    line.char_indices()
        .nth(column)
        .map(|(i, _)| line_start + i)
        .ok_or_else(out_of_range)
}

pub fn selected_text(text: &str, selection: Selection) -> Result<String, DocumentError> {
    let start = byte_offset(text, selection.start)?;
    let end = byte_offset(text, selection.end)?;
    Ok(text[start..end].to_string())
}

/// Insert `replacement` at the cursor, or replace the selected range.
pub fn apply_edit(
    text: &str,
    selection: Selection,
    replacement: &str,
) -> Result<String, DocumentError> {
    let start = byte_offset(text, selection.start)?;
    let end = byte_offset(text, selection.end)?;

    let mut edited = String::with_capacity(text.len() + replacement.len());
    edited.push_str(&text[..start]);
    edited.push_str(replacement);
    edited.push_str(&text[end..]);
    Ok(edited)
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;

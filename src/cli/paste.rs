use crate::config::AppConfig;
use crate::console::console;
use crate::document::{
    DocumentContext, DocumentEditor, FileEditor, Position, Selection, StdoutEditor,
    find_project_root, selected_text,
};
use crate::error::{PasteError, PasteResult};
use crate::paths::normalize;
use crate::pipeline::{PasteOutcome, PastePipeline};
use crate::prompt::{AutoConfirm, Prompter, TerminalPrompter};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Args, Debug)]
pub struct PasteArgs {
    /// The document to paste into
    pub document: PathBuf,

    /// Project root for ${projectRoot} (default: nearest ancestor with .git or .paste-image.toml)
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Language id used to pick the image syntax (default: from the file extension)
    #[arg(long)]
    pub language: Option<String>,

    /// Cursor position as LINE[:COLUMN], 1-based
    #[arg(long)]
    pub at: Option<Position>,

    /// End of the selection as LINE[:COLUMN]; the selected text names the image
    #[arg(long, requires = "at")]
    pub to: Option<Position>,

    /// Text to use as the image name instead of a selection range
    #[arg(long, conflicts_with = "to")]
    pub selection: Option<String>,

    /// Print the rendered text instead of editing the document
    #[arg(long)]
    pub print: bool,

    /// Answer yes to every prompt
    #[arg(short = 'y', long)]
    pub yes: bool,
}

impl PasteArgs {
    fn edits_document(&self) -> bool {
        !self.print && self.at.is_some()
    }
}

fn absolute(path: &Path) -> PasteResult<PathBuf> {
    std::path::absolute(path)
        .map(|p| normalize(&p))
        .map_err(|source| PasteError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Build the document context from the command line. An unsaved (missing)
/// document cannot be pasted into.
pub async fn document_from_args(args: &PasteArgs) -> PasteResult<DocumentContext> {
    let path = absolute(&args.document)?;
    if !path.is_file() {
        return Err(PasteError::UnsavedDocument { path });
    }

    let project_root = match &args.workspace {
        Some(workspace) => Some(absolute(workspace)?),
        None => path.parent().and_then(find_project_root),
    };

    let mut document = DocumentContext::new(path).with_project_root(project_root);
    if let Some(language) = &args.language {
        document = document.with_language(language.clone());
    }

    if let Some(at) = args.at {
        let selection = Selection::new(at, args.to.unwrap_or(at));
        document = document.with_selection(selection);

        if !selection.is_empty() {
            let text = tokio::fs::read_to_string(&document.path)
                .await
                .map_err(|source| PasteError::Io {
                    path: document.path.clone(),
                    source,
                })?;
            let selected = selected_text(&text, selection)?;
            document = document.with_selected_text(selected);
        }
    }
    if let Some(selection) = &args.selection {
        document = document.with_selected_text(selection.clone());
    }

    Ok(document)
}

fn report(err: &PasteError) {
    console().debug(&format!("{:?} failure: {:?}", err.kind(), err));
    if err.is_informational() {
        console().info(&err.user_message());
    } else {
        console().error(&err.user_message());
    }
}

/// Run one paste. Returns whether it succeeded; failures are already reported.
pub async fn handle_paste(args: PasteArgs) -> anyhow::Result<bool> {
    match paste(&args).await {
        Ok(PasteOutcome::Inserted { text, location }) => {
            console().verbose(&format!("Image at {}", location.display()));
            if args.edits_document() {
                console().success(&format!(
                    "Inserted {} into {}",
                    text,
                    args.document.display()
                ));
            }
            Ok(true)
        }
        Ok(PasteOutcome::Aborted(_)) => Ok(true),
        Err(err) => {
            report(&err);
            Ok(err.is_informational())
        }
    }
}

async fn paste(args: &PasteArgs) -> PasteResult<PasteOutcome> {
    let document = document_from_args(args).await?;
    let config = AppConfig::load_for_project(document.project_root.as_deref())?;

    let prompter: Arc<dyn Prompter> = if args.yes {
        Arc::new(AutoConfirm)
    } else {
        Arc::new(TerminalPrompter::new())
    };
    let editor: Arc<dyn DocumentEditor> = if args.edits_document() {
        Arc::new(FileEditor)
    } else {
        Arc::new(StdoutEditor)
    };

    PastePipeline::configured(prompter, editor)
        .run(&config, &document)
        .await
}

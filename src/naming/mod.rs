//! Image file naming and target path synthesis.

mod timestamp;

pub use timestamp::format_timestamp;

use crate::config::{ConfirmMode, Settings};
use crate::error::{PasteError, PasteResult};
use crate::paths::join_normalized;
use chrono::{DateTime, TimeZone};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Characters that may not appear in a selection used as a file name.
pub const INVALID_NAME_CHARS: [char; 7] = ['\\', ':', '*', '?', '<', '>', '|'];

pub const IMAGE_EXTENSION: &str = ".png";

pub fn validate_selection(selection: &str) -> PasteResult<()> {
    if selection.contains(INVALID_NAME_CHARS) {
        return Err(PasteError::InvalidSelection {
            selection: selection.to_string(),
        });
    }
    Ok(())
}

/// The image file name: the selection when there is one, otherwise the default-name
/// pattern formatted at `now`. Always wrapped in the configured name affixes.
pub fn image_file_name<Tz: TimeZone>(
    settings: &Settings,
    selection: &str,
    now: &DateTime<Tz>,
) -> String {
    let stem = if selection.is_empty() {
        format_timestamp(&settings.default_name, now)
    } else {
        selection.to_string()
    };

    format!(
        "{}{}{}{}",
        settings.name_prefix, stem, settings.name_suffix, IMAGE_EXTENSION
    )
}

/// Full target path for `file_name`. An absolute folder (or any folder in cloud mode,
/// where it is a key namespace) is used as is; a relative one hangs off the document
/// directory.
pub fn image_path(settings: &Settings, document_dir: &Path, file_name: &str) -> PathBuf {
    let folder = Path::new(&settings.folder_path);

    if folder.is_absolute() || settings.is_cloud() {
        join_normalized([folder, Path::new(file_name)])
    } else {
        join_normalized([document_dir, folder, Path::new(file_name)])
    }
}

/// The value shown in the confirmation prompt for the given mode.
pub fn confirm_default(
    settings: &Settings,
    document_dir: &Path,
    file_name: &str,
) -> String {
    match settings.confirm_mode {
        ConfirmMode::OnlyName => file_name.to_string(),
        ConfirmMode::FullPath => image_path(settings, document_dir, file_name)
            .to_string_lossy()
            .into_owned(),
    }
}

/// Turn the user's answer into the final image path.
pub fn apply_confirmed(
    settings: &Settings,
    document_dir: &Path,
    answer: &str,
) -> PathBuf {
    let answer = ensure_png_extension(answer);
    match settings.confirm_mode {
        ConfirmMode::OnlyName => image_path(settings, document_dir, &answer),
        ConfirmMode::FullPath => PathBuf::from(answer),
    }
}

pub fn ensure_png_extension(name: &str) -> String {
    if name.ends_with(IMAGE_EXTENSION) {
        name.to_string()
    } else {
        format!("{}{}", name, IMAGE_EXTENSION)
    }
}

/// Make sure the directory that will hold `image_path` exists.
pub async fn ensure_image_dir(image_path: &Path) -> PasteResult<()> {
    let Some(dir) = image_path.parent().filter(|d| !d.as_os_str().is_empty()) else {
        return Ok(());
    };

    match tokio::fs::metadata(dir).await {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(PasteError::NotADirectory {
            path: dir.to_path_buf(),
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| PasteError::CreateDirectory {
                path: dir.to_path_buf(),
                source,
            }),
        Err(source) => Err(PasteError::Io {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
#[path = "naming_tests.rs"]
mod tests;

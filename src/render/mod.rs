//! Turns the final image location into the text inserted into the document.

use crate::config::{EncodeMode, Settings};
use crate::paths::{relative_to, to_unix_separators};
use crate::template::{Placeholder, substitute};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::path::{Path, PathBuf};

/// Characters left alone by full URL encoding: unreserved marks plus the URI
/// reserved set, so separators and query syntax survive.
const URI_SAFE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b';')
    .remove(b',')
    .remove(b'/')
    .remove(b'?')
    .remove(b':')
    .remove(b'@')
    .remove(b'&')
    .remove(b'=')
    .remove(b'+')
    .remove(b'$')
    .remove(b'#');

/// Language-specific wrapping around the image path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSyntax {
    pub prefix: &'static str,
    pub suffix: &'static str,
}

impl ImageSyntax {
    pub fn for_language(language_id: &str) -> Self {
        match language_id {
            "markdown" => Self {
                prefix: "![](",
                suffix: ")",
            },
            "asciidoc" => Self {
                prefix: "image::",
                suffix: "[]",
            },
            _ => Self {
                prefix: "",
                suffix: "",
            },
        }
    }
}

/// Where the pasted image ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageLocation {
    Local(PathBuf),
    Remote(String),
}

impl ImageLocation {
    pub fn display(&self) -> String {
        match self {
            ImageLocation::Local(path) => path.to_string_lossy().into_owned(),
            ImageLocation::Remote(url) => url.clone(),
        }
    }
}

pub fn encode(path: &str, mode: EncodeMode) -> String {
    match mode {
        EncodeMode::None => path.to_string(),
        EncodeMode::UrlEncode => utf8_percent_encode(path, URI_SAFE).to_string(),
        EncodeMode::UrlEncodeSpace => path.replace(' ', "%20"),
    }
}

/// Relativize and normalize a local image path according to `settings`.
pub fn shape_local_path(settings: &Settings, image_path: &Path) -> String {
    let shaped = if settings.base_path.is_empty() {
        image_path.to_path_buf()
    } else {
        relative_to(Path::new(&settings.base_path), image_path)
    };

    let shaped = shaped.to_string_lossy().into_owned();
    if settings.force_unix_style_separator {
        to_unix_separators(&shaped)
    } else {
        shaped
    }
}

fn split_file_name(path: &str) -> (String, String) {
    let name = path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .to_string();
    let stem = match name.rfind('.') {
        Some(0) | None => name.clone(),
        Some(dot) => name[..dot].to_string(),
    };
    (name, stem)
}

/// Render the insert pattern for `location` in a document of `language_id`.
pub fn render(settings: &Settings, language_id: &str, location: &ImageLocation) -> String {
    let syntax = ImageSyntax::for_language(language_id);

    let original = match location {
        ImageLocation::Local(path) => shape_local_path(settings, path),
        ImageLocation::Remote(url) => url.clone(),
    };
    let lookup = match location {
        // Query strings are not part of the name.
        ImageLocation::Remote(url) => url.split(['?', '#']).next().unwrap_or_default(),
        ImageLocation::Local(_) => original.as_str(),
    };
    let (file_name, file_stem) = split_file_name(lookup);

    let decorated = format!("{}{}{}", settings.prefix, original, settings.suffix);
    let encoded = encode(&decorated, settings.encode_path);

    let passes = [
        (Placeholder::ImageSyntaxPrefix, syntax.prefix),
        (Placeholder::ImageSyntaxSuffix, syntax.suffix),
        (Placeholder::ImageOriginalFilePath, original.as_str()),
        (Placeholder::ImageFileName, file_name.as_str()),
        (Placeholder::ImageFileNameWithoutExt, file_stem.as_str()),
        (Placeholder::ImageFilePath, encoded.as_str()),
    ];

    passes
        .into_iter()
        .fold(settings.insert_pattern.clone(), |acc, (placeholder, value)| {
            substitute(&acc, placeholder, value)
        })
}

#[cfg(test)]
#[path = "render_tests.rs"]
mod tests;

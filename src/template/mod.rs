//! Placeholder substitution for path and insert-pattern templates.
//!
//! Templates are plain strings carrying `${name}` tokens from a fixed set. Each
//! placeholder is replaced globally in a single textual pass; there is no escaping
//! and unknown tokens are left as they are.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placeholder {
    ProjectRoot,
    CurrentFileDir,
    CurrentFileName,
    CurrentFileNameWithoutExt,
    ImageFilePath,
    ImageOriginalFilePath,
    ImageFileName,
    ImageFileNameWithoutExt,
    ImageSyntaxPrefix,
    ImageSyntaxSuffix,
}

impl Placeholder {
    pub const ALL: [Placeholder; 10] = [
        Placeholder::ProjectRoot,
        Placeholder::CurrentFileDir,
        Placeholder::CurrentFileName,
        Placeholder::CurrentFileNameWithoutExt,
        Placeholder::ImageFilePath,
        Placeholder::ImageOriginalFilePath,
        Placeholder::ImageFileName,
        Placeholder::ImageFileNameWithoutExt,
        Placeholder::ImageSyntaxPrefix,
        Placeholder::ImageSyntaxSuffix,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Placeholder::ProjectRoot => "projectRoot",
            Placeholder::CurrentFileDir => "currentFileDir",
            Placeholder::CurrentFileName => "currentFileName",
            Placeholder::CurrentFileNameWithoutExt => "currentFileNameWithoutExt",
            Placeholder::ImageFilePath => "imageFilePath",
            Placeholder::ImageOriginalFilePath => "imageOriginalFilePath",
            Placeholder::ImageFileName => "imageFileName",
            Placeholder::ImageFileNameWithoutExt => "imageFileNameWithoutExt",
            Placeholder::ImageSyntaxPrefix => "imageSyntaxPrefix",
            Placeholder::ImageSyntaxSuffix => "imageSyntaxSuffix",
        }
    }

    /// The literal token as it appears in a template, e.g. `${projectRoot}`.
    pub fn token(self) -> String {
        format!("${{{}}}", self.name())
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }
}

/// Replace every occurrence of `placeholder` in `template` with `value`.
pub fn substitute(template: &str, placeholder: Placeholder, value: &str) -> String {
    template.replace(&placeholder.token(), value)
}

/// Values derived from the active document's path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentVariables {
    pub project_root: String,
    pub current_file_dir: String,
    pub current_file_name: String,
    pub current_file_name_without_ext: String,
}

impl DocumentVariables {
    /// An absent project root resolves to the empty string.
    pub fn new(project_root: Option<&Path>, document_path: &Path) -> Self {
        let project_root = project_root
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let current_file_dir = document_path
            .parent()
            .map(|p| p.to_string_lossy().into_owned())
            .unwrap_or_default();
        let current_file_name = document_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let current_file_name_without_ext = document_path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            project_root,
            current_file_dir,
            current_file_name,
            current_file_name_without_ext,
        }
    }

    /// Substitute the document placeholders in order: project root, file dir, file
    /// name, file name without extension.
    pub fn apply(&self, template: &str) -> String {
        self.apply_with(template, |value| value.to_string())
    }

    /// Like [`apply`](Self::apply) but passes every substituted value through `post`
    /// first. The default-name pattern uses this to bracket values so the timestamp
    /// formatter treats them as literals.
    pub fn apply_with<F>(&self, template: &str, post: F) -> String
    where
        F: Fn(&str) -> String,
    {
        let passes = [
            (Placeholder::ProjectRoot, &self.project_root),
            (Placeholder::CurrentFileDir, &self.current_file_dir),
            (Placeholder::CurrentFileName, &self.current_file_name),
            (
                Placeholder::CurrentFileNameWithoutExt,
                &self.current_file_name_without_ext,
            ),
        ];

        passes
            .into_iter()
            .fold(template.to_string(), |acc, (placeholder, value)| {
                substitute(&acc, placeholder, &post(value))
            })
    }
}

fn token_regex() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"\$\{([A-Za-z]+)\}").expect("static regex"))
}

/// Names of `${...}` tokens in `template` that are not known placeholders.
pub fn unknown_placeholders(template: &str) -> Vec<String> {
    token_regex()
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|name| Placeholder::from_name(name).is_none())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "template_tests.rs"]
mod tests;

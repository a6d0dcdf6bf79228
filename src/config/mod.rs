use crate::console::VerbosityLevel;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::{
    fs,
    path::{Path, PathBuf},
};

mod error;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use settings::{CloudSettings, Settings, unknown_placeholder_warnings};

pub const DEFAULT_NAME_PATTERN: &str = "Y-MM-DD-HH-mm-ss";
pub const DEFAULT_FOLDER_PATH: &str = "${currentFileDir}";
pub const DEFAULT_INSERT_PATTERN: &str = "${imageSyntaxPrefix}${imageFilePath}${imageSyntaxSuffix}";
pub const PROJECT_CONFIG_FILE: &str = ".paste-image.toml";
pub const CONFIG_PATH_ENV: &str = "PASTE_IMAGE_CONFIG";

/// How the rendered image path is escaped before insertion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EncodeMode {
    None,
    UrlEncode,
    #[default]
    UrlEncodeSpace,
}

/// What the filename confirmation prompt lets the user edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConfirmMode {
    OnlyName,
    #[default]
    FullPath,
}

/// Which mechanism reads the clipboard image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CaptureBackend {
    #[default]
    Script,
    Native,
}

impl fmt::Display for EncodeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeMode::None => write!(f, "none"),
            EncodeMode::UrlEncode => write!(f, "urlEncode"),
            EncodeMode::UrlEncodeSpace => write!(f, "urlEncodeSpace"),
        }
    }
}

impl FromStr for EncodeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(EncodeMode::None),
            "urlEncode" => Ok(EncodeMode::UrlEncode),
            "urlEncodeSpace" => Ok(EncodeMode::UrlEncodeSpace),
            _ => Err(invalid("encodePath", s)),
        }
    }
}

impl fmt::Display for ConfirmMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfirmMode::OnlyName => write!(f, "onlyName"),
            ConfirmMode::FullPath => write!(f, "fullPath"),
        }
    }
}

impl FromStr for ConfirmMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "onlyName" => Ok(ConfirmMode::OnlyName),
            "fullPath" => Ok(ConfirmMode::FullPath),
            _ => Err(invalid("filePathConfirmInputBoxMode", s)),
        }
    }
}

impl fmt::Display for CaptureBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureBackend::Script => write!(f, "script"),
            CaptureBackend::Native => write!(f, "native"),
        }
    }
}

impl FromStr for CaptureBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "script" => Ok(CaptureBackend::Script),
            "native" => Ok(CaptureBackend::Native),
            _ => Err(invalid("captureBackend", s)),
        }
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub default_name: String,
    pub path: String,
    pub base_path: String,
    pub prefix: String,
    pub suffix: String,
    pub force_unix_style_separator: bool,
    pub encode_path: EncodeMode,
    pub name_prefix: String,
    pub name_suffix: String,
    pub insert_pattern: String,
    pub show_file_path_confirm_input_box: bool,
    pub file_path_confirm_input_box_mode: ConfirmMode,
    pub azure_is_upload_storage: bool,
    pub azure_storage_connection_string: String,
    pub azure_storage_container_name: String,
    pub capture_backend: CaptureBackend,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub script_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verbosity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            default_name: DEFAULT_NAME_PATTERN.to_string(),
            path: DEFAULT_FOLDER_PATH.to_string(),
            base_path: String::new(),
            prefix: String::new(),
            suffix: String::new(),
            force_unix_style_separator: false,
            encode_path: EncodeMode::default(),
            name_prefix: String::new(),
            name_suffix: String::new(),
            insert_pattern: DEFAULT_INSERT_PATTERN.to_string(),
            show_file_path_confirm_input_box: false,
            file_path_confirm_input_box_mode: ConfirmMode::default(),
            azure_is_upload_storage: false,
            azure_storage_connection_string: String::new(),
            azure_storage_container_name: String::new(),
            capture_backend: CaptureBackend::default(),
            script_dir: None,
            verbosity: None,
            log_file: None,
        }
    }
}

/// Per-project overrides read from `.paste-image.toml`. Only keys that are present
/// replace the global value.
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    pub default_name: Option<String>,
    pub path: Option<String>,
    pub base_path: Option<String>,
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub force_unix_style_separator: Option<bool>,
    pub encode_path: Option<EncodeMode>,
    pub name_prefix: Option<String>,
    pub name_suffix: Option<String>,
    pub insert_pattern: Option<String>,
    pub show_file_path_confirm_input_box: Option<bool>,
    pub file_path_confirm_input_box_mode: Option<ConfirmMode>,
    pub azure_is_upload_storage: Option<bool>,
    pub azure_storage_connection_string: Option<String>,
    pub azure_storage_container_name: Option<String>,
    pub capture_backend: Option<CaptureBackend>,
    pub script_dir: Option<PathBuf>,
}

impl ProjectConfig {
    pub fn load(project_root: &Path) -> ConfigResult<Option<Self>> {
        let path = project_root.join(PROJECT_CONFIG_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        let config = toml::from_str(&content)
            .map_err(|source| ConfigError::InvalidToml { path, source })?;
        Ok(Some(config))
    }
}

impl AppConfig {
    /// Load the global configuration, falling back to defaults when no file exists.
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|source| ConfigError::InvalidToml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load the global configuration and layer the project file on top of it.
    pub fn load_for_project(project_root: Option<&Path>) -> ConfigResult<Self> {
        let mut config = Self::load()?;
        if let Some(root) = project_root {
            if let Some(project) = ProjectConfig::load(root)? {
                config.merge_project(project);
            }
        }
        Ok(config)
    }

    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializationError(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn merge_project(&mut self, project: ProjectConfig) {
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = project.$field {
                    self.$field = value;
                })*
            };
        }

        take!(
            default_name,
            path,
            base_path,
            prefix,
            suffix,
            force_unix_style_separator,
            encode_path,
            name_prefix,
            name_suffix,
            insert_pattern,
            show_file_path_confirm_input_box,
            file_path_confirm_input_box_mode,
            azure_is_upload_storage,
            azure_storage_connection_string,
            azure_storage_container_name,
            capture_backend,
        );
        if project.script_dir.is_some() {
            self.script_dir = project.script_dir;
        }
    }

    /// Update a single key from its textual form, as given to `config set`.
    pub fn set_value(&mut self, key: &str, value: &str) -> ConfigResult<()> {
        let parse_bool = |value: &str| {
            value
                .parse::<bool>()
                .map_err(|_| invalid(key, value))
        };

        match key {
            "defaultName" => self.default_name = value.to_string(),
            "path" => self.path = value.to_string(),
            "basePath" => self.base_path = value.to_string(),
            "prefix" => self.prefix = value.to_string(),
            "suffix" => self.suffix = value.to_string(),
            "forceUnixStyleSeparator" => self.force_unix_style_separator = parse_bool(value)?,
            "encodePath" => self.encode_path = value.parse()?,
            "namePrefix" => self.name_prefix = value.to_string(),
            "nameSuffix" => self.name_suffix = value.to_string(),
            "insertPattern" => self.insert_pattern = value.to_string(),
            "showFilePathConfirmInputBox" => {
                self.show_file_path_confirm_input_box = parse_bool(value)?
            }
            "filePathConfirmInputBoxMode" => self.file_path_confirm_input_box_mode = value.parse()?,
            "azureIsUploadStorage" => self.azure_is_upload_storage = parse_bool(value)?,
            "azureStorageConnectionString" => {
                self.azure_storage_connection_string = value.to_string()
            }
            "azureStorageContainerName" => self.azure_storage_container_name = value.to_string(),
            "captureBackend" => self.capture_backend = value.parse()?,
            "scriptDir" => self.script_dir = Some(PathBuf::from(value)),
            "logFile" => self.log_file = Some(PathBuf::from(value)),
            "verbosity" => {
                if parse_verbosity(value).is_none() {
                    return Err(invalid(key, value));
                }
                self.verbosity = Some(value.to_string());
            }
            _ => {
                return Err(ConfigError::UnknownConfigKey {
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Get the configured verbosity level, falling back to Normal if not set
    pub fn get_verbosity(&self) -> VerbosityLevel {
        self.verbosity
            .as_deref()
            .and_then(parse_verbosity)
            .unwrap_or(VerbosityLevel::Normal)
    }

    /// The connection string with its secrets replaced, for display.
    pub fn masked_connection_string(&self) -> String {
        mask_secrets(&self.azure_storage_connection_string)
    }

    pub fn config_path() -> ConfigResult<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Ok(PathBuf::from(path));
        }
        let path = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .map_err(|_| ConfigError::NoHomeDirectory)?;
        let mut path = PathBuf::from(path);
        path.push(".config");
        path.push("paste-image");
        path.push("config.toml");
        Ok(path)
    }
}

fn parse_verbosity(value: &str) -> Option<VerbosityLevel> {
    match value {
        "quiet" => Some(VerbosityLevel::Quiet),
        "normal" => Some(VerbosityLevel::Normal),
        "verbose" => Some(VerbosityLevel::Verbose),
        "debug" => Some(VerbosityLevel::Debug),
        _ => None,
    }
}

fn mask_secrets(connection_string: &str) -> String {
    connection_string
        .split(';')
        .map(|pair| match pair.split_once('=') {
            Some((key, value))
                if key.eq_ignore_ascii_case("AccountKey")
                    || key.eq_ignore_ascii_case("SharedAccessSignature") =>
            {
                let chars: Vec<char> = value.chars().collect();
                let masked = if chars.len() > 8 {
                    let head: String = chars[..4].iter().collect();
                    let tail: String = chars[chars.len() - 4..].iter().collect();
                    format!("{}...{}", head, tail)
                } else {
                    "***".to_string()
                };
                format!("{}={}", key, masked)
            }
            _ => pair.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;

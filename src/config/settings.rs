use super::{
    AppConfig, CaptureBackend, ConfigError, ConfigResult, ConfirmMode, EncodeMode,
    DEFAULT_FOLDER_PATH, DEFAULT_INSERT_PATTERN, DEFAULT_NAME_PATTERN,
};
use crate::console::console;
use crate::document::DocumentContext;
use crate::storage::ConnectionString;
use crate::template::unknown_placeholders;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct CloudSettings {
    pub connection_string: String,
    pub container_name: String,
}

/// Immutable configuration snapshot for one paste operation, with every document
/// placeholder already substituted.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub default_name: String,
    pub folder_path: String,
    pub base_path: String,
    pub prefix: String,
    pub suffix: String,
    pub force_unix_style_separator: bool,
    pub encode_path: EncodeMode,
    pub name_prefix: String,
    pub name_suffix: String,
    pub insert_pattern: String,
    pub confirm_before_save: bool,
    pub confirm_mode: ConfirmMode,
    pub cloud: Option<CloudSettings>,
    pub capture_backend: CaptureBackend,
    pub script_dir: Option<PathBuf>,
}

impl Settings {
    /// Validate `config` and resolve it against the active document.
    pub fn resolve(config: &AppConfig, document: &DocumentContext) -> ConfigResult<Self> {
        let default_name = or_default(&config.default_name, DEFAULT_NAME_PATTERN);
        let folder_path = or_default(&config.path, DEFAULT_FOLDER_PATH);
        let insert_pattern = or_default(&config.insert_pattern, DEFAULT_INSERT_PATTERN);

        reject_padded("path", folder_path)?;
        reject_padded("basePath", &config.base_path)?;

        let cloud = if config.azure_is_upload_storage {
            Some(validate_cloud(config)?)
        } else {
            None
        };

        for warning in unknown_placeholder_warnings(config) {
            console().warning(&warning);
        }

        let vars = document.variables();

        Ok(Self {
            // Bracketed values are literals to the timestamp formatter.
            default_name: vars.apply_with(default_name, |v| format!("[{}]", v)),
            folder_path: vars.apply(folder_path),
            base_path: vars.apply(&config.base_path),
            prefix: config.prefix.clone(),
            suffix: config.suffix.clone(),
            force_unix_style_separator: config.force_unix_style_separator,
            encode_path: config.encode_path,
            name_prefix: vars.apply(&config.name_prefix),
            name_suffix: vars.apply(&config.name_suffix),
            insert_pattern: vars.apply(insert_pattern),
            confirm_before_save: config.show_file_path_confirm_input_box,
            confirm_mode: config.file_path_confirm_input_box_mode,
            cloud,
            capture_backend: config.capture_backend,
            script_dir: config.script_dir.clone(),
        })
    }

    pub fn is_cloud(&self) -> bool {
        self.cloud.is_some()
    }
}

/// One message per `${...}` token in a templated key that names no placeholder.
/// Such tokens are left in the output verbatim.
pub fn unknown_placeholder_warnings(config: &AppConfig) -> Vec<String> {
    [
        ("defaultName", &config.default_name),
        ("path", &config.path),
        ("basePath", &config.base_path),
        ("namePrefix", &config.name_prefix),
        ("nameSuffix", &config.name_suffix),
        ("insertPattern", &config.insert_pattern),
    ]
    .into_iter()
    .flat_map(|(key, template)| {
        unknown_placeholders(template)
            .into_iter()
            .map(move |name| format!("Unknown placeholder ${{{}}} in '{}' is left as is.", name, key))
    })
    .collect()
}

fn or_default<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.is_empty() { default } else { value }
}

fn reject_padded(key: &str, value: &str) -> ConfigResult<()> {
    if value.len() != value.trim().len() {
        return Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        });
    }
    Ok(())
}

fn validate_cloud(config: &AppConfig) -> ConfigResult<CloudSettings> {
    let container_name = &config.azure_storage_container_name;
    if container_name.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "azureStorageContainerName".to_string(),
            value: container_name.clone(),
        });
    }
    reject_padded("azureStorageContainerName", container_name)?;

    let connection_string = &config.azure_storage_connection_string;
    if connection_string.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "azureStorageConnectionString".to_string(),
            value: String::new(),
        });
    }
    if connection_string.len() != connection_string.trim().len() {
        return Err(ConfigError::InvalidValue {
            key: "azureStorageConnectionString".to_string(),
            value: config.masked_connection_string(),
        });
    }

    ConnectionString::parse(connection_string).map_err(|e| {
        ConfigError::InvalidConnectionString {
            message: e.to_string(),
        }
    })?;

    Ok(CloudSettings {
        connection_string: connection_string.clone(),
        container_name: container_name.clone(),
    })
}

// Tests focus on defaults, TOML shape, project overrides, and per-operation resolution

use super::*;
use crate::document::DocumentContext;
use tempfile::tempdir;

const CONNECTION_STRING: &str = "DefaultEndpointsProtocol=https;AccountName=myaccount;AccountKey=c2VjcmV0LWtleS12YWx1ZQ==;EndpointSuffix=core.windows.net";

fn doc() -> DocumentContext {
    DocumentContext::new("/proj/docs/guide.md").with_project_root(Some(PathBuf::from("/proj")))
}

#[test]
fn default_config_matches_documented_defaults() {
    let config = AppConfig::default();

    assert_eq!(config.default_name, "Y-MM-DD-HH-mm-ss");
    assert_eq!(config.path, "${currentFileDir}");
    assert_eq!(config.base_path, "");
    assert_eq!(config.insert_pattern, DEFAULT_INSERT_PATTERN);
    assert_eq!(config.encode_path, EncodeMode::UrlEncodeSpace);
    assert_eq!(config.file_path_confirm_input_box_mode, ConfirmMode::FullPath);
    assert!(!config.force_unix_style_separator);
    assert!(!config.azure_is_upload_storage);
}

#[test]
fn parses_camel_case_keys_and_keeps_defaults_for_missing() {
    let config: AppConfig = toml::from_str(
        r#"
        path = "assets"
        encodePath = "urlEncode"
        forceUnixStyleSeparator = true
        filePathConfirmInputBoxMode = "onlyName"
        "#,
    )
    .unwrap();

    assert_eq!(config.path, "assets");
    assert_eq!(config.encode_path, EncodeMode::UrlEncode);
    assert!(config.force_unix_style_separator);
    assert_eq!(config.file_path_confirm_input_box_mode, ConfirmMode::OnlyName);
    assert_eq!(config.default_name, DEFAULT_NAME_PATTERN);
}

#[test]
fn rejects_unknown_enum_values() {
    let result: Result<AppConfig, _> = toml::from_str(r#"encodePath = "base64""#);
    assert!(result.is_err());
}

#[test]
fn load_from_missing_file_returns_defaults() {
    let temp = tempdir().unwrap();
    let config = AppConfig::load_from(&temp.path().join("missing.toml")).unwrap();

    assert_eq!(config, AppConfig::default());
}

#[test]
fn save_then_load_preserves_values() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("nested").join("config.toml");

    let mut config = AppConfig::default();
    config.prefix = "/static/".to_string();
    config.capture_backend = CaptureBackend::Native;
    config.save_to(&path).unwrap();

    let loaded = AppConfig::load_from(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn invalid_toml_reports_the_file() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("config.toml");
    std::fs::write(&path, "path = [").unwrap();

    let err = AppConfig::load_from(&path).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidToml { .. }));
}

#[test]
fn project_config_overrides_only_present_keys() {
    let temp = tempdir().unwrap();
    std::fs::write(
        temp.path().join(PROJECT_CONFIG_FILE),
        "path = \"${projectRoot}/images\"\nnamePrefix = \"shot-\"\n",
    )
    .unwrap();

    let mut config = AppConfig::default();
    config.prefix = "global".to_string();
    let project = ProjectConfig::load(temp.path()).unwrap().unwrap();
    config.merge_project(project);

    assert_eq!(config.path, "${projectRoot}/images");
    assert_eq!(config.name_prefix, "shot-");
    assert_eq!(config.prefix, "global");
}

#[test]
fn project_config_absent_is_none() {
    let temp = tempdir().unwrap();
    assert!(ProjectConfig::load(temp.path()).unwrap().is_none());
}

#[test]
fn set_value_parses_typed_keys() {
    let mut config = AppConfig::default();

    config.set_value("forceUnixStyleSeparator", "true").unwrap();
    config.set_value("encodePath", "none").unwrap();
    config.set_value("filePathConfirmInputBoxMode", "onlyName").unwrap();
    config.set_value("verbosity", "debug").unwrap();

    assert!(config.force_unix_style_separator);
    assert_eq!(config.encode_path, EncodeMode::None);
    assert_eq!(config.file_path_confirm_input_box_mode, ConfirmMode::OnlyName);
    assert_eq!(config.get_verbosity(), VerbosityLevel::Debug);
}

#[test]
fn set_value_rejects_bad_input() {
    let mut config = AppConfig::default();

    assert!(matches!(
        config.set_value("forceUnixStyleSeparator", "yes"),
        Err(ConfigError::InvalidValue { .. })
    ));
    assert!(matches!(
        config.set_value("encodePath", "rot13"),
        Err(ConfigError::InvalidValue { .. })
    ));
    assert!(matches!(
        config.set_value("nope", "x"),
        Err(ConfigError::UnknownConfigKey { .. })
    ));
}

#[test]
fn verbosity_falls_back_to_normal() {
    let mut config = AppConfig::default();
    config.verbosity = Some("chatty".to_string());
    assert_eq!(config.get_verbosity(), VerbosityLevel::Normal);
}

#[test]
fn masks_connection_string_secrets() {
    let mut config = AppConfig::default();
    config.azure_storage_connection_string = CONNECTION_STRING.to_string();

    let masked = config.masked_connection_string();
    assert!(masked.contains("AccountName=myaccount"));
    assert!(masked.contains("AccountKey=c2Vj...ZQ=="));
    assert!(!masked.contains("c2VjcmV0LWtleS12YWx1ZQ=="));
}

#[test]
fn resolve_substitutes_document_variables() {
    let mut config = AppConfig::default();
    config.path = "${projectRoot}/assets".to_string();
    config.base_path = "${currentFileDir}".to_string();
    config.name_prefix = "${currentFileNameWithoutExt}-".to_string();

    let settings = Settings::resolve(&config, &doc()).unwrap();

    assert_eq!(settings.folder_path, "/proj/assets");
    assert_eq!(settings.base_path, "/proj/docs");
    assert_eq!(settings.name_prefix, "guide-");
    assert!(!settings.is_cloud());
}

#[test]
fn resolve_brackets_values_in_default_name() {
    let mut config = AppConfig::default();
    config.default_name = "${currentFileNameWithoutExt}-YYYY".to_string();

    let settings = Settings::resolve(&config, &doc()).unwrap();
    assert_eq!(settings.default_name, "[guide]-YYYY");
}

#[test]
fn resolve_falls_back_when_values_are_empty() {
    let mut config = AppConfig::default();
    config.default_name.clear();
    config.path.clear();
    config.insert_pattern.clear();

    let settings = Settings::resolve(&config, &doc()).unwrap();

    assert_eq!(settings.default_name, DEFAULT_NAME_PATTERN);
    assert_eq!(settings.folder_path, "/proj/docs");
    assert_eq!(settings.insert_pattern, DEFAULT_INSERT_PATTERN);
}

#[test]
fn resolve_rejects_padded_paths() {
    let mut config = AppConfig::default();
    config.path = " assets".to_string();

    let err = Settings::resolve(&config, &doc()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "path"));

    let mut config = AppConfig::default();
    config.base_path = "/proj ".to_string();
    let err = Settings::resolve(&config, &doc()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "basePath"));
}

#[test]
fn resolve_requires_cloud_credentials() {
    let mut config = AppConfig::default();
    config.azure_is_upload_storage = true;
    config.azure_storage_connection_string = CONNECTION_STRING.to_string();

    let err = Settings::resolve(&config, &doc()).unwrap_err();
    assert!(
        matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "azureStorageContainerName")
    );

    config.azure_storage_container_name = "Images".to_string();
    config.azure_storage_connection_string = "garbage".to_string();
    let err = Settings::resolve(&config, &doc()).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidConnectionString { .. }));
}

#[test]
fn resolve_accepts_valid_cloud_config() {
    let mut config = AppConfig::default();
    config.azure_is_upload_storage = true;
    config.azure_storage_connection_string = CONNECTION_STRING.to_string();
    config.azure_storage_container_name = "Images".to_string();

    let settings = Settings::resolve(&config, &doc()).unwrap();
    let cloud = settings.cloud.as_ref().unwrap();

    assert!(settings.is_cloud());
    assert_eq!(cloud.container_name, "Images");
}

#[test]
fn misspelled_placeholders_produce_warnings() {
    let mut config = AppConfig::default();
    config.path = "${projectroot}/assets".to_string();
    config.insert_pattern = "${imageSyntaxPrefix}${imagePath}${imageSyntaxSuffix}".to_string();

    assert_eq!(
        unknown_placeholder_warnings(&config),
        vec![
            "Unknown placeholder ${projectroot} in 'path' is left as is.".to_string(),
            "Unknown placeholder ${imagePath} in 'insertPattern' is left as is.".to_string(),
        ]
    );

    let settings = Settings::resolve(&config, &doc()).unwrap();
    assert_eq!(settings.folder_path, "${projectroot}/assets");
}

#[test]
fn default_config_has_no_placeholder_warnings() {
    assert!(unknown_placeholder_warnings(&AppConfig::default()).is_empty());
}

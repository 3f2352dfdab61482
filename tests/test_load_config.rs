use std::fs::write;
use tempfile::NamedTempFile;

use blog_auto_review_stack::config::DeploymentConfig;
use blog_auto_review_stack::load_config::{load_config, load_or_builtin};

/// A YAML file with the three deployment parameters loads verbatim.
#[test]
fn test_load_config_success() {
    let config_yaml = r#"
project_id: proj1
location: asia-northeast1
slack_channel_id: C123
"#;
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), config_yaml).unwrap();

    let config = load_config(config_file.path()).expect("Config should load");

    assert_eq!(
        config,
        DeploymentConfig {
            project_id: "proj1".into(),
            location: "asia-northeast1".into(),
            slack_channel_id: "C123".into(),
        }
    );
}

#[test]
fn test_load_config_missing_field_fails() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(config_file.path(), "project_id: proj1\nlocation: asia-northeast1\n").unwrap();

    let err = load_config(config_file.path()).unwrap_err();
    assert!(
        err.to_string().contains("Failed to parse config YAML"),
        "unexpected error: {err}"
    );
}

#[test]
fn test_load_config_missing_file_fails() {
    let err = load_config("/definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}

/// Values are taken as-is: nothing is validated or overlaid.
#[test]
fn test_load_config_does_not_validate_values() {
    let config_file = NamedTempFile::new().expect("temp file");
    write(
        config_file.path(),
        "project_id: \"\"\nlocation: nowhere-1\nslack_channel_id: \"not a channel\"\n",
    )
    .unwrap();

    let config = load_config(config_file.path()).unwrap();
    assert_eq!(config.project_id, "");
    assert_eq!(config.location, "nowhere-1");
}

#[test]
fn test_builtin_used_without_path() {
    let config = load_or_builtin(None).unwrap();
    assert_eq!(config, DeploymentConfig::builtin());
    assert_eq!(config.location, "asia-northeast1");
}

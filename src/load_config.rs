/// `load_config` module: reads a [`DeploymentConfig`] from a YAML file.
///
/// The file carries exactly the three fields of the static record. There is no validation and
/// no environment overlay; a missing file or malformed YAML is reported with context and the
/// CLI aborts.
///
/// ```yaml
/// project_id: my-project
/// location: asia-northeast1
/// slack_channel_id: C0123456
/// ```
use crate::config::DeploymentConfig;
use anyhow::Result;
use std::fs;
use std::path::Path;
use tracing::{error, info};

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DeploymentConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let config: DeploymentConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    config.trace_loaded();
    Ok(config)
}

/// Loads from `path` when given, otherwise falls back to [`DeploymentConfig::builtin`].
pub fn load_or_builtin(path: Option<&Path>) -> Result<DeploymentConfig> {
    match path {
        Some(p) => load_config(p),
        None => {
            let config = DeploymentConfig::builtin();
            info!("No config file given, using built-in deployment parameters");
            config.trace_loaded();
            Ok(config)
        }
    }
}

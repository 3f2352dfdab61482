// blog-auto-review-stack/src/config.rs

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info};

/// Deployment parameters for one environment of the pipeline.
///
/// Constructed once and passed by reference to the composer; nothing downstream mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentConfig {
    pub project_id: String,
    pub location: String,
    pub slack_channel_id: String,
}

impl DeploymentConfig {
    /// The built-in parameter set. Replace the placeholders before deploying.
    pub fn builtin() -> Self {
        Self {
            project_id: "your-project-id".to_string(),
            location: "asia-northeast1".to_string(),
            slack_channel_id: "your-slack-channel-id".to_string(),
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            project_id = %self.project_id,
            location = %self.location,
            "Loaded DeploymentConfig"
        );
        debug!(?self, "DeploymentConfig loaded (full debug)");
    }
}

/// Local filesystem locations the stack reads sources from and writes output to.
#[derive(Debug, Clone)]
pub struct StackPaths {
    /// Directory holding one subdirectory per function (`check-feed`, `auto-review`).
    pub functions_dir: PathBuf,
    /// Synthesis output root; archives and the Terraform JSON land under here.
    pub out_dir: PathBuf,
}

impl StackPaths {
    pub fn new(functions_dir: impl Into<PathBuf>, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            functions_dir: functions_dir.into(),
            out_dir: out_dir.into(),
        }
    }

    /// Where the zip for `function_name` is written.
    pub fn archive_path(&self, function_name: &str) -> PathBuf {
        self.out_dir
            .join("functions")
            .join("out")
            .join(format!("{function_name}.zip"))
    }
}

impl Default for StackPaths {
    fn default() -> Self {
        Self::new("functions", "cdktf.out")
    }
}

//! [`Provisioner`] backed by the `terraform` command line.
//!
//! Runs `init` then `plan` or `apply` inside the synthesized stack directory. Failures are
//! reported as-is; retry and backoff are the engine's business.

use crate::contract::{
    ProvisionAction, ProvisionError, ProvisionOutcome, Provisioner, SynthManifest,
};
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;
use tracing::{error, info};

#[derive(Debug, Clone)]
pub struct TerraformCli {
    binary: String,
}

impl TerraformCli {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Uses `TERRAFORM_BIN` when set, `terraform` from `PATH` otherwise.
    pub fn from_env() -> Self {
        let binary = std::env::var("TERRAFORM_BIN").unwrap_or_else(|_| "terraform".to_string());
        info!(binary = %binary, "Using terraform binary");
        Self::new(binary)
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    async fn run(&self, stack_dir: &Path, args: &[&str]) -> Result<String, ProvisionError> {
        info!(dir = %stack_dir.display(), ?args, "Running terraform");
        let output = Command::new(&self.binary)
            .arg(format!("-chdir={}", stack_dir.display()))
            .args(args)
            .output()
            .await
            .map_err(|e| {
                error!(error = ?e, binary = %self.binary, "Failed to launch terraform");
                e
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            error!(
                status = ?output.status,
                ?args,
                stderr = %stderr,
                "terraform exited with failure"
            );
            return Err(format!(
                "terraform {} exited with {}: {}",
                args.join(" "),
                output.status,
                stderr.trim()
            )
            .into());
        }
        Ok(stdout)
    }

    async fn init(&self, manifest: &SynthManifest) -> Result<(), ProvisionError> {
        self.run(&manifest.stack_dir, &["init", "-input=false", "-no-color"])
            .await
            .map(|_| ())
    }
}

impl Default for TerraformCli {
    fn default() -> Self {
        Self::new("terraform")
    }
}

#[async_trait]
impl Provisioner for TerraformCli {
    async fn plan(&self, manifest: &SynthManifest) -> Result<ProvisionOutcome, ProvisionError> {
        self.init(manifest).await?;
        let output = self
            .run(&manifest.stack_dir, &["plan", "-input=false", "-no-color"])
            .await?;
        Ok(ProvisionOutcome {
            action: ProvisionAction::Diff,
            stack_name: manifest.stack_name.clone(),
            output,
        })
    }

    async fn apply(&self, manifest: &SynthManifest) -> Result<ProvisionOutcome, ProvisionError> {
        self.init(manifest).await?;
        let output = self
            .run(
                &manifest.stack_dir,
                &["apply", "-auto-approve", "-input=false", "-no-color"],
            )
            .await?;
        info!(stack = %manifest.stack_name, "terraform apply complete");
        Ok(ProvisionOutcome {
            action: ProvisionAction::Deploy,
            stack_name: manifest.stack_name.clone(),
            output,
        })
    }
}

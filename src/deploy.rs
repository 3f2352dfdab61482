//! High-level pipeline: compose → synthesize → hand off.
//!
//! A run composes the stack from the deployment parameters, writes the Terraform JSON and, for
//! `Diff` and `Deploy`, passes it to the [`Provisioner`]. It is fail-fast: the first error ends
//! the run and nothing is retried. Re-running is safe because artifact keys are content hashes.

use crate::config::{DeploymentConfig, StackPaths};
use crate::contract::{ProvisionAction, ProvisionOutcome, Provisioner};
use crate::error::StackError;
use crate::stack::compose_stack;
use crate::synth::write_stack;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Debug)]
pub struct StackReport {
    pub stack_name: String,
    pub manifest_path: PathBuf,
    pub resource_count: usize,
    pub artifacts: Vec<ArtifactReport>,
    /// `None` for [`ProvisionAction::Synth`].
    pub provision: Option<ProvisionOutcome>,
}

#[derive(Debug)]
pub struct ArtifactReport {
    pub function_name: String,
    pub object_key: String,
    pub archive_path: PathBuf,
    /// Hex SHA-256 of the archive at `archive_path`.
    pub archive_sha256: String,
}

pub async fn run_stack<P>(
    config: &DeploymentConfig,
    paths: &StackPaths,
    provisioner: &P,
    action: ProvisionAction,
) -> Result<StackReport, StackError>
where
    P: Provisioner + ?Sized,
{
    info!(?action, "[STACK] Starting stack run");

    let stack = compose_stack(config, paths).map_err(|e| {
        error!(error = %e, "[STACK][ERROR] Composition failed");
        e
    })?;
    let manifest = write_stack(&stack.graph, config, &stack.name, &paths.out_dir)?;

    let artifacts = stack
        .functions()
        .iter()
        .map(|f| ArtifactReport {
            function_name: f.name.clone(),
            object_key: f.artifact.content_hash.clone(),
            archive_path: f.artifact.output_path.clone(),
            archive_sha256: f.artifact.output_sha256.clone(),
        })
        .collect();

    let provision = match action {
        ProvisionAction::Synth => None,
        ProvisionAction::Diff => Some(provisioner.plan(&manifest).await),
        ProvisionAction::Deploy => Some(provisioner.apply(&manifest).await),
    }
    .transpose()
    .map_err(|e| {
        error!(error = ?e, ?action, "[STACK][ERROR] Provisioning engine failed");
        StackError::Provision {
            action,
            message: e.to_string(),
        }
    })?;

    info!(
        stack = %manifest.stack_name,
        resources = manifest.resource_count,
        ?action,
        "[STACK] Stack run complete"
    );
    Ok(StackReport {
        stack_name: manifest.stack_name,
        manifest_path: manifest.manifest_path,
        resource_count: manifest.resource_count,
        artifacts,
        provision,
    })
}

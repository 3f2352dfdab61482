//! # contract: hand-off to the external provisioning engine
//!
//! The stack never talks to the cloud API. It writes a synthesized configuration and passes a
//! [`SynthManifest`] pointing at it to a [`Provisioner`], which owns diffing, apply ordering,
//! retries and partial-failure recovery.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall`; tests use `MockProvisioner` to assert what is handed
//!   over without a Terraform binary.

use async_trait::async_trait;
use mockall::automock;
use std::path::PathBuf;

/// What a CLI run asks of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionAction {
    /// Write the configuration only.
    Synth,
    /// Show what the engine would change.
    Diff,
    /// Reconcile cloud state to the configuration.
    Deploy,
}

/// Location and size of a synthesized stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthManifest {
    pub stack_name: String,
    /// Working directory the engine runs in.
    pub stack_dir: PathBuf,
    pub manifest_path: PathBuf,
    /// Number of engine resource blocks written.
    pub resource_count: usize,
}

/// Result of a plan or apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionOutcome {
    pub action: ProvisionAction,
    pub stack_name: String,
    /// Captured engine output.
    pub output: String,
}

pub type ProvisionError = Box<dyn std::error::Error + Send + Sync>;

/// External engine that consumes a synthesized stack.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Provisioner: Send + Sync {
    /// Compute the changes needed to reach the desired state, without applying them.
    async fn plan(&self, manifest: &SynthManifest) -> Result<ProvisionOutcome, ProvisionError>;

    /// Apply the desired state. Either every pending change lands or the run fails.
    async fn apply(&self, manifest: &SynthManifest) -> Result<ProvisionOutcome, ProvisionError>;
}

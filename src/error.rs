use crate::archive::ArchiveError;
use crate::contract::ProvisionAction;
use crate::graph::GraphError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StackError {
    #[error("packaging failed: {0}")]
    Archive(#[from] ArchiveError),
    #[error("invalid resource graph: {0}")]
    Graph(#[from] GraphError),
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize stack: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("provisioning engine failed during {action:?}: {message}")]
    Provision {
        action: ProvisionAction,
        message: String,
    },
}

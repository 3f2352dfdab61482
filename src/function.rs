//! Content-addressed cloud function unit.
//!
//! Turns a local source directory into three things in the graph's world: a zip archive on disk,
//! a storage object named after the archive's hash, and a function bound to that object. Because
//! the object key is the hash, re-running with unchanged sources declares an identical object and
//! the engine sees nothing to do; any source change produces a new key and therefore a function
//! update. There is no other versioning.
//!
//! The entry point is not checked against the packaged sources.

use crate::archive::{package_source, ArchiveSpec, SourceArtifact};
use crate::error::StackError;
use crate::graph::{ResourceRef, StackGraph};
use crate::resource::{CloudFunction, DesiredResource, EventTrigger, StorageObject};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{info, warn};

pub const RUNTIME: &str = "python312";
pub const ENTRY_POINT: &str = "main";
pub const AVAILABLE_CPU: &str = "1";
pub const AVAILABLE_MEMORY: &str = "1024M";
pub const PROJECT_ID_VAR: &str = "PROJECT_ID";

#[derive(Debug, Clone)]
pub struct CloudFunctionProps {
    pub source_dir: PathBuf,
    /// Defaults to the last component of `source_dir`.
    pub function_name: Option<String>,
    pub archive_path: PathBuf,
    pub bucket: ResourceRef,
    pub location: String,
    pub project_id: String,
    pub environment_variables: BTreeMap<String, String>,
    pub event_trigger: Option<EventTrigger>,
    /// Extra ordering edges, for resources the function only uses at runtime.
    pub depends_on: Vec<ResourceRef>,
}

/// Handles and artifact produced by [`declare_cloud_function`].
#[derive(Debug, Clone)]
pub struct DeployedFunction {
    pub name: String,
    pub function: ResourceRef,
    pub object: ResourceRef,
    pub artifact: SourceArtifact,
}

/// `PROJECT_ID` plus `extra`. A caller-supplied `PROJECT_ID` is ignored.
pub fn merge_environment(
    project_id: &str,
    extra: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut merged = extra.clone();
    if let Some(previous) = merged.insert(PROJECT_ID_VAR.to_string(), project_id.to_string()) {
        if previous != project_id {
            warn!(
                attempted = %previous,
                project_id = %project_id,
                "Ignoring caller-supplied PROJECT_ID"
            );
        }
    }
    merged
}

fn default_name(props: &CloudFunctionProps) -> String {
    props
        .source_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "function".to_string())
}

/// Packages `props.source_dir` and declares its storage object and function under `id`.
///
/// Logical ids are `{id}_source_object` and `{id}`.
pub fn declare_cloud_function(
    graph: &mut StackGraph,
    id: &str,
    props: CloudFunctionProps,
) -> Result<DeployedFunction, StackError> {
    let name = props
        .function_name
        .clone()
        .unwrap_or_else(|| default_name(&props));
    info!(function = %name, source_dir = %props.source_dir.display(), "Declaring cloud function");

    let artifact = package_source(&ArchiveSpec::new(&props.source_dir, &props.archive_path))?;

    let object = graph.declare(
        &format!("{id}_source_object"),
        DesiredResource::Object(StorageObject {
            bucket: props.bucket.clone(),
            key: artifact.content_hash.clone(),
            source: artifact.output_path.clone(),
        }),
        &[],
    )?;

    let function = graph.declare(
        id,
        DesiredResource::Function(CloudFunction {
            name: name.clone(),
            location: props.location.clone(),
            runtime: RUNTIME.to_string(),
            entry_point: ENTRY_POINT.to_string(),
            bucket: props.bucket.clone(),
            source_object: object.clone(),
            available_cpu: AVAILABLE_CPU.to_string(),
            available_memory: AVAILABLE_MEMORY.to_string(),
            environment_variables: merge_environment(
                &props.project_id,
                &props.environment_variables,
            ),
            event_trigger: props.event_trigger,
        }),
        &props.depends_on,
    )?;

    info!(
        function = %name,
        object_key = %artifact.content_hash,
        "Cloud function declared"
    );
    Ok(DeployedFunction {
        name,
        function,
        object,
        artifact,
    })
}

//! Renders a [`StackGraph`] as Terraform JSON configuration.
//!
//! Every resource becomes a block under `resource.<type>.<logical id>`. Cross-resource values are
//! `${type.id.attr}` interpolations and every graph edge is repeated in `depends_on`.

use crate::config::DeploymentConfig;
use crate::contract::SynthManifest;
use crate::error::StackError;
use crate::graph::{Node, StackGraph};
use crate::resource::DesiredResource;
use serde_json::{json, Map, Value};
use std::fs;
use std::path::Path;
use tracing::info;

pub const MANIFEST_FILE: &str = "cdk.tf.json";
pub const GOOGLE_PROVIDER_SOURCE: &str = "hashicorp/google";
pub const GOOGLE_PROVIDER_VERSION: &str = "~> 6.0";

/// `(terraform type, logical id, body)` blocks for one node.
fn render_node(node: &Node) -> Vec<(&'static str, String, Value)> {
    let id = node.handle.logical_id().to_string();
    let ty = node.handle.kind().terraform_type();
    let mut blocks = Vec::new();

    let mut body = match &node.resource {
        DesiredResource::Bucket(b) => json!({
            "name": b.name,
            "location": b.location,
            "uniform_bucket_level_access": b.uniform_bucket_level_access,
        }),
        DesiredResource::Object(o) => json!({
            "name": o.key,
            "bucket": o.bucket.attr("name"),
            "source": o.source.to_string_lossy(),
        }),
        DesiredResource::Topic(t) => json!({
            "name": t.name,
            "message_retention_duration": t.message_retention_duration,
        }),
        DesiredResource::Function(f) => {
            let mut body = json!({
                "name": f.name,
                "location": f.location,
                "build_config": {
                    "entry_point": f.entry_point,
                    "runtime": f.runtime,
                    "source": {
                        "storage_source": {
                            "bucket": f.bucket.attr("name"),
                            "object": f.source_object.attr("name"),
                        }
                    }
                },
                "service_config": {
                    "available_cpu": f.available_cpu,
                    "available_memory": f.available_memory,
                    "environment_variables": f.environment_variables,
                },
            });
            if let Some(trigger) = &f.event_trigger {
                body["event_trigger"] = json!({
                    "event_type": trigger.event_type,
                    "pubsub_topic": trigger.pubsub_topic.attr("id"),
                    "trigger_region": trigger.trigger_region,
                    "retry_policy": trigger.retry_policy.as_str(),
                });
            }
            body
        }
        DesiredResource::Schedule(s) => json!({
            "name": s.name,
            "project": s.project,
            "region": s.region,
            "schedule": s.schedule,
            "time_zone": s.time_zone,
            "http_target": {
                "uri": s.http_target.uri,
                "http_method": s.http_target.http_method.as_str(),
                "oidc_token": {
                    "service_account_email": s.http_target.oidc_service_account.attr("email"),
                }
            }
        }),
        DesiredResource::Secret(s) => {
            blocks.push((
                "google_secret_manager_secret_version",
                format!("{id}_version"),
                json!({
                    "secret": node.handle.attr("id"),
                    "secret_data": s.initial_value,
                    "lifecycle": { "ignore_changes": "all" },
                    "depends_on": [node.handle.address()],
                }),
            ));
            json!({
                "secret_id": s.secret_id,
                "replication": { "auto": {} },
            })
        }
        DesiredResource::Identity(a) => json!({
            "account_id": a.account_id,
            "display_name": a.display_name,
        }),
        DesiredResource::Binding(b) => json!({
            "project": b.project,
            "role": b.role,
            "member": b.member.attr("member"),
        }),
    };

    if !node.depends_on.is_empty() {
        body["depends_on"] = Value::from(
            node.depends_on
                .iter()
                .map(|d| d.address())
                .collect::<Vec<_>>(),
        );
    }
    blocks.insert(0, (ty, id, body));
    blocks
}

/// Terraform JSON for `graph`, with the Google provider pinned to `config.project_id`.
pub fn synthesize(graph: &StackGraph, config: &DeploymentConfig, stack_name: &str) -> Value {
    let mut resources: Map<String, Value> = Map::new();
    for node in graph.nodes() {
        for (ty, id, body) in render_node(node) {
            let by_type = resources
                .entry(ty.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(map) = by_type {
                map.insert(id, body);
            }
        }
    }

    json!({
        "//": {
            "metadata": { "stackName": stack_name }
        },
        "terraform": {
            "required_providers": {
                "google": {
                    "source": GOOGLE_PROVIDER_SOURCE,
                    "version": GOOGLE_PROVIDER_VERSION,
                }
            }
        },
        "provider": {
            "google": [{ "project": config.project_id }]
        },
        "resource": resources,
    })
}

/// Number of resource blocks in a synthesized document.
pub fn count_resources(doc: &Value) -> usize {
    doc.get("resource")
        .and_then(Value::as_object)
        .map(|by_type| {
            by_type
                .values()
                .filter_map(Value::as_object)
                .map(Map::len)
                .sum()
        })
        .unwrap_or(0)
}

/// Synthesizes `graph` into `{out_dir}/stacks/{stack_name}/cdk.tf.json`.
pub fn write_stack(
    graph: &StackGraph,
    config: &DeploymentConfig,
    stack_name: &str,
    out_dir: &Path,
) -> Result<SynthManifest, StackError> {
    let doc = synthesize(graph, config, stack_name);
    let stack_dir = out_dir.join("stacks").join(stack_name);
    fs::create_dir_all(&stack_dir).map_err(|source| StackError::Io {
        path: stack_dir.clone(),
        source,
    })?;

    let manifest_path = stack_dir.join(MANIFEST_FILE);
    let rendered = serde_json::to_string_pretty(&doc)?;
    fs::write(&manifest_path, rendered).map_err(|source| StackError::Io {
        path: manifest_path.clone(),
        source,
    })?;

    let resource_count = count_resources(&doc);
    info!(
        path = %manifest_path.display(),
        resources = resource_count,
        "Synthesized stack"
    );
    Ok(SynthManifest {
        stack_name: stack_name.to_string(),
        stack_dir,
        manifest_path,
        resource_count,
    })
}

//! The closed set of resources the stack can ask the provisioning engine for.

use crate::graph::ResourceRef;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Bucket,
    Object,
    Topic,
    Function,
    Schedule,
    Secret,
    Identity,
    Binding,
}

impl ResourceKind {
    pub fn terraform_type(&self) -> &'static str {
        match self {
            ResourceKind::Bucket => "google_storage_bucket",
            ResourceKind::Object => "google_storage_bucket_object",
            ResourceKind::Topic => "google_pubsub_topic",
            ResourceKind::Function => "google_cloudfunctions2_function",
            ResourceKind::Schedule => "google_cloud_scheduler_job",
            ResourceKind::Secret => "google_secret_manager_secret",
            ResourceKind::Identity => "google_service_account",
            ResourceKind::Binding => "google_project_iam_member",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DesiredResource {
    Bucket(StorageBucket),
    Object(StorageObject),
    Topic(PubsubTopic),
    Function(CloudFunction),
    Schedule(SchedulerJob),
    Secret(SecretPlaceholder),
    Identity(ServiceAccount),
    Binding(ProjectIamMember),
}

impl DesiredResource {
    pub fn kind(&self) -> ResourceKind {
        match self {
            DesiredResource::Bucket(_) => ResourceKind::Bucket,
            DesiredResource::Object(_) => ResourceKind::Object,
            DesiredResource::Topic(_) => ResourceKind::Topic,
            DesiredResource::Function(_) => ResourceKind::Function,
            DesiredResource::Schedule(_) => ResourceKind::Schedule,
            DesiredResource::Secret(_) => ResourceKind::Secret,
            DesiredResource::Identity(_) => ResourceKind::Identity,
            DesiredResource::Binding(_) => ResourceKind::Binding,
        }
    }

    /// Handles this resource reads attributes from. Each one is a dependency edge.
    pub fn references(&self) -> Vec<&ResourceRef> {
        match self {
            DesiredResource::Object(o) => vec![&o.bucket],
            DesiredResource::Function(f) => {
                let mut refs = vec![&f.bucket, &f.source_object];
                if let Some(trigger) = &f.event_trigger {
                    refs.push(&trigger.pubsub_topic);
                }
                refs
            }
            DesiredResource::Schedule(s) => vec![&s.http_target.oidc_service_account],
            DesiredResource::Binding(b) => vec![&b.member],
            DesiredResource::Bucket(_)
            | DesiredResource::Topic(_)
            | DesiredResource::Secret(_)
            | DesiredResource::Identity(_) => Vec::new(),
        }
    }

    pub fn as_function(&self) -> Option<&CloudFunction> {
        match self {
            DesiredResource::Function(f) => Some(f),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageBucket {
    pub name: String,
    pub location: String,
    pub uniform_bucket_level_access: bool,
}

/// An uploaded archive. `key` is the archive's content hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageObject {
    pub bucket: ResourceRef,
    pub key: String,
    pub source: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PubsubTopic {
    pub name: String,
    /// Duration string such as `600s`.
    pub message_retention_duration: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    Unspecified,
    DoNotRetry,
    Retry,
}

impl RetryPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryPolicy::Unspecified => "RETRY_POLICY_UNSPECIFIED",
            RetryPolicy::DoNotRetry => "RETRY_POLICY_DO_NOT_RETRY",
            RetryPolicy::Retry => "RETRY_POLICY_RETRY",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTrigger {
    pub event_type: String,
    pub pubsub_topic: ResourceRef,
    pub trigger_region: String,
    pub retry_policy: RetryPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudFunction {
    pub name: String,
    pub location: String,
    pub runtime: String,
    pub entry_point: String,
    pub bucket: ResourceRef,
    pub source_object: ResourceRef,
    pub available_cpu: String,
    pub available_memory: String,
    pub environment_variables: BTreeMap<String, String>,
    pub event_trigger: Option<EventTrigger>,
}

/// A secret whose real value is set by hand. `initial_value` is a sentinel, and the engine is
/// told to ignore every later change to the version holding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretPlaceholder {
    pub secret_id: String,
    pub initial_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceAccount {
    pub account_id: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectIamMember {
    pub project: String,
    pub role: String,
    pub member: ResourceRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpTarget {
    pub uri: String,
    pub http_method: HttpMethod,
    /// Account whose OIDC identity token authenticates the call.
    pub oidc_service_account: ResourceRef,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerJob {
    pub name: String,
    pub project: String,
    pub region: String,
    /// Cron expression.
    pub schedule: String,
    pub time_zone: String,
    pub http_target: HttpTarget,
}

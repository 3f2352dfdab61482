//! Composes the blog auto-review stack.
//!
//! Declaration order is the dependency order: topic before both functions, check function before
//! the schedule job that calls it, invoker identity and its role binding before the job.

use crate::config::{DeploymentConfig, StackPaths};
use crate::error::StackError;
use crate::function::{declare_cloud_function, CloudFunctionProps, DeployedFunction};
use crate::graph::StackGraph;
use crate::resource::{
    DesiredResource, EventTrigger, HttpMethod, HttpTarget, ProjectIamMember, PubsubTopic,
    RetryPolicy, SchedulerJob, SecretPlaceholder, ServiceAccount, StorageBucket,
};
use std::collections::BTreeMap;
use tracing::info;

pub const STACK_NAME: &str = "blog_auto_review";

pub const SOURCE_BUCKET_NAME: &str = "blog-autoreview-src-bucket";
pub const TOPIC_NAME: &str = "blog-auto-review-new-blog";
pub const TOPIC_RETENTION: &str = "600s";
pub const CHECK_FEED_DIR: &str = "check-feed";
pub const CHECK_FEED_FUNCTION: &str = "blog-auto-review-check-feed";
pub const REVIEW_DIR: &str = "auto-review";
pub const REVIEW_FUNCTION: &str = "blog-auto-review";
pub const PUBSUB_PUBLISHED_EVENT: &str = "google.cloud.pubsub.topic.v1.messagePublished";
pub const SLACK_TOKEN_SECRET_ID: &str = "blog-auto-review-slack-bot-token";
pub const SECRET_SENTINEL: &str = "set me manually";
pub const INVOKER_ACCOUNT_ID: &str = "feed-check-invoker";
pub const INVOKER_DISPLAY_NAME: &str = "Feed Check Invoker Service Account";
pub const INVOKER_ROLE: &str = "roles/run.invoker";
pub const SCHEDULER_JOB_NAME: &str = "blog-auto-review-scheduler";
pub const SCHEDULE: &str = "0 * * * *";
pub const SCHEDULE_TIME_ZONE: &str = "Asia/Tokyo";

/// The composed graph plus the two packaged functions.
#[derive(Debug, Clone)]
pub struct ComposedStack {
    pub name: String,
    pub graph: StackGraph,
    pub check_feed: DeployedFunction,
    pub review: DeployedFunction,
}

impl ComposedStack {
    pub fn functions(&self) -> [&DeployedFunction; 2] {
        [&self.check_feed, &self.review]
    }
}

/// HTTPS endpoint of a 2nd gen function, as called by the scheduler.
pub fn function_uri(location: &str, project_id: &str, function_name: &str) -> String {
    format!("https://{location}-{project_id}.cloudfunctions.net/{function_name}")
}

pub fn compose_stack(
    config: &DeploymentConfig,
    paths: &StackPaths,
) -> Result<ComposedStack, StackError> {
    info!(
        stack = STACK_NAME,
        project_id = %config.project_id,
        location = %config.location,
        "[STACK] Composing stack"
    );
    let mut graph = StackGraph::new();

    let bucket = graph.declare(
        "src_bucket",
        DesiredResource::Bucket(StorageBucket {
            name: SOURCE_BUCKET_NAME.to_string(),
            location: config.location.clone(),
            uniform_bucket_level_access: true,
        }),
        &[],
    )?;

    let topic = graph.declare(
        "new_blog",
        DesiredResource::Topic(PubsubTopic {
            name: TOPIC_NAME.to_string(),
            message_retention_duration: TOPIC_RETENTION.to_string(),
        }),
        &[],
    )?;

    let check_feed = declare_cloud_function(
        &mut graph,
        "blog_feed",
        CloudFunctionProps {
            source_dir: paths.functions_dir.join(CHECK_FEED_DIR),
            function_name: Some(CHECK_FEED_FUNCTION.to_string()),
            archive_path: paths.archive_path(CHECK_FEED_FUNCTION),
            bucket: bucket.clone(),
            location: config.location.clone(),
            project_id: config.project_id.clone(),
            environment_variables: BTreeMap::from([(
                "TOPIC_NAME".to_string(),
                TOPIC_NAME.to_string(),
            )]),
            event_trigger: None,
            depends_on: vec![topic.clone()],
        },
    )?;
    info!(function = %check_feed.name, "[STACK] Check-feed function declared");

    let review = declare_cloud_function(
        &mut graph,
        "auto_review",
        CloudFunctionProps {
            source_dir: paths.functions_dir.join(REVIEW_DIR),
            function_name: Some(REVIEW_FUNCTION.to_string()),
            archive_path: paths.archive_path(REVIEW_FUNCTION),
            bucket: bucket.clone(),
            location: config.location.clone(),
            project_id: config.project_id.clone(),
            environment_variables: BTreeMap::from([
                ("TOPIC_NAME".to_string(), TOPIC_NAME.to_string()),
                (
                    "SLACK_CHANNEL_ID".to_string(),
                    config.slack_channel_id.clone(),
                ),
            ]),
            event_trigger: Some(EventTrigger {
                event_type: PUBSUB_PUBLISHED_EVENT.to_string(),
                pubsub_topic: topic.clone(),
                trigger_region: config.location.clone(),
                retry_policy: RetryPolicy::Retry,
            }),
            depends_on: Vec::new(),
        },
    )?;
    info!(function = %review.name, "[STACK] Review function declared");

    graph.declare(
        "slack_bot_token",
        DesiredResource::Secret(SecretPlaceholder {
            secret_id: SLACK_TOKEN_SECRET_ID.to_string(),
            initial_value: SECRET_SENTINEL.to_string(),
        }),
        &[],
    )?;

    let invoker = graph.declare(
        "feed_check_invoker",
        DesiredResource::Identity(ServiceAccount {
            account_id: INVOKER_ACCOUNT_ID.to_string(),
            display_name: INVOKER_DISPLAY_NAME.to_string(),
        }),
        &[],
    )?;

    let binding = graph.declare(
        "run_invoker",
        DesiredResource::Binding(ProjectIamMember {
            project: config.project_id.clone(),
            role: INVOKER_ROLE.to_string(),
            member: invoker.clone(),
        }),
        &[],
    )?;

    graph.declare(
        "review_trigger",
        DesiredResource::Schedule(SchedulerJob {
            name: SCHEDULER_JOB_NAME.to_string(),
            project: config.project_id.clone(),
            region: config.location.clone(),
            schedule: SCHEDULE.to_string(),
            time_zone: SCHEDULE_TIME_ZONE.to_string(),
            http_target: HttpTarget {
                uri: function_uri(&config.location, &config.project_id, &check_feed.name),
                http_method: HttpMethod::Post,
                oidc_service_account: invoker,
            },
        }),
        &[check_feed.function.clone(), binding],
    )?;

    info!(
        stack = STACK_NAME,
        resources = graph.len(),
        "[STACK] Stack composed"
    );
    Ok(ComposedStack {
        name: STACK_NAME.to_string(),
        graph,
        check_feed,
        review,
    })
}

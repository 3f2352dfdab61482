use std::collections::BTreeSet;
use std::fs::{create_dir_all, write};
use std::path::Path;
use tempfile::tempdir;

use blog_auto_review_stack::config::{DeploymentConfig, StackPaths};
use blog_auto_review_stack::graph::StackGraph;
use blog_auto_review_stack::resource::{DesiredResource, HttpMethod, ResourceKind, RetryPolicy};
use blog_auto_review_stack::stack::{compose_stack, ComposedStack, SECRET_SENTINEL};

fn scenario_config() -> DeploymentConfig {
    DeploymentConfig {
        project_id: "proj1".into(),
        location: "asia-northeast1".into(),
        slack_channel_id: "C123".into(),
    }
}

fn write_functions(root: &Path) {
    for (dir, body) in [
        ("check-feed", "def main(request):\n    return 'checked'\n"),
        ("auto-review", "def main(cloud_event):\n    pass\n"),
    ] {
        create_dir_all(root.join(dir)).unwrap();
        write(root.join(dir).join("main.py"), body).unwrap();
        write(root.join(dir).join("requirements.txt"), "functions-framework\n").unwrap();
    }
}

fn compose_in(root: &Path) -> ComposedStack {
    write_functions(&root.join("functions"));
    let paths = StackPaths::new(root.join("functions"), root.join("cdktf.out"));
    compose_stack(&scenario_config(), &paths).expect("stack should compose")
}

fn object_keys(graph: &StackGraph) -> BTreeSet<String> {
    graph
        .of_kind(ResourceKind::Object)
        .map(|n| match &n.resource {
            DesiredResource::Object(o) => o.key.clone(),
            _ => unreachable!(),
        })
        .collect()
}

#[test]
fn scenario_graph_has_expected_resources() {
    let tmp = tempdir().unwrap();
    let stack = compose_in(tmp.path());
    let graph = &stack.graph;

    assert_eq!(graph.of_kind(ResourceKind::Bucket).count(), 1);
    assert_eq!(graph.of_kind(ResourceKind::Topic).count(), 1);
    assert_eq!(graph.of_kind(ResourceKind::Function).count(), 2);
    assert_eq!(graph.of_kind(ResourceKind::Object).count(), 2);
    assert_eq!(graph.of_kind(ResourceKind::Schedule).count(), 1);
    assert_eq!(graph.of_kind(ResourceKind::Secret).count(), 1);
    assert_eq!(graph.of_kind(ResourceKind::Identity).count(), 1);
    assert_eq!(graph.of_kind(ResourceKind::Binding).count(), 1);

    for node in graph.nodes() {
        match &node.resource {
            DesiredResource::Bucket(b) => {
                assert_eq!(b.name, "blog-autoreview-src-bucket");
                assert_eq!(b.location, "asia-northeast1");
                assert!(b.uniform_bucket_level_access);
            }
            DesiredResource::Topic(t) => {
                assert_eq!(t.name, "blog-auto-review-new-blog");
                assert_eq!(t.message_retention_duration, "600s");
            }
            DesiredResource::Schedule(s) => {
                assert_eq!(s.name, "blog-auto-review-scheduler");
                assert_eq!(s.schedule, "0 * * * *");
                assert_eq!(s.time_zone, "Asia/Tokyo");
                assert_eq!(s.region, "asia-northeast1");
                assert_eq!(
                    s.http_target.uri,
                    "https://asia-northeast1-proj1.cloudfunctions.net/blog-auto-review-check-feed"
                );
                assert_eq!(s.http_target.http_method, HttpMethod::Post);
            }
            DesiredResource::Secret(s) => {
                assert_eq!(s.secret_id, "blog-auto-review-slack-bot-token");
                assert_eq!(s.initial_value, SECRET_SENTINEL);
            }
            DesiredResource::Identity(a) => {
                assert_eq!(a.account_id, "feed-check-invoker");
            }
            DesiredResource::Binding(b) => {
                assert_eq!(b.role, "roles/run.invoker");
                assert_eq!(b.project, "proj1");
            }
            DesiredResource::Object(_) | DesiredResource::Function(_) => {}
        }
    }

    let names: BTreeSet<_> = graph
        .of_kind(ResourceKind::Function)
        .filter_map(|n| n.resource.as_function())
        .map(|f| f.name.as_str())
        .collect();
    assert_eq!(
        names,
        BTreeSet::from(["blog-auto-review-check-feed", "blog-auto-review"])
    );
}

#[test]
fn function_environments_follow_runtime_contract() {
    let tmp = tempdir().unwrap();
    let stack = compose_in(tmp.path());

    let check = stack
        .graph
        .get(&stack.check_feed.function)
        .and_then(|n| n.resource.as_function())
        .unwrap();
    assert_eq!(check.environment_variables.len(), 2);
    assert_eq!(check.environment_variables["PROJECT_ID"], "proj1");
    assert_eq!(check.environment_variables["TOPIC_NAME"], "blog-auto-review-new-blog");
    assert!(check.event_trigger.is_none());

    let review = stack
        .graph
        .get(&stack.review.function)
        .and_then(|n| n.resource.as_function())
        .unwrap();
    assert_eq!(review.environment_variables.len(), 3);
    assert_eq!(review.environment_variables["PROJECT_ID"], "proj1");
    assert_eq!(review.environment_variables["SLACK_CHANNEL_ID"], "C123");
    let trigger = review.event_trigger.as_ref().expect("review function is event driven");
    assert_eq!(trigger.event_type, "google.cloud.pubsub.topic.v1.messagePublished");
    assert_eq!(trigger.trigger_region, "asia-northeast1");
    assert_eq!(trigger.retry_policy, RetryPolicy::Retry);
}

#[test]
fn topic_precedes_both_functions() {
    let tmp = tempdir().unwrap();
    let stack = compose_in(tmp.path());
    let graph = &stack.graph;
    let topic = &graph.of_kind(ResourceKind::Topic).next().unwrap().handle;

    for f in stack.functions() {
        assert!(topic.index() < f.function.index());
        assert!(graph.precedes(topic, &f.function), "{} must wait for the topic", f.name);
        assert!(graph.precedes(&f.object, &f.function));
    }
}

#[test]
fn schedule_waits_for_check_function_and_invoker() {
    let tmp = tempdir().unwrap();
    let stack = compose_in(tmp.path());
    let graph = &stack.graph;
    let job = &graph.of_kind(ResourceKind::Schedule).next().unwrap().handle;
    let identity = &graph.of_kind(ResourceKind::Identity).next().unwrap().handle;
    let binding = &graph.of_kind(ResourceKind::Binding).next().unwrap().handle;

    assert!(graph.precedes(&stack.check_feed.function, job));
    assert!(graph.precedes(identity, job));
    assert!(graph.precedes(binding, job));
    assert!(graph.precedes(identity, binding));
    assert!(!graph.precedes(&stack.review.function, job));
}

#[test]
fn declaration_order_is_topological() {
    let tmp = tempdir().unwrap();
    let stack = compose_in(tmp.path());

    for (position, node) in stack.graph.nodes().iter().enumerate() {
        assert_eq!(node.handle.index(), position);
        for dep in &node.depends_on {
            assert!(
                dep.index() < position,
                "{} depends on later {}",
                node.handle.address(),
                dep.address()
            );
        }
    }
}

#[test]
fn recomposing_unchanged_sources_adds_no_new_objects() {
    let tmp = tempdir().unwrap();
    let first = compose_in(tmp.path());
    let paths = StackPaths::new(tmp.path().join("functions"), tmp.path().join("cdktf.out"));
    let second = compose_stack(&scenario_config(), &paths).unwrap();

    let before = object_keys(&first.graph);
    let after = object_keys(&second.graph);
    assert_eq!(before.len(), 2);
    assert_eq!(before, after);
}

#[test]
fn changing_one_function_only_changes_its_key() {
    let tmp = tempdir().unwrap();
    let first = compose_in(tmp.path());
    write(
        tmp.path().join("functions/auto-review/main.py"),
        "def main(cloud_event):\n    return 'reviewed'\n",
    )
    .unwrap();
    let paths = StackPaths::new(tmp.path().join("functions"), tmp.path().join("cdktf.out"));
    let second = compose_stack(&scenario_config(), &paths).unwrap();

    assert_eq!(
        first.check_feed.artifact.content_hash,
        second.check_feed.artifact.content_hash
    );
    assert_ne!(
        first.review.artifact.content_hash,
        second.review.artifact.content_hash
    );
}

#[test]
fn missing_function_directory_fails_composition() {
    let tmp = tempdir().unwrap();
    create_dir_all(tmp.path().join("functions/check-feed")).unwrap();
    write(tmp.path().join("functions/check-feed/main.py"), "def main(r): pass\n").unwrap();
    let paths = StackPaths::new(tmp.path().join("functions"), tmp.path().join("cdktf.out"));

    let result = compose_stack(&scenario_config(), &paths);
    assert!(matches!(
        result,
        Err(blog_auto_review_stack::error::StackError::Archive(_))
    ));
}

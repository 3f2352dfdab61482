//! Ordered desired-state graph.
//!
//! Resources are declared one at a time and each declaration returns a [`ResourceRef`]. A
//! resource can only point at handles the graph has already handed out, so insertion order is
//! always a valid topological order and a dangling reference cannot be built.

use crate::resource::{DesiredResource, ResourceKind};
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

/// Handle to a declared resource. Only [`StackGraph::declare`] creates these.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    index: usize,
    kind: ResourceKind,
    logical_id: String,
}

impl ResourceRef {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn logical_id(&self) -> &str {
        &self.logical_id
    }

    /// `google_pubsub_topic.new_blog`
    pub fn address(&self) -> String {
        format!("{}.{}", self.kind.terraform_type(), self.logical_id)
    }

    /// `${google_pubsub_topic.new_blog.id}`
    pub fn attr(&self, name: &str) -> String {
        format!("${{{}.{}}}", self.address(), name)
    }
}

#[derive(Debug, Clone)]
pub struct Node {
    pub handle: ResourceRef,
    pub resource: DesiredResource,
    /// Resources that must exist before this one, in declaration order.
    pub depends_on: Vec<ResourceRef>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("{kind:?} `{logical_id}` is already declared")]
    DuplicateId {
        kind: ResourceKind,
        logical_id: String,
    },
    #[error("`{from}` references `{to}`, which is not declared in this graph")]
    UndeclaredDependency { from: String, to: String },
}

#[derive(Debug, Default, Clone)]
pub struct StackGraph {
    nodes: Vec<Node>,
}

impl StackGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `resource` under `logical_id`.
    ///
    /// Dependencies are the handles embedded in the resource plus `extra_depends_on`. Every one of
    /// them must already belong to this graph.
    pub fn declare(
        &mut self,
        logical_id: &str,
        resource: DesiredResource,
        extra_depends_on: &[ResourceRef],
    ) -> Result<ResourceRef, GraphError> {
        let kind = resource.kind();
        if self
            .nodes
            .iter()
            .any(|n| n.handle.kind == kind && n.handle.logical_id == logical_id)
        {
            return Err(GraphError::DuplicateId {
                kind,
                logical_id: logical_id.to_string(),
            });
        }

        let mut seen = HashSet::new();
        let mut depends_on = Vec::new();
        for dep in resource.references().into_iter().chain(extra_depends_on) {
            if !self.contains(dep) {
                return Err(GraphError::UndeclaredDependency {
                    from: format!("{}.{}", kind.terraform_type(), logical_id),
                    to: dep.address(),
                });
            }
            if seen.insert(dep.index) {
                depends_on.push(dep.clone());
            }
        }
        depends_on.sort_by_key(|d| d.index);

        let handle = ResourceRef {
            index: self.nodes.len(),
            kind,
            logical_id: logical_id.to_string(),
        };
        debug!(
            address = %handle.address(),
            dependencies = depends_on.len(),
            "Declared resource"
        );
        self.nodes.push(Node {
            handle: handle.clone(),
            resource,
            depends_on,
        });
        Ok(handle)
    }

    pub fn contains(&self, handle: &ResourceRef) -> bool {
        self.nodes
            .get(handle.index)
            .is_some_and(|n| n.handle == *handle)
    }

    pub fn get(&self, handle: &ResourceRef) -> Option<&Node> {
        self.nodes.get(handle.index).filter(|n| n.handle == *handle)
    }

    /// Nodes in declaration order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn of_kind(&self, kind: ResourceKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.handle.kind == kind)
    }

    /// Whether `before` has to be in place before `after`, directly or transitively.
    pub fn precedes(&self, before: &ResourceRef, after: &ResourceRef) -> bool {
        let Some(node) = self.get(after) else {
            return false;
        };
        node.depends_on
            .iter()
            .any(|dep| dep == before || self.precedes(before, dep))
    }
}

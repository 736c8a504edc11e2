//! In-memory host - a tiny DOM that records what the reconciler asks of it.
//!
//! Host nodes are indices into a flat vector, the same way components are
//! indices into parallel arrays elsewhere in the crate. Nothing is ever freed:
//! a removed node just loses its parent and a released one is only marked,
//! so stale handles stay inspectable.

use std::collections::BTreeMap;

use tracing::{trace, warn};

use crate::types::{PropValue, Props};

use super::{HostConfig, PropChange, PropPatch};

/// Handle of a host node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HostId(usize);

impl HostId {
    /// Raw index.
    pub fn index(self) -> usize {
        self.0
    }
}

/// What a host node is.
#[derive(Debug, Clone, PartialEq)]
pub enum HostNodeKind {
    Container,
    Element {
        tag: String,
        attributes: BTreeMap<String, PropValue>,
    },
    Text(String),
}

#[derive(Debug, Clone)]
struct HostNode {
    kind: HostNodeKind,
    parent: Option<HostId>,
    children: Vec<HostId>,
    released: bool,
}

/// Every call the reconciler made, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum HostOp {
    CreateInstance { id: HostId, tag: String },
    CreateTextInstance { id: HostId, content: String },
    AppendInitialChild { parent: HostId, child: HostId },
    AppendChildToContainer { child: HostId, container: HostId },
    RemoveChild { child: HostId, container: HostId },
    CommitTextUpdate { id: HostId, content: String },
    CommitUpdate { id: HostId, patch: PropPatch },
    ReleaseInstance { id: HostId },
}

impl HostOp {
    /// True for operations that touch attached host state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::AppendChildToContainer { .. }
                | Self::RemoveChild { .. }
                | Self::CommitTextUpdate { .. }
                | Self::CommitUpdate { .. }
        )
    }
}

/// In-memory host platform.
#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Vec<HostNode>,
    ops: Vec<HostOp>,
}

impl MemoryHost {
    /// Empty host.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a container to mount a tree into.
    pub fn create_container(&mut self) -> HostId {
        self.alloc(HostNodeKind::Container)
    }

    fn alloc(&mut self, kind: HostNodeKind) -> HostId {
        let id = HostId(self.nodes.len());
        self.nodes.push(HostNode {
            kind,
            parent: None,
            children: Vec::new(),
            released: false,
        });
        id
    }

    fn node(&self, id: HostId) -> Option<&HostNode> {
        self.nodes.get(id.0)
    }

    fn node_mut(&mut self, id: HostId) -> Option<&mut HostNode> {
        self.nodes.get_mut(id.0)
    }

    fn attach(&mut self, parent: HostId, child: HostId) {
        if self.node(parent).is_none() || self.node(child).is_none() {
            warn!(?parent, ?child, "attach with unknown host node");
            return;
        }
        if let Some(previous) = self.node(child).and_then(|n| n.parent) {
            warn!(?child, ?previous, ?parent, "host node already attached; moving it");
            self.detach(previous, child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        if let Some(node) = self.node_mut(parent) {
            node.children.push(child);
        }
    }

    fn detach(&mut self, parent: HostId, child: HostId) -> bool {
        let Some(node) = self.node_mut(parent) else {
            return false;
        };
        let Some(pos) = node.children.iter().position(|c| *c == child) else {
            return false;
        };
        node.children.remove(pos);
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }
        true
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Kind of a host node.
    pub fn kind(&self, id: HostId) -> Option<&HostNodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    /// Children of a host node, in order.
    pub fn children(&self, id: HostId) -> &[HostId] {
        self.node(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Parent of a host node.
    pub fn parent(&self, id: HostId) -> Option<HostId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// Tag of an element node.
    pub fn tag(&self, id: HostId) -> Option<&str> {
        match self.kind(id)? {
            HostNodeKind::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Attribute of an element node.
    pub fn attribute(&self, id: HostId, name: &str) -> Option<&PropValue> {
        match self.kind(id)? {
            HostNodeKind::Element { attributes, .. } => attributes.get(name),
            _ => None,
        }
    }

    /// Content of a text node.
    pub fn text(&self, id: HostId) -> Option<&str> {
        match self.kind(id)? {
            HostNodeKind::Text(content) => Some(content),
            _ => None,
        }
    }

    /// Concatenated text of a subtree, in tree order.
    pub fn text_content(&self, id: HostId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: HostId, out: &mut String) {
        if let Some(text) = self.text(id) {
            out.push_str(text);
        }
        for child in self.children(id) {
            self.collect_text(*child, out);
        }
    }

    /// True once the node was handed back through `release_instance`.
    pub fn is_released(&self, id: HostId) -> bool {
        self.node(id).is_some_and(|n| n.released)
    }

    /// Number of host nodes ever created (containers included).
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // =========================================================================
    // Operation log
    // =========================================================================

    /// Operations recorded so far.
    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    /// Drain the operation log.
    pub fn take_ops(&mut self) -> Vec<HostOp> {
        std::mem::take(&mut self.ops)
    }

    /// Count recorded operations matching a predicate.
    pub fn count_ops(&self, predicate: impl Fn(&HostOp) -> bool) -> usize {
        self.ops.iter().filter(|op| predicate(op)).count()
    }
}

// =============================================================================
// HostConfig
// =============================================================================

impl HostConfig for MemoryHost {
    type Instance = HostId;

    fn create_instance(&mut self, tag: &str, props: &Props) -> HostId {
        let id = self.alloc(HostNodeKind::Element {
            tag: tag.to_string(),
            attributes: props.attributes.clone(),
        });
        trace!(?id, tag, "create instance");
        self.ops.push(HostOp::CreateInstance {
            id,
            tag: tag.to_string(),
        });
        id
    }

    fn create_text_instance(&mut self, content: &str) -> HostId {
        let id = self.alloc(HostNodeKind::Text(content.to_string()));
        trace!(?id, content, "create text instance");
        self.ops.push(HostOp::CreateTextInstance {
            id,
            content: content.to_string(),
        });
        id
    }

    fn append_initial_child(&mut self, parent: &HostId, child: &HostId) {
        self.ops.push(HostOp::AppendInitialChild {
            parent: *parent,
            child: *child,
        });
        self.attach(*parent, *child);
    }

    fn append_child_to_container(&mut self, child: &HostId, container: &HostId) {
        self.ops.push(HostOp::AppendChildToContainer {
            child: *child,
            container: *container,
        });
        self.attach(*container, *child);
    }

    fn remove_child(&mut self, child: &HostId, container: &HostId) {
        self.ops.push(HostOp::RemoveChild {
            child: *child,
            container: *container,
        });
        if !self.detach(*container, *child) {
            warn!(?child, ?container, "remove_child: not a child of this container");
        }
    }

    fn commit_text_update(&mut self, text: &HostId, content: &str) {
        self.ops.push(HostOp::CommitTextUpdate {
            id: *text,
            content: content.to_string(),
        });
        match self.node_mut(*text).map(|n| &mut n.kind) {
            Some(HostNodeKind::Text(existing)) => {
                existing.clear();
                existing.push_str(content);
            }
            _ => warn!(id = ?text, "commit_text_update on a non-text node"),
        }
    }

    fn commit_update(&mut self, instance: &HostId, patch: &PropPatch) {
        self.ops.push(HostOp::CommitUpdate {
            id: *instance,
            patch: patch.clone(),
        });
        match self.node_mut(*instance).map(|n| &mut n.kind) {
            Some(HostNodeKind::Element { attributes, .. }) => {
                for change in &patch.changes {
                    match change {
                        PropChange::Set { name, value } => {
                            attributes.insert(name.clone(), value.clone());
                        }
                        PropChange::Remove { name } => {
                            attributes.remove(name);
                        }
                    }
                }
            }
            _ => warn!(id = ?instance, "commit_update on a non-element node"),
        }
    }

    fn release_instance(&mut self, instance: &HostId) {
        self.ops.push(HostOp::ReleaseInstance { id: *instance });
        trace!(id = ?instance, "release instance");
        if let Some(parent) = self.parent(*instance) {
            self.detach(parent, *instance);
        }
        match self.node_mut(*instance) {
            Some(node) => node.released = true,
            None => warn!(id = ?instance, "release_instance on an unknown node"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Work nodes - one per logical tree position per generation.

use std::fmt;

use crate::host::PropPatch;
use crate::reconciler::Hook;
use crate::types::{Children, ElementType, Key, Props};

use super::flags::Flags;
use super::update_queue::SharedQueue;

slotmap::new_key_type! {
    /// Arena address of a work node.
    pub struct NodeId;
}

// =============================================================================
// Work tags
// =============================================================================

/// What kind of tree position a node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WorkTag {
    /// Top of a mounted tree; its host instance is the container.
    RootAnchor,
    /// Host element such as `div`.
    HostElement,
    /// Host text node.
    HostText,
    /// User render function.
    FunctionComponent,
}

impl WorkTag {
    /// Whether the node maps directly to a host-visible instance.
    pub fn is_host(self) -> bool {
        matches!(self, Self::HostElement | Self::HostText)
    }

    /// Whether the node can act as a host parent for placements.
    pub fn is_host_parent(self) -> bool {
        matches!(self, Self::HostElement | Self::RootAnchor)
    }
}

// =============================================================================
// Committed state
// =============================================================================

/// Last fully applied internal state of a node.
#[derive(Debug, Clone, Default)]
pub enum NodeState {
    #[default]
    Empty,
    /// Descriptor rendered under a root anchor.
    Root(Children),
    /// Hook list of a function component, in call order.
    Hooks(Vec<Hook>),
}

// =============================================================================
// WorkNode
// =============================================================================

/// A node in one generation of the work tree.
///
/// Tree links and the counterpart link are arena ids; `parent` is never an
/// owning reference.
pub struct WorkNode<I> {
    pub tag: WorkTag,
    pub key: Option<Key>,
    pub element_type: Option<ElementType>,

    pub pending_props: Props,
    pub committed_props: Option<Props>,
    pub committed_state: NodeState,
    pub update_queue: Option<SharedQueue<Children>>,

    pub child: Option<NodeId>,
    pub sibling: Option<NodeId>,
    pub parent: Option<NodeId>,

    pub host_instance: Option<I>,

    pub flags: Flags,
    pub subtree_flags: Flags,
    pub deletions: Vec<NodeId>,
    /// Attribute changes computed during completion, applied by commit.
    pub update_payload: Option<PropPatch>,

    pub counterpart: Option<NodeId>,
}

impl<I> WorkNode<I> {
    /// Fresh node with no links and no flags.
    pub fn new(tag: WorkTag, pending_props: Props, key: Option<Key>) -> Self {
        Self {
            tag,
            key,
            element_type: None,
            pending_props,
            committed_props: None,
            committed_state: NodeState::Empty,
            update_queue: None,
            child: None,
            sibling: None,
            parent: None,
            host_instance: None,
            flags: Flags::empty(),
            subtree_flags: Flags::empty(),
            deletions: Vec::new(),
            update_payload: None,
            counterpart: None,
        }
    }

    /// Name used in diagnostics.
    pub fn display_name(&self) -> &str {
        match (&self.element_type, self.tag) {
            (Some(ty), _) => ty.name(),
            (None, WorkTag::RootAnchor) => "#root",
            (None, WorkTag::HostText) => "#text",
            (None, _) => "#unknown",
        }
    }
}

impl<I: fmt::Debug> fmt::Debug for WorkNode<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkNode")
            .field("tag", &self.tag)
            .field("name", &self.display_name())
            .field("key", &self.key)
            .field("flags", &self.flags)
            .field("subtree_flags", &self.subtree_flags)
            .field("child", &self.child)
            .field("sibling", &self.sibling)
            .field("parent", &self.parent)
            .field("counterpart", &self.counterpart)
            .field("host_instance", &self.host_instance)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Component;

    #[test]
    fn test_host_tags() {
        assert!(WorkTag::HostElement.is_host());
        assert!(WorkTag::HostText.is_host());
        assert!(!WorkTag::RootAnchor.is_host());
        assert!(!WorkTag::FunctionComponent.is_host());

        assert!(WorkTag::RootAnchor.is_host_parent());
        assert!(!WorkTag::HostText.is_host_parent());
    }

    #[test]
    fn test_display_name() {
        let root: WorkNode<()> = WorkNode::new(WorkTag::RootAnchor, Props::new(), None);
        assert_eq!(root.display_name(), "#root");

        let mut comp: WorkNode<()> = WorkNode::new(WorkTag::FunctionComponent, Props::new(), None);
        comp.element_type = Some(ElementType::Component(Component::new("App", |_, _| {
            Children::Empty
        })));
        assert_eq!(comp.display_name(), "App");
    }

    #[test]
    fn test_new_node_is_clean() {
        let node: WorkNode<u32> = WorkNode::new(WorkTag::HostText, Props::text("a"), None);
        assert!(node.flags.is_empty());
        assert!(node.subtree_flags.is_empty());
        assert!(node.deletions.is_empty());
        assert!(node.counterpart.is_none());
        assert!(node.host_instance.is_none());
    }
}

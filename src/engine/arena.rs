//! Node Arena - storage and double buffering for work nodes.
//!
//! Every logical tree position owns at most two slots: the node on screen and
//! its counterpart. The counterpart is allocated lazily the first time the
//! position is rendered again, and from then on the pair is recycled by
//! resetting, never reallocated.
//!
//! ```text
//!   current ──counterpart──▶ work
//!      ▲                      │
//!      └─────counterpart──────┘
//! ```

use slotmap::SlotMap;

use crate::error::{ReconcileError, Result};
use crate::types::{Element, ElementType, Props};

use super::flags::Flags;
use super::node::{NodeId, WorkNode, WorkTag};

/// Arena owning every work node of one mounted tree.
pub struct NodeArena<I> {
    nodes: SlotMap<NodeId, WorkNode<I>>,
    /// Nodes allocated since `begin_pass`, if a pass is open.
    pass_allocations: Option<Vec<NodeId>>,
}

impl<I: Clone> NodeArena<I> {
    /// Empty arena.
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            pass_allocations: None,
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the arena holds no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Check if an id still resolves.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Borrow a node, if it exists.
    pub fn get(&self, id: NodeId) -> Option<&WorkNode<I>> {
        self.nodes.get(id)
    }

    /// Mutably borrow a node, if it exists.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut WorkNode<I>> {
        self.nodes.get_mut(id)
    }

    /// Borrow a node that must exist.
    pub fn node(&self, id: NodeId) -> Result<&WorkNode<I>> {
        self.nodes.get(id).ok_or(ReconcileError::MissingNode(id))
    }

    /// Mutably borrow a node that must exist.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut WorkNode<I>> {
        self.nodes.get_mut(id).ok_or(ReconcileError::MissingNode(id))
    }

    /// Iterate over a node's child list (first child, then siblings).
    pub fn children(&self, id: NodeId) -> ChildIter<'_, I> {
        ChildIter {
            arena: self,
            next: self.get(id).and_then(|node| node.child),
        }
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Insert a node, recording it when a pass is open.
    pub fn insert(&mut self, node: WorkNode<I>) -> NodeId {
        let id = self.nodes.insert(node);
        if let Some(allocations) = self.pass_allocations.as_mut() {
            allocations.push(id);
        }
        id
    }

    /// Build a fresh node from a descriptor.
    ///
    /// A host tag becomes a host element, anything else a function component.
    pub fn create_from_element(&mut self, element: &Element) -> NodeId {
        let tag = match element.element_type {
            ElementType::Host(_) => WorkTag::HostElement,
            ElementType::Component(_) => WorkTag::FunctionComponent,
        };
        let mut node = WorkNode::new(tag, element.props.clone(), element.key.clone());
        node.element_type = Some(element.element_type.clone());
        self.insert(node)
    }

    /// Build a fresh host text node.
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.insert(WorkNode::new(WorkTag::HostText, Props::text(content), None))
    }

    /// Return the node to mutate for the next generation of `current`.
    ///
    /// First time: allocate a counterpart sharing tag, key and host instance,
    /// and link both ways. Afterwards: recycle the existing counterpart,
    /// resetting its flags, deletions and patch so nothing from two
    /// generations ago leaks forward. Either way the element type, update
    /// queue (shared, not copied), first child, committed state, committed
    /// props and host instance are carried over from `current`.
    pub fn derive_work_counterpart(&mut self, current: NodeId, pending_props: Props) -> Result<NodeId> {
        let cur = self.node(current)?;
        let tag = cur.tag;
        let key = cur.key.clone();
        let existing = cur.counterpart.filter(|id| self.nodes.contains_key(*id));

        let element_type = cur.element_type.clone();
        let update_queue = cur.update_queue.clone();
        let child = cur.child;
        let committed_state = cur.committed_state.clone();
        let committed_props = cur.committed_props.clone();
        let host_instance = cur.host_instance.clone();

        let work = match existing {
            Some(id) => {
                let node = self.node_mut(id)?;
                node.pending_props = pending_props;
                node.flags = Flags::empty();
                node.subtree_flags = Flags::empty();
                node.deletions.clear();
                node.update_payload = None;
                id
            }
            None => {
                let mut node = WorkNode::new(tag, pending_props, key);
                node.counterpart = Some(current);
                let id = self.insert(node);
                self.node_mut(current)?.counterpart = Some(id);
                id
            }
        };

        let node = self.node_mut(work)?;
        node.element_type = element_type;
        node.update_queue = update_queue;
        node.child = child;
        node.committed_state = committed_state;
        node.committed_props = committed_props;
        node.host_instance = host_instance;
        Ok(work)
    }

    // =========================================================================
    // Render passes
    // =========================================================================

    /// Start recording allocations for a render.
    ///
    /// A pass left open by an unwound render must be rolled back first; see
    /// [`NodeArena::has_open_pass`].
    pub fn begin_pass(&mut self) {
        self.pass_allocations = Some(Vec::new());
    }

    /// True between `begin_pass` and `finish_pass`/`rollback_pass`.
    pub fn has_open_pass(&self) -> bool {
        self.pass_allocations.is_some()
    }

    /// Keep everything allocated since `begin_pass`.
    pub fn finish_pass(&mut self) {
        self.pass_allocations = None;
    }

    /// Drop everything allocated since `begin_pass`.
    ///
    /// Counterpart links from surviving nodes into the dropped ones are
    /// cleared, so the committed generation looks exactly as before. Host
    /// instances created for dropped nodes are handed to `release`; instances
    /// carried over from a committed node are not. Returns the number of
    /// nodes removed.
    pub fn rollback_pass(&mut self, mut release: impl FnMut(I)) -> usize {
        let Some(allocations) = self.pass_allocations.take() else {
            return 0;
        };
        let mut removed = 0;
        for id in allocations {
            let Some(node) = self.nodes.remove(id) else {
                continue;
            };
            removed += 1;
            match node.counterpart {
                Some(counterpart) => {
                    if let Some(other) = self.nodes.get_mut(counterpart) {
                        if other.counterpart == Some(id) {
                            other.counterpart = None;
                        }
                    }
                }
                None => {
                    if let Some(instance) = node.host_instance {
                        release(instance);
                    }
                }
            }
        }
        removed
    }

    // =========================================================================
    // Release
    // =========================================================================

    /// Remove a deleted subtree and the counterparts of all its nodes.
    ///
    /// Returns the number of nodes removed.
    pub fn release_subtree(&mut self, root: NodeId) -> usize {
        let mut stack = vec![root];
        let mut doomed = Vec::new();
        while let Some(id) = stack.pop() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            doomed.push(id);
            if let Some(counterpart) = node.counterpart {
                doomed.push(counterpart);
            }
            let mut child = node.child;
            while let Some(c) = child {
                stack.push(c);
                child = self.nodes.get(c).and_then(|n| n.sibling);
            }
        }

        doomed
            .into_iter()
            .filter(|id| self.nodes.remove(*id).is_some())
            .count()
    }
}

impl<I: Clone> Default for NodeArena<I> {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over a node's children.
pub struct ChildIter<'a, I> {
    arena: &'a NodeArena<I>,
    next: Option<NodeId>,
}

impl<I: Clone> Iterator for ChildIter<'_, I> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.arena.get(id).and_then(|node| node.sibling);
        Some(id)
    }
}

// =============================================================================
// Tests
// =============================================================================

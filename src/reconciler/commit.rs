//! Commit phase - apply a finished render to the host.
//!
//! A single iterative walk over the finished tree. The walker descends only
//! where `subtree_flags` has a mutation bit, processes each node's own flags
//! on the way back up, and clears each bit once it has been handled.
//!
//! # Per-flag work
//!
//! - `PLACEMENT`: append the node's top-level host instances to the nearest
//!   host parent.
//! - `UPDATE`: push new text or the stored attribute patch to the host.
//! - `CHILD_DELETION`: visit each deleted subtree, then detach its first host
//!   node from the nearest host parent.

use tracing::{debug, trace, warn};

use crate::engine::{Flags, NodeArena, NodeId, WorkTag};
use crate::error::Result;
use crate::host::HostConfig;

/// What one commit did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Nodes whose `PLACEMENT` was applied.
    pub placements: usize,
    /// Nodes whose `UPDATE` was applied.
    pub updates: usize,
    /// Deleted subtrees.
    pub deletions: usize,
    /// Nodes visited inside deleted subtrees.
    pub unmounted: usize,
    /// Mutating host calls issued.
    pub host_ops: usize,
    /// Whether the mutation walker ran at all.
    pub walked: bool,
}

impl CommitReport {
    /// True if the host was not touched.
    pub fn is_noop(&self) -> bool {
        self.host_ops == 0
    }
}

/// Run the mutation walker if the finished tree has anything to apply.
///
/// Returns the report and the deleted subtree roots, which the caller
/// releases from the arena once the finished tree is current.
pub(crate) fn commit_root<H: HostConfig>(
    arena: &mut NodeArena<H::Instance>,
    host: &mut H,
    finished: NodeId,
) -> Result<(CommitReport, Vec<NodeId>)> {
    let root = arena.node(finished)?;
    if !(root.flags | root.subtree_flags).has_mutations() {
        trace!("no mutations to commit");
        return Ok((CommitReport::default(), Vec::new()));
    }
    debug!(flags = ?root.flags, subtree = ?root.subtree_flags, "committing mutations");

    let mut walker = CommitWalker {
        arena,
        host,
        report: CommitReport {
            walked: true,
            ..CommitReport::default()
        },
        released: Vec::new(),
    };
    walker.commit_mutation_effects(finished)?;
    Ok((walker.report, walker.released))
}

struct CommitWalker<'a, H: HostConfig> {
    arena: &'a mut NodeArena<H::Instance>,
    host: &'a mut H,
    report: CommitReport,
    released: Vec<NodeId>,
}

impl<H: HostConfig> CommitWalker<'_, H> {
    fn commit_mutation_effects(&mut self, finished: NodeId) -> Result<()> {
        let mut next = Some(finished);

        while let Some(id) = next {
            let node = self.arena.node(id)?;
            if let (true, Some(child)) = (node.subtree_flags.has_mutations(), node.child) {
                next = Some(child);
                continue;
            }

            let mut cursor = id;
            next = loop {
                self.commit_mutation_effects_on_node(cursor)?;
                if cursor == finished {
                    break None;
                }
                let node = self.arena.node(cursor)?;
                if let Some(sibling) = node.sibling {
                    break Some(sibling);
                }
                match node.parent {
                    Some(parent) => cursor = parent,
                    None => break None,
                }
            };
        }
        Ok(())
    }

    fn commit_mutation_effects_on_node(&mut self, id: NodeId) -> Result<()> {
        let flags = self.arena.node(id)?.flags;

        if flags.contains(Flags::PLACEMENT) {
            self.commit_placement(id)?;
            self.arena.node_mut(id)?.flags.remove(Flags::PLACEMENT);
        }
        if flags.contains(Flags::UPDATE) {
            self.commit_update(id)?;
            self.arena.node_mut(id)?.flags.remove(Flags::UPDATE);
        }
        if flags.contains(Flags::CHILD_DELETION) {
            let deletions = std::mem::take(&mut self.arena.node_mut(id)?.deletions);
            for deleted in deletions {
                self.commit_deletion(id, deleted)?;
            }
            self.arena.node_mut(id)?.flags.remove(Flags::CHILD_DELETION);
        }
        Ok(())
    }

    /// Host instance of the nearest host parent, starting at `start`.
    fn host_parent(&self, start: Option<NodeId>) -> Result<Option<H::Instance>> {
        let mut cursor = start;
        while let Some(id) = cursor {
            let node = self.arena.node(id)?;
            if node.tag.is_host_parent() {
                return Ok(node.host_instance.clone());
            }
            cursor = node.parent;
        }
        Ok(None)
    }

    // =========================================================================
    // Placement
    // =========================================================================

    fn commit_placement(&mut self, id: NodeId) -> Result<()> {
        let parent = self.arena.node(id)?.parent;
        let Some(container) = self.host_parent(parent)? else {
            warn!(node = self.arena.node(id)?.display_name(), "placement without a host parent; skipped");
            return Ok(());
        };
        self.append_placement_node(id, &container)?;
        self.report.placements += 1;
        Ok(())
    }

    fn append_placement_node(&mut self, id: NodeId, container: &H::Instance) -> Result<()> {
        let node = self.arena.node(id)?;
        if node.tag.is_host() {
            if let Some(instance) = node.host_instance.clone() {
                trace!(?instance, ?container, "append child to container");
                self.host.append_child_to_container(&instance, container);
                self.report.host_ops += 1;
            }
            return Ok(());
        }

        let children: Vec<NodeId> = self.arena.children(id).collect();
        for child in children {
            self.append_placement_node(child, container)?;
        }
        Ok(())
    }

    // =========================================================================
    // Update
    // =========================================================================

    fn commit_update(&mut self, id: NodeId) -> Result<()> {
        let node = self.arena.node_mut(id)?;
        let Some(instance) = node.host_instance.clone() else {
            warn!(node = node.display_name(), "update on a node without a host instance");
            return Ok(());
        };

        match node.tag {
            WorkTag::HostText => {
                let content = node
                    .committed_props
                    .as_ref()
                    .map(|props| props.content().to_string())
                    .unwrap_or_default();
                trace!(?instance, %content, "commit text update");
                self.host.commit_text_update(&instance, &content);
            }
            WorkTag::HostElement => {
                let Some(patch) = node.update_payload.take() else {
                    return Ok(());
                };
                trace!(?instance, changes = patch.len(), "commit update");
                self.host.commit_update(&instance, &patch);
            }
            tag => {
                warn!(?tag, "update flag on a node kind without host sync");
                return Ok(());
            }
        }

        self.report.updates += 1;
        self.report.host_ops += 1;
        Ok(())
    }

    // =========================================================================
    // Deletion
    // =========================================================================

    fn commit_deletion(&mut self, parent: NodeId, deleted: NodeId) -> Result<()> {
        let mut first_host: Option<H::Instance> = None;
        let mut stack = vec![deleted];

        while let Some(id) = stack.pop() {
            let node = self.arena.node(id)?;
            self.report.unmounted += 1;
            match node.tag {
                WorkTag::HostElement | WorkTag::HostText => {
                    if first_host.is_none() {
                        first_host = node.host_instance.clone();
                    }
                }
                WorkTag::FunctionComponent => {
                    trace!(component = node.display_name(), "unmount");
                }
                WorkTag::RootAnchor => {
                    warn!("root anchor inside a deleted subtree");
                }
            }
            let children: Vec<NodeId> = self.arena.children(id).collect();
            stack.extend(children.into_iter().rev());
        }

        if let Some(instance) = first_host {
            match self.host_parent(Some(parent))? {
                Some(container) => {
                    trace!(?instance, ?container, "remove child");
                    self.host.remove_child(&instance, &container);
                    self.report.host_ops += 1;
                }
                None => warn!("deletion without a host parent; skipped"),
            }
        }

        self.report.deletions += 1;
        self.released.push(deleted);
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

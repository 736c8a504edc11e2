//! Roots - the mount point of a tree and its synchronous flush.
//!
//! A [`RootHandle`] owns the host renderer, the host container and the node
//! arena. Every update, whether from [`update_container`] or from a state
//! hook, goes through the same path:
//!
//! ```text
//! enqueue → schedule_update_on_node → walk to root anchor
//!         → render (WorkLoop) → commit_root → swap current → release deletions
//! ```

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, debug_span, error, info, warn};

use crate::config::ReconcilerConfig;
use crate::engine::{
    create_update, create_update_queue, enqueue_update, Action, NodeArena, NodeId, ScheduleUpdate,
    WorkNode, WorkTag,
};
use crate::error::{ReconcileError, Result};
use crate::host::HostConfig;
use crate::types::{Children, Props};

use super::commit::{commit_root, CommitReport};
use super::work_loop::{FlushOutcome, WorkLoop};

// =============================================================================
// FiberRoot
// =============================================================================

/// Everything one mounted tree owns.
pub(crate) struct FiberRoot<H: HostConfig> {
    host: H,
    container: H::Instance,
    arena: NodeArena<H::Instance>,
    current: NodeId,
    config: ReconcilerConfig,
    last_commit: Option<CommitReport>,
    scheduler: Weak<dyn ScheduleUpdate>,
}

impl<H: HostConfig> FiberRoot<H> {
    /// Walk parent links from `node` to this root's anchor.
    fn mark_update_from_node_to_root(&self, node: NodeId) -> Result<NodeId> {
        let mut cursor = Some(node);
        while let Some(id) = cursor {
            let Some(found) = self.arena.get(id) else {
                return Err(ReconcileError::Unmounted);
            };
            if found.tag == WorkTag::RootAnchor {
                let anchor = self.arena.node(self.current)?;
                return if id == self.current || anchor.counterpart == Some(id) {
                    Ok(id)
                } else {
                    Err(ReconcileError::Unmounted)
                };
            }
            cursor = found.parent;
        }
        Err(ReconcileError::Unmounted)
    }

    /// Drop the nodes of an unfinished render and release their fresh host
    /// instances.
    fn rollback(&mut self) -> usize {
        let host = &mut self.host;
        self.arena.rollback_pass(|instance| host.release_instance(&instance))
    }

    /// Render and commit synchronously from the current tree.
    fn perform_sync_work(&mut self) -> FlushOutcome {
        let span = debug_span!("flush", nodes = self.arena.len());
        let _guard = span.enter();

        // A previous flush unwound mid-render
        if self.arena.has_open_pass() {
            let dropped = self.rollback();
            warn!(dropped, "discarding nodes of an unwound render");
        }

        self.arena.begin_pass();
        let rendered = {
            let mut work_loop = WorkLoop::new(&mut self.arena, &mut self.host, &self.scheduler, self.config);
            work_loop.render_root(self.current).map(|root| (root, work_loop.units()))
        };

        let (finished, units) = match rendered {
            Ok(done) => {
                self.arena.finish_pass();
                done
            }
            Err(err) => {
                let dropped = self.rollback();
                warn!(%err, dropped, "render abandoned");
                return FlushOutcome::Abandoned(err);
            }
        };

        let (report, released) = match commit_root(&mut self.arena, &mut self.host, finished) {
            Ok(committed) => committed,
            Err(err) => {
                // Only reachable through a broken tree invariant. Host calls
                // issued before the failure are not undone.
                error!(%err, "commit failed partway; host may hold a partial commit");
                return FlushOutcome::Abandoned(err);
            }
        };

        self.current = finished;
        let released_nodes: usize = released
            .into_iter()
            .map(|id| self.arena.release_subtree(id))
            .sum();

        if self.config.log_commits {
            info!(units, released_nodes, ?report, "commit");
        } else {
            debug!(units, released_nodes, ?report, "commit");
        }
        self.last_commit = Some(report.clone());
        FlushOutcome::Committed(report)
    }
}

impl<H: HostConfig + 'static> ScheduleUpdate for RefCell<FiberRoot<H>> {
    fn schedule_update_on_node(&self, node: NodeId) -> Result<FlushOutcome> {
        let mut root = self.try_borrow_mut().map_err(|_| ReconcileError::Reentrant)?;
        root.mark_update_from_node_to_root(node)?;
        Ok(root.perform_sync_work())
    }
}

// =============================================================================
// RootHandle
// =============================================================================

/// Handle to a mounted tree.
///
/// Cloning the handle shares the same root.
pub struct RootHandle<H: HostConfig>(Rc<RefCell<FiberRoot<H>>>);

impl<H: HostConfig> Clone for RootHandle<H> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<H: HostConfig + 'static> RootHandle<H> {
    fn inner(&self) -> Result<Ref<'_, FiberRoot<H>>> {
        self.0.try_borrow().map_err(|_| ReconcileError::Reentrant)
    }

    /// Borrow the host renderer.
    ///
    /// Every inspector returns [`ReconcileError::Reentrant`] while the root
    /// is rendering or committing.
    pub fn with_host<R>(&self, f: impl FnOnce(&H) -> R) -> Result<R> {
        Ok(f(&self.inner()?.host))
    }

    /// Mutably borrow the host renderer.
    pub fn with_host_mut<R>(&self, f: impl FnOnce(&mut H) -> R) -> Result<R> {
        let mut root = self.0.try_borrow_mut().map_err(|_| ReconcileError::Reentrant)?;
        Ok(f(&mut root.host))
    }

    /// Inspect the node arena and the current root anchor.
    pub fn with_tree<R>(&self, f: impl FnOnce(&NodeArena<H::Instance>, NodeId) -> R) -> Result<R> {
        let root = self.inner()?;
        Ok(f(&root.arena, root.current))
    }

    /// Current root anchor.
    pub fn current(&self) -> Result<NodeId> {
        Ok(self.inner()?.current)
    }

    /// Host container the tree is mounted in.
    pub fn container(&self) -> Result<H::Instance> {
        Ok(self.inner()?.container.clone())
    }

    /// Report of the most recent commit.
    pub fn last_commit(&self) -> Result<Option<CommitReport>> {
        Ok(self.inner()?.last_commit.clone())
    }

    /// Configuration the root was created with.
    pub fn config(&self) -> Result<ReconcilerConfig> {
        Ok(self.inner()?.config)
    }

    /// Render `children` into this root. See [`update_container`].
    pub fn render(&self, children: impl Into<Children>) -> Result<FlushOutcome> {
        update_container(children, self)
    }
}

impl<H: HostConfig> fmt::Debug for RootHandle<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(root) => f
                .debug_struct("RootHandle")
                .field("container", &root.container)
                .field("current", &root.current)
                .field("nodes", &root.arena.len())
                .finish(),
            Err(_) => f.write_str("RootHandle(<busy>)"),
        }
    }
}

// =============================================================================
// Entry points
// =============================================================================

/// Mount point for a tree inside `container`, with default configuration.
pub fn create_container<H: HostConfig + 'static>(host: H, container: H::Instance) -> RootHandle<H> {
    create_container_with_config(host, container, ReconcilerConfig::default())
}

/// Mount point for a tree inside `container`.
///
/// Allocates the root anchor (whose host instance is the container) and its
/// empty update queue. Nothing is rendered until the first update.
pub fn create_container_with_config<H: HostConfig + 'static>(
    host: H,
    container: H::Instance,
    config: ReconcilerConfig,
) -> RootHandle<H> {
    let root = Rc::new_cyclic(|this: &Weak<RefCell<FiberRoot<H>>>| {
        let scheduler: Weak<dyn ScheduleUpdate> = this.clone();

        let mut arena = NodeArena::new();
        let mut anchor = WorkNode::new(WorkTag::RootAnchor, Props::new(), None);
        anchor.host_instance = Some(container.clone());
        anchor.update_queue = Some(create_update_queue());
        let current = arena.insert(anchor);

        RefCell::new(FiberRoot {
            host,
            container,
            arena,
            current,
            config,
            last_commit: None,
            scheduler,
        })
    });
    RootHandle(root)
}

/// Replace what the root renders and flush synchronously.
///
/// Returns [`ReconcileError::Reentrant`] when called from inside a render or
/// commit of the same root; nothing is enqueued in that case.
pub fn update_container<H: HostConfig + 'static>(
    children: impl Into<Children>,
    root: &RootHandle<H>,
) -> Result<FlushOutcome> {
    let (queue, current) = {
        let inner = root.inner()?;
        let current = inner.current;
        let queue = inner
            .arena
            .node(current)?
            .update_queue
            .clone()
            .ok_or(ReconcileError::MissingUpdateQueue(current))?;
        (queue, current)
    };

    enqueue_update(&queue, create_update(Action::Replace(children.into())));
    root.0.schedule_update_on_node(current)
}

/// Render nothing into the root, unmounting the whole tree.
pub fn unmount<H: HostConfig + 'static>(root: &RootHandle<H>) -> Result<FlushOutcome> {
    update_container(Children::Empty, root)
}

// =============================================================================
// Tests
// =============================================================================

//! Work loop - drive one render over the work tree.
//!
//! The traversal cursor is local to a [`WorkLoop`] value, never global, so
//! each root renders independently:
//!
//! ```text
//! prepare_fresh_stack → perform_unit_of_work* → (root complete)
//!                         │ begin: descend to child
//!                         └ none: complete, climb until a sibling
//! ```

use std::rc::Weak;

use tracing::trace;

use crate::config::ReconcilerConfig;
use crate::engine::{NodeArena, NodeId, ScheduleUpdate};
use crate::error::{ReconcileError, Result};
use crate::host::HostConfig;
use crate::types::Props;

use super::begin::begin_work;
use super::commit::CommitReport;
use super::complete::complete_work;

/// Result of one render + commit cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum FlushOutcome {
    /// The render finished and the new tree is on screen.
    Committed(CommitReport),
    /// The render failed and the committed tree is untouched.
    ///
    /// Also returned when commit itself fails. That only happens on a
    /// broken tree invariant, and host calls issued before the failure
    /// stay applied.
    Abandoned(ReconcileError),
}

impl FlushOutcome {
    /// True if the cycle reached commit.
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }

    /// Commit summary, if the cycle committed.
    pub fn report(&self) -> Option<&CommitReport> {
        match self {
            Self::Committed(report) => Some(report),
            Self::Abandoned(_) => None,
        }
    }

    /// Render error, if the cycle was abandoned.
    pub fn error(&self) -> Option<&ReconcileError> {
        match self {
            Self::Committed(_) => None,
            Self::Abandoned(err) => Some(err),
        }
    }
}

/// Render-phase traversal state for one root.
pub(crate) struct WorkLoop<'a, H: HostConfig> {
    arena: &'a mut NodeArena<H::Instance>,
    host: &'a mut H,
    scheduler: &'a Weak<dyn ScheduleUpdate>,
    config: ReconcilerConfig,
    work_in_progress: Option<NodeId>,
    units: usize,
}

impl<'a, H: HostConfig> WorkLoop<'a, H> {
    pub(crate) fn new(
        arena: &'a mut NodeArena<H::Instance>,
        host: &'a mut H,
        scheduler: &'a Weak<dyn ScheduleUpdate>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            arena,
            host,
            scheduler,
            config,
            work_in_progress: None,
            units: 0,
        }
    }

    /// Render the next generation of `current_root` and return the finished
    /// work root.
    pub(crate) fn render_root(&mut self, current_root: NodeId) -> Result<NodeId> {
        let root = self.prepare_fresh_stack(current_root)?;
        while let Some(unit) = self.work_in_progress {
            self.perform_unit_of_work(unit)?;
        }
        trace!(units = self.units, "render finished");
        Ok(root)
    }

    /// Number of units performed so far.
    pub(crate) fn units(&self) -> usize {
        self.units
    }

    fn prepare_fresh_stack(&mut self, current_root: NodeId) -> Result<NodeId> {
        let root = self.arena.derive_work_counterpart(current_root, Props::new())?;
        let node = self.arena.node_mut(root)?;
        node.parent = None;
        node.sibling = None;
        self.work_in_progress = Some(root);
        self.units = 0;
        Ok(root)
    }

    fn perform_unit_of_work(&mut self, unit: NodeId) -> Result<()> {
        self.units += 1;
        if self.units > self.config.max_work_units {
            return Err(ReconcileError::WorkLimitExceeded {
                limit: self.config.max_work_units,
            });
        }

        let next = begin_work(&mut *self.arena, self.scheduler, unit)?;
        let node = self.arena.node_mut(unit)?;
        node.committed_props = Some(node.pending_props.clone());

        match next {
            Some(child) => self.work_in_progress = Some(child),
            None => self.complete_unit_of_work(unit)?,
        }
        Ok(())
    }

    fn complete_unit_of_work(&mut self, unit: NodeId) -> Result<()> {
        let mut node = unit;
        loop {
            complete_work(&mut *self.arena, &mut *self.host, node)?;

            let finished = self.arena.node(node)?;
            if let Some(sibling) = finished.sibling {
                self.work_in_progress = Some(sibling);
                return Ok(());
            }
            match finished.parent {
                Some(parent) => node = parent,
                None => {
                    self.work_in_progress = None;
                    return Ok(());
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

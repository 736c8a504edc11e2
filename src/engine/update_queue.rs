//! Update Queue - the single pending update feeding state into a render.
//!
//! A queue holds at most one pending update. Enqueueing overwrites whatever
//! was pending (last write wins); there is no batching of several updates
//! between flushes.
//!
//! The root anchor keeps one queue for the descriptor it renders, and every
//! `use_state` hook keeps one for its value. Queues are shared (`Rc`) between
//! the two generations of a node, never copied.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::error::{ReconcileError, Result};
use crate::reconciler::FlushOutcome;

use super::node::NodeId;

// =============================================================================
// Actions and updates
// =============================================================================

/// Either a replacement value or a function from previous value to next.
pub enum Action<S> {
    Replace(S),
    Reduce(Rc<dyn Fn(&S) -> S>),
}

impl<S> Action<S> {
    /// Evaluate against the previous value.
    pub fn apply(self, base: S) -> S {
        match self {
            Self::Replace(next) => next,
            Self::Reduce(reducer) => reducer(&base),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for Action<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Replace(value) => f.debug_tuple("Replace").field(value).finish(),
            Self::Reduce(_) => f.write_str("Reduce(..)"),
        }
    }
}

/// An enqueued action.
#[derive(Debug)]
pub struct Update<S> {
    pub action: Action<S>,
}

/// Wrap an action in an update record.
pub fn create_update<S>(action: Action<S>) -> Update<S> {
    Update { action }
}

// =============================================================================
// Queue
// =============================================================================

/// Holder of at most one pending update plus the dispatcher bound to it.
pub struct UpdateQueue<S> {
    pending: Option<Update<S>>,
    dispatch: Option<Dispatch<S>>,
}

/// Queue shared between both generations of a node.
pub type SharedQueue<S> = Rc<RefCell<UpdateQueue<S>>>;

impl<S> UpdateQueue<S> {
    /// Empty queue.
    pub fn new() -> Self {
        Self {
            pending: None,
            dispatch: None,
        }
    }

    /// True if an update is waiting for the next render.
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Snapshot and clear the pending slot.
    pub fn take_pending(&mut self) -> Option<Update<S>> {
        self.pending.take()
    }

    /// Dispatcher bound to this queue, if any.
    pub fn dispatch(&self) -> Option<&Dispatch<S>> {
        self.dispatch.as_ref()
    }

    pub(crate) fn set_dispatch(&mut self, dispatch: Dispatch<S>) {
        self.dispatch = Some(dispatch);
    }
}

impl<S> Default for UpdateQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> fmt::Debug for UpdateQueue<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpdateQueue")
            .field("has_pending", &self.pending.is_some())
            .field("has_dispatch", &self.dispatch.is_some())
            .finish()
    }
}

/// Create an empty shared queue.
pub fn create_update_queue<S>() -> SharedQueue<S> {
    Rc::new(RefCell::new(UpdateQueue::new()))
}

/// Set the queue's pending update, replacing any earlier one.
pub fn enqueue_update<S>(queue: &SharedQueue<S>, update: Update<S>) {
    queue.borrow_mut().pending = Some(update);
}

/// Compute the next value from a base value and a drained pending update.
///
/// With no pending update the base value comes back unchanged.
pub fn process_update_queue<S>(base: S, pending: Option<Update<S>>) -> S {
    match pending {
        Some(update) => update.action.apply(base),
        None => base,
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Something that can run the render + commit pipeline for a node's root.
pub(crate) trait ScheduleUpdate {
    fn schedule_update_on_node(&self, node: NodeId) -> Result<FlushOutcome>;
}

/// Handle that enqueues updates on a hook's queue and flushes its root.
///
/// Holds only weak references: once the component unmounts (or the root is
/// dropped) dispatching returns [`ReconcileError::Unmounted`].
pub struct Dispatch<S> {
    queue: Weak<RefCell<UpdateQueue<S>>>,
    node: NodeId,
    scheduler: Weak<dyn ScheduleUpdate>,
}

impl<S> Dispatch<S> {
    pub(crate) fn new(
        queue: &SharedQueue<S>,
        node: NodeId,
        scheduler: Weak<dyn ScheduleUpdate>,
    ) -> Self {
        Self {
            queue: Rc::downgrade(queue),
            node,
            scheduler,
        }
    }

    /// Enqueue an action and synchronously render + commit the root.
    ///
    /// The update is enqueued even when the flush is refused with
    /// [`ReconcileError::Reentrant`]; it is applied by the next flush.
    pub fn dispatch(&self, action: Action<S>) -> Result<FlushOutcome> {
        let queue = self.queue.upgrade().ok_or(ReconcileError::Unmounted)?;
        enqueue_update(&queue, create_update(action));
        let scheduler = self.scheduler.upgrade().ok_or(ReconcileError::Unmounted)?;
        scheduler.schedule_update_on_node(self.node)
    }

    /// Replace the state with `value`.
    pub fn set(&self, value: S) -> Result<FlushOutcome> {
        self.dispatch(Action::Replace(value))
    }

    /// Derive the next state from the previous one.
    pub fn update(&self, reducer: impl Fn(&S) -> S + 'static) -> Result<FlushOutcome> {
        self.dispatch(Action::Reduce(Rc::new(reducer)))
    }

    /// Node the dispatcher was created for.
    pub fn node(&self) -> NodeId {
        self.node
    }
}

impl<S> Clone for Dispatch<S> {
    fn clone(&self) -> Self {
        Self {
            queue: self.queue.clone(),
            node: self.node,
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<S> fmt::Debug for Dispatch<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatch")
            .field("node", &self.node)
            .field("mounted", &(self.queue.strong_count() > 0))
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

//! State hooks for function components.
//!
//! A component's hooks form a list in call order, stored in the node's
//! committed state. On the first render each `use_state` call appends a new
//! hook; on later renders the calls walk the previous list in the same order
//! and drain each hook's pending update.
//!
//! A [`Hooks`] value only exists while a component renders, so calling a
//! hook outside a render is not expressible.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::vec;

use tracing::trace;

use crate::engine::{
    create_update_queue, process_update_queue, Dispatch, NodeId, ScheduleUpdate, SharedQueue,
    UpdateQueue,
};
use crate::error::{ReconcileError, Result};

// =============================================================================
// Hook
// =============================================================================

/// One `use_state` slot.
///
/// The state and queue are type-erased so one list can hold hooks of
/// different state types.
#[derive(Clone)]
pub struct Hook {
    memoized_state: Rc<dyn Any>,
    queue: Rc<dyn Any>,
}

impl Hook {
    fn new<S: 'static>(state: S, queue: SharedQueue<S>) -> Self {
        Self {
            memoized_state: Rc::new(state),
            queue: queue as Rc<dyn Any>,
        }
    }

    fn state<S: Clone + 'static>(&self) -> Option<S> {
        self.memoized_state.downcast_ref::<S>().cloned()
    }

    fn queue<S: 'static>(&self) -> Option<SharedQueue<S>> {
        Rc::downcast::<RefCell<UpdateQueue<S>>>(Rc::clone(&self.queue)).ok()
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook").finish_non_exhaustive()
    }
}

// =============================================================================
// Hooks
// =============================================================================

/// Hook context handed to a component's render function.
pub struct Hooks {
    node: NodeId,
    component: String,
    previous: Option<vec::IntoIter<Hook>>,
    previous_len: usize,
    next: Vec<Hook>,
    scheduler: Weak<dyn ScheduleUpdate>,
    error: Option<ReconcileError>,
}

impl Hooks {
    /// Context for a first render.
    pub(crate) fn mount(node: NodeId, component: &str, scheduler: Weak<dyn ScheduleUpdate>) -> Self {
        Self {
            node,
            component: component.to_string(),
            previous: None,
            previous_len: 0,
            next: Vec::new(),
            scheduler,
            error: None,
        }
    }

    /// Context for a re-render over the committed hook list.
    pub(crate) fn update(
        node: NodeId,
        component: &str,
        previous: Vec<Hook>,
        scheduler: Weak<dyn ScheduleUpdate>,
    ) -> Self {
        Self {
            previous_len: previous.len(),
            previous: Some(previous.into_iter()),
            ..Self::mount(node, component, scheduler)
        }
    }

    /// True on the first render of this component instance.
    pub fn is_mount(&self) -> bool {
        self.previous.is_none()
    }

    /// Node the component is rendering into.
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// Declare a piece of state.
    ///
    /// `initial` runs only on mount. Returns the current value and a
    /// dispatcher that enqueues the next value and re-renders the root.
    pub fn use_state<S: Clone + 'static>(&mut self, initial: impl FnOnce() -> S) -> (S, Dispatch<S>) {
        let index = self.next.len();
        if self.previous.is_none() {
            return self.mount_state(initial());
        }

        let Some(hook) = self.previous.as_mut().and_then(Iterator::next) else {
            self.fail(ReconcileError::HookOrderChanged {
                component: self.component.clone(),
                previous: self.previous_len,
                next: index + 1,
            });
            return self.mount_state(initial());
        };

        let (Some(base), Some(queue)) = (hook.state::<S>(), hook.queue::<S>()) else {
            self.fail(ReconcileError::HookTypeMismatch {
                component: self.component.clone(),
                index,
            });
            return self.mount_state(initial());
        };

        self.update_state(base, queue)
    }

    fn mount_state<S: Clone + 'static>(&mut self, state: S) -> (S, Dispatch<S>) {
        let queue = create_update_queue::<S>();
        let dispatch = Dispatch::new(&queue, self.node, self.scheduler.clone());
        queue.borrow_mut().set_dispatch(dispatch.clone());
        self.next.push(Hook::new(state.clone(), queue));
        (state, dispatch)
    }

    fn update_state<S: Clone + 'static>(&mut self, base: S, queue: SharedQueue<S>) -> (S, Dispatch<S>) {
        let pending = queue.borrow_mut().take_pending();
        if pending.is_some() {
            trace!(component = %self.component, hook = self.next.len(), "draining state update");
        }
        let state = process_update_queue(base, pending);

        let existing = queue.borrow().dispatch().cloned();
        let dispatch = match existing {
            Some(dispatch) => dispatch,
            None => {
                let dispatch = Dispatch::new(&queue, self.node, self.scheduler.clone());
                queue.borrow_mut().set_dispatch(dispatch.clone());
                dispatch
            }
        };

        self.next.push(Hook::new(state.clone(), queue));
        (state, dispatch)
    }

    fn fail(&mut self, error: ReconcileError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Close the render and return the new hook list.
    pub(crate) fn finish(mut self) -> Result<Vec<Hook>> {
        if let Some(error) = self.error.take() {
            return Err(error);
        }
        if let Some(rest) = self.previous.as_ref() {
            if !rest.as_slice().is_empty() {
                return Err(ReconcileError::HookOrderChanged {
                    component: self.component,
                    previous: self.previous_len,
                    next: self.next.len(),
                });
            }
        }
        Ok(self.next)
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("node", &self.node)
            .field("component", &self.component)
            .field("mount", &self.is_mount())
            .field("called", &self.next.len())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Begin phase - the downward step of a render.
//!
//! Each unit of work computes a node's next children and reconciles them,
//! returning the first child to descend into.

use std::rc::Weak;

use crate::engine::{process_update_queue, NodeArena, NodeId, NodeState, ScheduleUpdate, WorkTag};
use crate::error::{ReconcileError, Result};
use crate::types::{Children, ElementType};

use super::child::reconcile_children;
use super::hooks::Hooks;

/// Run the begin step for one node and return its first child.
pub(crate) fn begin_work<I: Clone>(
    arena: &mut NodeArena<I>,
    scheduler: &Weak<dyn ScheduleUpdate>,
    work: NodeId,
) -> Result<Option<NodeId>> {
    match arena.node(work)?.tag {
        WorkTag::RootAnchor => update_host_root(arena, work)?,
        WorkTag::HostElement => update_host_element(arena, work)?,
        WorkTag::HostText => return Ok(None),
        WorkTag::FunctionComponent => update_function_component(arena, scheduler, work)?,
    }
    Ok(arena.node(work)?.child)
}

/// Drain the root queue into the committed descriptor, then reconcile it.
fn update_host_root<I: Clone>(arena: &mut NodeArena<I>, work: NodeId) -> Result<()> {
    let node = arena.node_mut(work)?;
    let queue = node
        .update_queue
        .clone()
        .ok_or(ReconcileError::MissingUpdateQueue(work))?;

    let base = match std::mem::take(&mut node.committed_state) {
        NodeState::Root(children) => children,
        _ => Children::Empty,
    };
    let pending = queue.borrow_mut().take_pending();
    let next = process_update_queue(base, pending);
    node.committed_state = NodeState::Root(next.clone());

    reconcile_children(arena, work, &next)
}

fn update_host_element<I: Clone>(arena: &mut NodeArena<I>, work: NodeId) -> Result<()> {
    let children = arena.node(work)?.pending_props.children.clone();
    reconcile_children(arena, work, &children)
}

/// Render a component with its hook list, then reconcile what it returned.
fn update_function_component<I: Clone>(
    arena: &mut NodeArena<I>,
    scheduler: &Weak<dyn ScheduleUpdate>,
    work: NodeId,
) -> Result<()> {
    let node = arena.node_mut(work)?;
    let component = match &node.element_type {
        Some(ElementType::Component(component)) => component.clone(),
        Some(ElementType::Host(_)) => return Err(ReconcileError::NotAComponent(work)),
        None => return Err(ReconcileError::MissingElementType(work)),
    };
    let props = node.pending_props.clone();

    let mut hooks = match (node.counterpart, std::mem::take(&mut node.committed_state)) {
        (Some(_), NodeState::Hooks(previous)) => {
            Hooks::update(work, component.name(), previous, scheduler.clone())
        }
        _ => Hooks::mount(work, component.name(), scheduler.clone()),
    };

    let children = component.render(&props, &mut hooks)?;
    let list = hooks.finish()?;
    arena.node_mut(work)?.committed_state = NodeState::Hooks(list);

    reconcile_children(arena, work, &children)
}

// =============================================================================
// Tests
// =============================================================================

//! Complete phase - the upward step of a render.
//!
//! First materialization of a host node creates its instance and attaches
//! the host instances of its already-completed subtree to it, all off-tree.
//! A revisit compares against the committed props and marks `UPDATE`.
//! Every node then folds its children's flags into `subtree_flags`.

use tracing::warn;

use crate::engine::{bubble, Flags, NodeArena, NodeId, WorkTag};
use crate::error::{ReconcileError, Result};
use crate::host::{diff_props, HostConfig};
use crate::types::Props;

/// Run the complete step for one node.
pub(crate) fn complete_work<H: HostConfig>(
    arena: &mut NodeArena<H::Instance>,
    host: &mut H,
    work: NodeId,
) -> Result<()> {
    match arena.node(work)?.tag {
        WorkTag::RootAnchor | WorkTag::FunctionComponent => {}
        WorkTag::HostElement => complete_host_element(arena, host, work)?,
        WorkTag::HostText => complete_host_text(arena, host, work)?,
    }
    bubble_properties(arena, work)
}

fn complete_host_element<H: HostConfig>(
    arena: &mut NodeArena<H::Instance>,
    host: &mut H,
    work: NodeId,
) -> Result<()> {
    let node = arena.node(work)?;

    if let (Some(current), Some(_)) = (node.counterpart, node.host_instance.as_ref()) {
        let empty = Props::new();
        let previous = arena.node(current)?.committed_props.as_ref().unwrap_or(&empty);
        let patch = diff_props(previous, &node.pending_props);
        if !patch.is_empty() {
            let node = arena.node_mut(work)?;
            node.update_payload = Some(patch);
            node.flags |= Flags::UPDATE;
        }
        return Ok(());
    }

    let tag = node
        .element_type
        .as_ref()
        .and_then(|ty| ty.tag())
        .ok_or(ReconcileError::MissingElementType(work))?;
    let instance = host.create_instance(tag, &node.pending_props);
    append_all_children(arena, host, &instance, work)?;
    arena.node_mut(work)?.host_instance = Some(instance);
    Ok(())
}

fn complete_host_text<H: HostConfig>(
    arena: &mut NodeArena<H::Instance>,
    host: &mut H,
    work: NodeId,
) -> Result<()> {
    let node = arena.node(work)?;

    if let (Some(current), Some(_)) = (node.counterpart, node.host_instance.as_ref()) {
        let previous = arena.node(current)?.committed_props.as_ref().map(Props::content);
        if previous != Some(node.pending_props.content()) {
            arena.node_mut(work)?.flags |= Flags::UPDATE;
        }
        return Ok(());
    }

    let instance = host.create_text_instance(node.pending_props.content());
    arena.node_mut(work)?.host_instance = Some(instance);
    Ok(())
}

/// Append the top-level host instances of `work`'s subtree to `parent`.
///
/// Descends through non-host nodes until a host-bearing one is found; host
/// nodes are not descended into since their own subtree is already attached.
fn append_all_children<H: HostConfig>(
    arena: &mut NodeArena<H::Instance>,
    host: &mut H,
    parent: &H::Instance,
    work: NodeId,
) -> Result<()> {
    let mut next = arena.node(work)?.child;

    while let Some(id) = next {
        let node = arena.node(id)?;
        if node.tag.is_host() {
            match node.host_instance.as_ref() {
                Some(instance) => host.append_initial_child(parent, instance),
                None => warn!(node = node.display_name(), "completed host node has no instance"),
            }
        } else if let Some(child) = node.child {
            arena.node_mut(child)?.parent = Some(id);
            next = Some(child);
            continue;
        }

        // Climb until a sibling exists or we are back at `work`
        let mut cursor = id;
        next = loop {
            let node = arena.node(cursor)?;
            let (sibling, parent) = (node.sibling, node.parent);
            if let Some(sibling) = sibling {
                arena.node_mut(sibling)?.parent = parent;
                break Some(sibling);
            }
            match parent {
                Some(parent) if parent != work => cursor = parent,
                _ => break None,
            }
        };
    }
    Ok(())
}

/// Fold every child's flags into `work.subtree_flags` and fix parent links.
fn bubble_properties<I: Clone>(arena: &mut NodeArena<I>, work: NodeId) -> Result<()> {
    let mut subtree = Flags::empty();
    let mut next = arena.node(work)?.child;

    while let Some(id) = next {
        let child = arena.node_mut(id)?;
        subtree = bubble(subtree, child.flags, child.subtree_flags);
        child.parent = Some(work);
        next = child.sibling;
    }

    arena.node_mut(work)?.subtree_flags |= subtree;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostOp, MemoryHost, PropChange};
    use crate::types::{Children, Component, Element};

    fn link(arena: &mut NodeArena<crate::host::HostId>, parent: NodeId, child: NodeId) {
        arena.node_mut(parent).unwrap().child = Some(child);
        arena.node_mut(child).unwrap().parent = Some(parent);
    }

    #[test]
    fn test_mount_builds_subtree_off_tree() {
        let mut host = MemoryHost::new();
        let mut arena = NodeArena::new();
        let div = arena.create_from_element(&Element::host("div", Props::new()));
        let text = arena.create_text("Hello");
        link(&mut arena, div, text);

        complete_work(&mut arena, &mut host, text).unwrap();
        complete_work(&mut arena, &mut host, div).unwrap();

        let div_instance = arena.node(div).unwrap().host_instance.unwrap();
        let text_instance = arena.node(text).unwrap().host_instance.unwrap();
        assert_eq!(host.children(div_instance), &[text_instance]);
        assert_eq!(host.count_ops(HostOp::is_mutation), 0);
    }

    #[test]
    fn test_append_skips_through_components() {
        let mut host = MemoryHost::new();
        let mut arena = NodeArena::new();
        let comp = Component::new("Wrap", |_, _| Children::Empty);
        let div = arena.create_from_element(&Element::host("div", Props::new()));
        let wrap = arena.create_from_element(&Element::component(&comp, Props::new()));
        let text = arena.create_text("inner");
        link(&mut arena, div, wrap);
        link(&mut arena, wrap, text);

        complete_work(&mut arena, &mut host, text).unwrap();
        complete_work(&mut arena, &mut host, wrap).unwrap();
        complete_work(&mut arena, &mut host, div).unwrap();

        let div_instance = arena.node(div).unwrap().host_instance.unwrap();
        assert_eq!(host.text_content(div_instance), "inner");
        assert!(arena.node(wrap).unwrap().host_instance.is_none());
    }

    #[test]
    fn test_bubble_collects_child_flags() {
        let mut host = MemoryHost::new();
        let mut arena = NodeArena::new();
        let comp = Component::new("C", |_, _| Children::Empty);
        let parent = arena.create_from_element(&Element::component(&comp, Props::new()));
        let child = arena.create_text("x");
        link(&mut arena, parent, child);
        {
            let node = arena.node_mut(child).unwrap();
            node.flags = Flags::PLACEMENT;
            node.subtree_flags = Flags::UPDATE;
        }

        complete_work(&mut arena, &mut host, parent).unwrap();
        let node = arena.node(parent).unwrap();
        assert_eq!(node.subtree_flags, Flags::PLACEMENT | Flags::UPDATE);
        assert!(node.flags.is_empty());
    }

    #[test]
    fn test_text_revisit_marks_update_only_on_change() {
        let mut host = MemoryHost::new();
        let mut arena = NodeArena::new();
        let current = arena.create_text("Hello");
        complete_work(&mut arena, &mut host, current).unwrap();
        arena.node_mut(current).unwrap().committed_props = Some(Props::text("Hello"));

        let same = arena.derive_work_counterpart(current, Props::text("Hello")).unwrap();
        complete_work(&mut arena, &mut host, same).unwrap();
        assert!(arena.node(same).unwrap().flags.is_empty());

        let changed = arena.derive_work_counterpart(current, Props::text("World")).unwrap();
        complete_work(&mut arena, &mut host, changed).unwrap();
        assert_eq!(arena.node(changed).unwrap().flags, Flags::UPDATE);

        // Revisits never create instances
        assert_eq!(host.count_ops(|op| matches!(op, HostOp::CreateTextInstance { .. })), 1);
    }

    #[test]
    fn test_element_revisit_stores_patch() {
        let mut host = MemoryHost::new();
        let mut arena = NodeArena::new();
        let props = Props::new().with_attr("class", "a");
        let current = arena.create_from_element(&Element::host("div", props.clone()));
        complete_work(&mut arena, &mut host, current).unwrap();
        arena.node_mut(current).unwrap().committed_props = Some(props);

        let next = Props::new().with_attr("class", "b");
        let work = arena.derive_work_counterpart(current, next).unwrap();
        complete_work(&mut arena, &mut host, work).unwrap();

        let node = arena.node(work).unwrap();
        assert_eq!(node.flags, Flags::UPDATE);
        assert_eq!(
            node.update_payload.as_ref().map(|p| p.changes.clone()),
            Some(vec![PropChange::Set { name: "class".into(), value: "b".into() }])
        );
    }
}

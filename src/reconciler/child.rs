//! Child reconciliation - diff a parent's previous child against its next
//! children descriptor.
//!
//! Only a single element or a single text child is diffed. Matching is by
//! key first, then by element type; a match reuses the previous node's
//! counterpart, anything else deletes the previous child and creates fresh.
//!
//! Side-effect tracking is on only when the parent already has a
//! counterpart. On first mount the whole subtree is new, so only the top
//! node returned to an already-mounted parent gets `PLACEMENT`.

use tracing::warn;

use crate::engine::{Flags, NodeArena, NodeId, WorkTag};
use crate::error::Result;
use crate::types::{Children, Element, Props};

/// Reconcile `children` under `work` and link the result as its first child.
pub(crate) fn reconcile_children<I: Clone>(
    arena: &mut NodeArena<I>,
    work: NodeId,
    children: &Children,
) -> Result<()> {
    let current_child = match arena.node(work)?.counterpart {
        Some(current) => arena.node(current)?.child,
        None => None,
    };
    let track_side_effects = arena.node(work)?.counterpart.is_some();

    let mut reconciler = ChildReconciler {
        arena: &mut *arena,
        track_side_effects,
    };
    let child = reconciler.reconcile(work, current_child, children)?;
    arena.node_mut(work)?.child = child;
    Ok(())
}

struct ChildReconciler<'a, I> {
    arena: &'a mut NodeArena<I>,
    track_side_effects: bool,
}

impl<I: Clone> ChildReconciler<'_, I> {
    fn reconcile(
        &mut self,
        parent: NodeId,
        current_child: Option<NodeId>,
        children: &Children,
    ) -> Result<Option<NodeId>> {
        match children {
            Children::Element(element) => {
                let child = self.reconcile_single_element(parent, current_child, element)?;
                self.place_single_child(child).map(Some)
            }
            Children::Text(content) => {
                let child = self.reconcile_single_text(parent, current_child, content)?;
                self.place_single_child(child).map(Some)
            }
            Children::Empty => {
                self.delete_remaining_children(parent, current_child)?;
                Ok(None)
            }
            Children::List(items) => {
                warn!(
                    parent = self.arena.node(parent)?.display_name(),
                    len = items.len(),
                    "list children are not supported; rendering nothing"
                );
                self.delete_remaining_children(parent, current_child)?;
                Ok(None)
            }
        }
    }

    fn reconcile_single_element(
        &mut self,
        parent: NodeId,
        current_child: Option<NodeId>,
        element: &Element,
    ) -> Result<NodeId> {
        if let Some(current) = current_child {
            let node = self.arena.node(current)?;
            let same_key = node.key == element.key;
            let same_type = node.element_type.as_ref() == Some(&element.element_type);

            if same_key && same_type {
                let existing = self.use_existing(current, element.props.clone())?;
                self.arena.node_mut(existing)?.parent = Some(parent);
                return Ok(existing);
            }
            self.delete_child(parent, current)?;
        }

        let fresh = self.arena.create_from_element(element);
        self.arena.node_mut(fresh)?.parent = Some(parent);
        Ok(fresh)
    }

    fn reconcile_single_text(
        &mut self,
        parent: NodeId,
        current_child: Option<NodeId>,
        content: &str,
    ) -> Result<NodeId> {
        if let Some(current) = current_child {
            if self.arena.node(current)?.tag == WorkTag::HostText {
                let existing = self.use_existing(current, Props::text(content))?;
                self.arena.node_mut(existing)?.parent = Some(parent);
                return Ok(existing);
            }
            self.delete_child(parent, current)?;
        }

        let fresh = self.arena.create_text(content);
        self.arena.node_mut(fresh)?.parent = Some(parent);
        Ok(fresh)
    }

    /// Work counterpart of `current` as a sole child.
    fn use_existing(&mut self, current: NodeId, props: Props) -> Result<NodeId> {
        let work = self.arena.derive_work_counterpart(current, props)?;
        self.arena.node_mut(work)?.sibling = None;
        Ok(work)
    }

    fn place_single_child(&mut self, child: NodeId) -> Result<NodeId> {
        if self.track_side_effects {
            let node = self.arena.node_mut(child)?;
            if node.counterpart.is_none() {
                node.flags |= Flags::PLACEMENT;
            }
        }
        Ok(child)
    }

    fn delete_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if !self.track_side_effects {
            return Ok(());
        }
        let node = self.arena.node_mut(parent)?;
        node.deletions.push(child);
        node.flags |= Flags::CHILD_DELETION;
        Ok(())
    }

    fn delete_remaining_children(&mut self, parent: NodeId, first: Option<NodeId>) -> Result<()> {
        let mut next = first;
        while let Some(child) = next {
            next = self.arena.node(child)?.sibling;
            self.delete_child(parent, child)?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::WorkNode;
    use crate::types::Component;

    /// Root anchor pair plus one committed child, the way a finished first
    /// render leaves them.
    fn mounted(child: &Element) -> (NodeArena<u32>, NodeId, NodeId) {
        let mut arena = NodeArena::new();
        let current_root = arena.insert(WorkNode::new(WorkTag::RootAnchor, Props::new(), None));
        let current_child = arena.create_from_element(child);
        arena.node_mut(current_root).unwrap().child = Some(current_child);
        arena.node_mut(current_child).unwrap().parent = Some(current_root);
        let work_root = arena.derive_work_counterpart(current_root, Props::new()).unwrap();
        (arena, work_root, current_child)
    }

    fn div() -> Element {
        Element::host("div", Props::new())
    }

    #[test]
    fn test_mount_path_marks_nothing() {
        let mut arena: NodeArena<u32> = NodeArena::new();
        let parent = arena.create_from_element(&div());

        reconcile_children(&mut arena, parent, &Children::from(div())).unwrap();
        let child = arena.node(parent).unwrap().child.unwrap();
        let node = arena.node(child).unwrap();
        assert!(node.flags.is_empty());
        assert_eq!(node.parent, Some(parent));
    }

    #[test]
    fn test_fresh_child_of_mounted_parent_is_placed() {
        let mut arena: NodeArena<u32> = NodeArena::new();
        let current_root = arena.insert(WorkNode::new(WorkTag::RootAnchor, Props::new(), None));
        let work_root = arena.derive_work_counterpart(current_root, Props::new()).unwrap();

        reconcile_children(&mut arena, work_root, &Children::from(div())).unwrap();
        let child = arena.node(work_root).unwrap().child.unwrap();
        assert_eq!(arena.node(child).unwrap().flags, Flags::PLACEMENT);
    }

    #[test]
    fn test_same_key_and_type_reuses_counterpart() {
        let (mut arena, work_root, current_child) = mounted(&div().with_key("a"));

        let next = Element::host("div", Props::new().with_attr("id", "x")).with_key("a");
        reconcile_children(&mut arena, work_root, &Children::from(next)).unwrap();

        let child = arena.node(work_root).unwrap().child.unwrap();
        let node = arena.node(child).unwrap();
        assert_eq!(node.counterpart, Some(current_child));
        assert!(node.flags.is_empty());
        assert_eq!(node.pending_props.attr("id"), Some(&"x".into()));
        assert!(arena.node(work_root).unwrap().deletions.is_empty());
    }

    #[test]
    fn test_key_mismatch_replaces() {
        let (mut arena, work_root, current_child) = mounted(&div().with_key("a"));

        reconcile_children(&mut arena, work_root, &Children::from(div().with_key("b"))).unwrap();

        let root = arena.node(work_root).unwrap();
        assert_eq!(root.deletions, vec![current_child]);
        assert!(root.flags.contains(Flags::CHILD_DELETION));
        let child = root.child.unwrap();
        assert_ne!(child, current_child);
        assert_eq!(arena.node(child).unwrap().flags, Flags::PLACEMENT);
    }

    #[test]
    fn test_type_mismatch_with_same_key_replaces() {
        let (mut arena, work_root, current_child) = mounted(&div().with_key("a"));

        let span = Element::host("span", Props::new()).with_key("a");
        reconcile_children(&mut arena, work_root, &Children::from(span)).unwrap();

        let root = arena.node(work_root).unwrap();
        assert_eq!(root.deletions, vec![current_child]);
        let placed = arena.node(root.child.unwrap()).unwrap();
        assert_eq!(placed.flags, Flags::PLACEMENT);
        assert_eq!(placed.element_type.as_ref().and_then(|t| t.tag()), Some("span"));
    }

    #[test]
    fn test_component_identity_decides_reuse() {
        let a = Component::new("A", |_, _| Children::Empty);
        let b = Component::new("A", |_, _| Children::Empty);
        let (mut arena, work_root, current_child) = mounted(&Element::component(&a, Props::new()));

        reconcile_children(&mut arena, work_root, &Children::from(Element::component(&b, Props::new())))
            .unwrap();
        assert_eq!(arena.node(work_root).unwrap().deletions, vec![current_child]);
    }

    #[test]
    fn test_text_reuses_any_text() {
        let mut arena: NodeArena<u32> = NodeArena::new();
        let current_root = arena.insert(WorkNode::new(WorkTag::RootAnchor, Props::new(), None));
        let text = arena.create_text("Hello");
        arena.node_mut(current_root).unwrap().child = Some(text);
        let work_root = arena.derive_work_counterpart(current_root, Props::new()).unwrap();

        reconcile_children(&mut arena, work_root, &Children::from("World")).unwrap();

        let child = arena.node(work_root).unwrap().child.unwrap();
        let node = arena.node(child).unwrap();
        assert_eq!(node.counterpart, Some(text));
        assert_eq!(node.pending_props.content(), "World");
        assert!(node.flags.is_empty());
    }

    #[test]
    fn test_text_replaces_element() {
        let (mut arena, work_root, current_child) = mounted(&div());

        reconcile_children(&mut arena, work_root, &Children::from("x")).unwrap();

        let root = arena.node(work_root).unwrap();
        assert_eq!(root.deletions, vec![current_child]);
        assert_eq!(arena.node(root.child.unwrap()).unwrap().tag, WorkTag::HostText);
    }

    #[test]
    fn test_empty_and_list_delete_previous() {
        let (mut arena, work_root, current_child) = mounted(&div());
        reconcile_children(&mut arena, work_root, &Children::Empty).unwrap();
        assert_eq!(arena.node(work_root).unwrap().child, None);
        assert_eq!(arena.node(work_root).unwrap().deletions, vec![current_child]);

        let (mut arena, work_root, current_child) = mounted(&div());
        let list = Children::List(vec![Children::from("a"), Children::from("b")]);
        reconcile_children(&mut arena, work_root, &list).unwrap();
        assert_eq!(arena.node(work_root).unwrap().child, None);
        assert_eq!(arena.node(work_root).unwrap().deletions, vec![current_child]);
    }
}

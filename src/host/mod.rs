//! Host renderer interface.
//!
//! The reconciler never touches a platform directly. It asks a [`HostConfig`]
//! to create instances during completion and to attach, detach and sync them
//! during commit.
//!
//! # Reference hosts
//!
//! - [`MemoryHost`] - in-memory host tree that records every operation
//! - [`TerminalRenderer`] - draws a `MemoryHost` subtree to a terminal

mod memory;
mod terminal;

pub use memory::{HostId, HostNodeKind, HostOp, MemoryHost};
pub use terminal::{Frame, FrameLine, TerminalRenderer};

use std::fmt;

use crate::types::{PropValue, Props};

// =============================================================================
// HostConfig
// =============================================================================

/// Operations the reconciler needs from a host platform.
///
/// `Instance` is an opaque handle; cloning it must not clone the underlying
/// platform object. The root container is an `Instance` as well.
pub trait HostConfig {
    type Instance: Clone + fmt::Debug + PartialEq + 'static;

    /// Create an element instance, not yet attached anywhere.
    fn create_instance(&mut self, tag: &str, props: &Props) -> Self::Instance;

    /// Create a text instance, not yet attached anywhere.
    fn create_text_instance(&mut self, content: &str) -> Self::Instance;

    /// Attach a child while building a detached subtree.
    fn append_initial_child(&mut self, parent: &Self::Instance, child: &Self::Instance);

    /// Attach a child into a live host parent.
    fn append_child_to_container(&mut self, child: &Self::Instance, container: &Self::Instance);

    /// Detach a child from a live host parent.
    fn remove_child(&mut self, child: &Self::Instance, container: &Self::Instance);

    /// Replace the content of a text instance.
    fn commit_text_update(&mut self, text: &Self::Instance, content: &str);

    /// Apply attribute changes to an element instance.
    fn commit_update(&mut self, instance: &Self::Instance, patch: &PropPatch);

    /// Dispose of an instance built by a render that was abandoned.
    ///
    /// The instance was never attached to a live host parent. Hosts whose
    /// instances need no cleanup can keep the default no-op.
    fn release_instance(&mut self, instance: &Self::Instance) {
        let _ = instance;
    }
}

// =============================================================================
// Property diff
// =============================================================================

/// One attribute change.
#[derive(Debug, Clone, PartialEq)]
pub enum PropChange {
    Set { name: String, value: PropValue },
    Remove { name: String },
}

/// Ordered list of attribute changes for one element.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropPatch {
    pub changes: Vec<PropChange>,
}

impl PropPatch {
    /// True if nothing changed.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.changes.len()
    }
}

/// Shallow key-by-key diff of element attributes.
///
/// Children and text content are not attributes and never appear in the
/// patch. Removals come first, then sets, each in attribute-name order.
pub fn diff_props(previous: &Props, next: &Props) -> PropPatch {
    let mut changes = Vec::new();

    for name in previous.attributes.keys() {
        if !next.attributes.contains_key(name) {
            changes.push(PropChange::Remove { name: name.clone() });
        }
    }

    for (name, value) in &next.attributes {
        if previous.attributes.get(name) != Some(value) {
            changes.push(PropChange::Set {
                name: name.clone(),
                value: value.clone(),
            });
        }
    }

    PropPatch { changes }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_props_produce_empty_patch() {
        let a = Props::new().with_attr("id", "x").with_children("one");
        let b = Props::new().with_attr("id", "x").with_children("two");
        assert!(diff_props(&a, &b).is_empty());
    }

    #[test]
    fn test_patch_contents() {
        let prev = Props::new()
            .with_attr("class", "old")
            .with_attr("hidden", true)
            .with_attr("id", "x");
        let next = Props::new()
            .with_attr("class", "new")
            .with_attr("id", "x")
            .with_attr("title", "t");

        let patch = diff_props(&prev, &next);
        assert_eq!(
            patch.changes,
            vec![
                PropChange::Remove { name: "hidden".into() },
                PropChange::Set { name: "class".into(), value: "new".into() },
                PropChange::Set { name: "title".into(), value: "t".into() },
            ]
        );
        assert_eq!(patch.len(), 3);
    }

    #[test]
    fn test_value_type_change_counts() {
        let prev = Props::new().with_attr("n", 1);
        let next = Props::new().with_attr("n", "1");
        assert_eq!(diff_props(&prev, &next).len(), 1);
    }
}

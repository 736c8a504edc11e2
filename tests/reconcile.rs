//! End-to-end reconciliation against the in-memory host.
//!
//! Each test mounts a tree into a `MemoryHost`, drives updates through the
//! public entry points and checks the exact host operations issued.
//!
//! Run with: cargo test --test reconcile -- --nocapture

use spark_fiber::{
    create_container, element, text, unmount, update_container, Children, Flags, HostId, HostOp,
    MemoryHost, RootHandle, WorkTag,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn mount() -> (RootHandle<MemoryHost>, HostId) {
    init_tracing();
    let mut host = MemoryHost::new();
    let container = host.create_container();
    (create_container(host, container), container)
}

fn take_ops(root: &RootHandle<MemoryHost>) -> Vec<HostOp> {
    root.with_host_mut(MemoryHost::take_ops).unwrap()
}

fn count(ops: &[HostOp], predicate: impl Fn(&HostOp) -> bool) -> usize {
    ops.iter().filter(|op| predicate(op)).count()
}

fn assert_no_flags(root: &RootHandle<MemoryHost>) {
    root.with_tree(|arena, current| {
        let mut stack = vec![current];
        while let Some(id) = stack.pop() {
            let node = arena.node(id).unwrap();
            assert!(!node.flags.intersects(Flags::MUTATION_MASK), "{node:?}");
            stack.extend(arena.children(id));
        }
    }).unwrap();
}

// =============================================================================
// Scenario
// =============================================================================

#[test]
fn test_hello_world_span_scenario() {
    let (root, container) = mount();

    // Mount div > "Hello"
    update_container(element("div").key("k").child("Hello"), &root).unwrap();
    let ops = take_ops(&root);
    assert_eq!(count(&ops, |op| matches!(op, HostOp::AppendChildToContainer { .. })), 1);
    root.with_host(|host| {
        let children = host.children(container);
        assert_eq!(children.len(), 1);
        assert_eq!(host.tag(children[0]), Some("div"));
        assert_eq!(host.text_content(children[0]), "Hello");
    }).unwrap();
    let div = root.with_host(|host| host.children(container)[0]).unwrap();

    // Text change only
    let outcome = update_container(element("div").key("k").child("World"), &root).unwrap();
    let ops = take_ops(&root);
    assert_eq!(count(&ops, |op| matches!(op, HostOp::AppendChildToContainer { .. })), 0);
    assert_eq!(
        ops.iter()
            .filter_map(|op| match op {
                HostOp::CommitTextUpdate { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>(),
        vec!["World"]
    );
    assert_eq!(outcome.report().map(|r| r.placements), Some(0));
    root.with_host(|host| assert_eq!(host.text_content(container), "World")).unwrap();

    // Type change with the same key
    let outcome = update_container(element("span").key("k").child("World"), &root).unwrap();
    let ops = take_ops(&root);
    let report = outcome.report().unwrap();
    assert_eq!(report.deletions, 1);
    assert_eq!(report.placements, 1);
    assert_eq!(
        count(&ops, |op| matches!(op, HostOp::RemoveChild { child, .. } if *child == div)),
        1
    );
    assert_eq!(count(&ops, |op| matches!(op, HostOp::AppendChildToContainer { .. })), 1);
    root.with_host(|host| {
        let children = host.children(container);
        assert_eq!(children.len(), 1);
        assert_ne!(children[0], div);
        assert_eq!(host.tag(children[0]), Some("span"));
        assert_eq!(host.text_content(children[0]), "World");
    }).unwrap();
    assert_no_flags(&root);
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn test_noop_update_touches_nothing() {
    let (root, _) = mount();
    let tree = || element("div").attr("class", "a").child("same");

    update_container(tree(), &root).unwrap();
    take_ops(&root);

    let outcome = update_container(tree(), &root).unwrap();
    let report = outcome.report().unwrap();
    assert!(!report.walked);
    assert!(report.is_noop());
    assert!(take_ops(&root).is_empty());

    root.with_tree(|arena, current| {
        let anchor = arena.node(current).unwrap();
        assert!(!(anchor.flags | anchor.subtree_flags).has_mutations());
    }).unwrap();
}

#[test]
fn test_matching_key_and_type_keeps_instance() {
    let (root, container) = mount();

    update_container(element("div").key("a").attr("class", "x").child("t"), &root).unwrap();
    let before = root.with_host(|host| host.children(container)[0]).unwrap();
    take_ops(&root);

    let outcome = update_container(element("div").key("a").attr("class", "y").child("t"), &root).unwrap();
    let report = outcome.report().unwrap();
    assert_eq!(report.placements, 0);
    assert_eq!(report.deletions, 0);
    assert_eq!(report.updates, 1);

    root.with_host(|host| {
        assert_eq!(host.children(container), &[before]);
        assert_eq!(host.attribute(before, "class"), Some(&"y".into()));
    }).unwrap();
    let ops = take_ops(&root);
    assert!(ops.iter().all(|op| matches!(op, HostOp::CommitUpdate { id, .. } if *id == before)));
}

#[test]
fn test_removed_attribute_is_patched() {
    let (root, container) = mount();
    update_container(element("div").attr("hidden", true).child("t"), &root).unwrap();
    update_container(element("div").child("t"), &root).unwrap();

    root.with_host(|host| {
        let div = host.children(container)[0];
        assert_eq!(host.attribute(div, "hidden"), None);
    }).unwrap();
}

#[test]
fn test_key_change_replaces() {
    let (root, container) = mount();
    update_container(element("div").key("a").child("t"), &root).unwrap();
    let before = root.with_host(|host| host.children(container)[0]).unwrap();

    let outcome = update_container(element("div").key("b").child("t"), &root).unwrap();
    let report = outcome.report().unwrap();
    assert_eq!((report.deletions, report.placements), (1, 1));
    root.with_host(|host| {
        assert_eq!(host.children(container).len(), 1);
        assert_ne!(host.children(container)[0], before);
    }).unwrap();
}

#[test]
fn test_three_level_mount_places_once() {
    let (root, container) = mount();

    let tree = element("div").child(element("section").child(element("p").child("deep")));
    let outcome = update_container(tree, &root).unwrap();
    let ops = take_ops(&root);

    assert_eq!(count(&ops, |op| matches!(op, HostOp::AppendChildToContainer { .. })), 1);
    assert_eq!(count(&ops, |op| matches!(op, HostOp::AppendInitialChild { .. })), 3);
    assert_eq!(
        ops.iter().position(|op| matches!(op, HostOp::AppendChildToContainer { .. })),
        Some(ops.len() - 1)
    );
    assert_eq!(outcome.report().map(|r| r.placements), Some(1));
    root.with_host(|host| assert_eq!(host.text_content(container), "deep")).unwrap();
    assert_no_flags(&root);
}

#[test]
fn test_text_root_child() {
    let (root, container) = mount();
    update_container(text("plain"), &root).unwrap();
    update_container(text("changed"), &root).unwrap();

    root.with_host(|host| {
        let children = host.children(container);
        assert_eq!(children.len(), 1);
        assert_eq!(host.text(children[0]), Some("changed"));
    }).unwrap();
}

#[test]
fn test_element_replaced_by_text() {
    let (root, container) = mount();
    update_container(element("div").child("a"), &root).unwrap();
    let outcome = update_container(text("b"), &root).unwrap();

    assert_eq!(outcome.report().map(|r| (r.deletions, r.placements)), Some((1, 1)));
    root.with_host(|host| {
        let children = host.children(container);
        assert_eq!(children.len(), 1);
        assert_eq!(host.text(children[0]), Some("b"));
    }).unwrap();
}

#[test]
fn test_list_children_render_nothing() {
    let (root, container) = mount();
    update_container(element("div").child("a"), &root).unwrap();

    let list = Children::List(vec![text("a"), text("b")]);
    let outcome = update_container(list, &root).unwrap();
    assert_eq!(outcome.report().map(|r| r.deletions), Some(1));
    root.with_host(|host| assert!(host.children(container).is_empty())).unwrap();
}

#[test]
fn test_unmount_releases_nodes() {
    let (root, container) = mount();
    update_container(element("div").child(element("p").child("x")), &root).unwrap();
    update_container(element("div").child(element("p").child("y")), &root).unwrap();

    let outcome = unmount(&root).unwrap();
    let report = outcome.report().unwrap();
    assert_eq!(report.deletions, 1);
    assert_eq!(report.unmounted, 3);
    assert_eq!(report.host_ops, 1);

    root.with_host(|host| assert!(host.children(container).is_empty())).unwrap();
    root.with_tree(|arena, current| {
        assert_eq!(arena.len(), 2);
        assert_eq!(arena.node(current).unwrap().tag, WorkTag::RootAnchor);
    }).unwrap();
}

#[test]
fn test_node_count_stays_bounded() {
    let (root, _) = mount();
    for i in 0..20 {
        update_container(element("div").child(format!("tick {i}")), &root).unwrap();
    }
    // Anchor pair, div pair, text pair
    root.with_tree(|arena, _| assert_eq!(arena.len(), 6)).unwrap();
}

//! Relative traversal with descent tokens and parent operators.

use trellis::foundation::{ErrorKind, NodeId};
use trellis::tree::{ElementHandle, EntityTree, NodeDescriptor};

fn leaf(handle: u64) -> NodeDescriptor {
    NodeDescriptor::leaf(ElementHandle(handle))
}

/// top: list [ group{one: list[leaf, leaf]}, group{one: list[leaf, leaf]} ]
fn nested() -> (EntityTree, NodeId) {
    fn branch() -> NodeDescriptor {
        NodeDescriptor::group()
            .with_child(
                "one",
                NodeDescriptor::list()
                    .with_item(leaf(0))
                    .unwrap()
                    .with_item(leaf(1))
                    .unwrap(),
            )
            .unwrap()
    }
    let mut tree = EntityTree::new();
    let top = tree
        .create(
            NodeDescriptor::list()
                .with_item(branch())
                .unwrap()
                .with_item(branch())
                .unwrap(),
        )
        .unwrap();
    (tree, top)
}

#[test]
fn ascends_then_descends() {
    let (tree, top) = nested();
    // Three levels deep: top -> [1] -> one -> [0]
    let deep = tree.get_entity(top, "[1].one[0]").unwrap();
    let resolved = tree.get_entity(deep, "^^[0].one[1]").unwrap();
    let expected = tree.get_entity(top, "[0].one[1]").unwrap();
    assert_eq!(resolved, expected);
}

#[test]
fn ascent_past_the_top_reports_the_failing_step() {
    let (tree, top) = nested();
    // One ancestor only: top -> [0]
    let shallow = tree.get_entity(top, "[0]").unwrap();
    let err = tree.get_entity(shallow, "^^[0].one[1]").unwrap_err();
    assert_eq!(format!("{err}"), "parent operator error at index 1");
    assert!(matches!(err.kind, ErrorKind::ParentOperator { index: 1 }));
}

#[test]
fn descent_failures_identify_the_last_resolved_node() {
    let (tree, top) = nested();

    let err = tree.get_entity(top, "[0].one[5]").unwrap_err();
    let ErrorKind::ChildNotFound { token, path } = err.kind else {
        panic!("expected child-not-found");
    };
    assert_eq!(token, "[5]");
    assert_eq!(path, "[0].one");

    let err = tree.get_entity(top, "[0].one[0].anything").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NoChildren { .. }));
}

#[test]
fn key_never_addresses_a_list_and_index_never_a_group() {
    let (tree, top) = nested();
    assert!(tree.get_entity(top, "one").is_err());
    let group = tree.get_entity(top, "[0]").unwrap();
    assert!(tree.get_entity(group, "[0]").is_err());
}

#[test]
fn empty_path_resolves_to_the_starting_node() {
    let (tree, top) = nested();
    assert_eq!(tree.get_entity(top, "").unwrap(), top);
}

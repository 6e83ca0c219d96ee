//! Extraction into the shadow state tree and embedding back out.

use trellis::foundation::{ErrorKind, Value};
use trellis::tree::{ElementHandle, EntityRegistry, NodeDescriptor, StateChildren};

fn leaf_with(handle: u64, state: Value) -> NodeDescriptor {
    NodeDescriptor::leaf(ElementHandle(handle)).with_state(state)
}

fn top_descriptor() -> NodeDescriptor {
    NodeDescriptor::group()
        .with_state(Value::map([("open", Value::from(true))]))
        .with_child("child", leaf_with(1, Value::map([("bar", Value::from(5))])))
        .unwrap()
        .with_child(
            "items",
            NodeDescriptor::list()
                .with_item(leaf_with(2, Value::from(10)))
                .unwrap()
                .with_item(leaf_with(3, Value::from(20)))
                .unwrap(),
        )
        .unwrap()
}

#[test]
fn state_lookup_by_path() {
    let mut registry = EntityRegistry::new();
    registry.add_entity(top_descriptor(), "top").unwrap();

    let record = registry.get_state("top.child").unwrap();
    assert_eq!(
        record.state().and_then(|s| s.get("bar")),
        Some(&Value::Int(5))
    );

    let top_record = registry.get_state("top").unwrap();
    let Some(StateChildren::Group(entries)) = top_record.children() else {
        panic!("expected group-shaped state children");
    };
    assert_eq!(entries.len(), 2);

    let items = registry.get_state("top.items").unwrap();
    let Some(StateChildren::List(records)) = items.children() else {
        panic!("expected list-shaped state children");
    };
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].state(), Some(&Value::Int(10)));
}

#[test]
fn state_round_trip_through_remove() {
    let payload = Value::map([
        ("count", Value::from(3)),
        ("items", Value::vec([Value::from("a"), Value::from("b")])),
    ]);
    let mut registry = EntityRegistry::new();
    registry
        .add_entity(leaf_with(1, payload.clone()), "root")
        .unwrap();

    let removed = registry.remove_entity("root").unwrap();
    assert_eq!(registry.tree().node(removed).unwrap().state(), Some(&payload));
    assert!(registry.get_state("root").is_err());
    assert!(registry.state_roots().is_empty());
}

#[test]
fn attached_nodes_hold_no_state_payload() {
    let mut registry = EntityRegistry::new();
    registry.add_entity(top_descriptor(), "top").unwrap();
    for path in ["top", "top.child", "top.items", "top.items[0]", "top.items[1]"] {
        let id = registry.get_entity(path).unwrap();
        assert!(
            registry.tree().node(id).unwrap().state().is_none(),
            "{path} kept its state payload while attached"
        );
    }
}

#[test]
fn local_state_is_outside_the_protocol() {
    let mut registry = EntityRegistry::new();
    let descriptor = NodeDescriptor::group()
        .with_state(Value::from(1))
        .with_local_state(Value::from("sticky"))
        .with_child("child", leaf_with(1, Value::from(2)))
        .unwrap();
    let top = registry.add_entity(descriptor, "top").unwrap();

    // Extraction took the payload and left local state on the node
    let node = registry.tree().node(top).unwrap();
    assert!(node.state().is_none());
    assert_eq!(node.local_state(), Some(&Value::from("sticky")));

    // Local state is writable in place while attached
    registry
        .tree_mut()
        .set_local_state(top, Value::from("updated"))
        .unwrap();
    assert_eq!(
        registry.tree().node(top).unwrap().local_state(),
        Some(&Value::from("updated"))
    );

    // Embedding on removal does not disturb it
    let removed = registry.remove_entity("top").unwrap();
    let node = registry.tree().node(removed).unwrap();
    assert_eq!(node.state(), Some(&Value::from(1)));
    assert_eq!(node.local_state(), Some(&Value::from("updated")));
}

#[test]
fn removal_of_nested_entity_updates_both_trees() {
    let mut registry = EntityRegistry::new();
    registry.add_entity(top_descriptor(), "top").unwrap();

    let removed = registry.remove_entity("top.items[0]").unwrap();
    assert_eq!(
        registry.tree().node(removed).unwrap().state(),
        Some(&Value::Int(10))
    );

    // Both the hierarchy and the shadow tree re-indexed
    let survivor = registry.get_entity("top.items[0]").unwrap();
    assert_eq!(
        registry.tree().node(survivor).unwrap().path().to_string(),
        "top.items[0]"
    );
    assert_eq!(
        registry.get_state("top.items[0]").unwrap().state(),
        Some(&Value::Int(20))
    );
    assert!(registry.get_state("top.items[1]").is_err());
}

#[test]
fn delete_discards_state_forever() {
    let mut registry = EntityRegistry::new();
    registry.add_entity(top_descriptor(), "top").unwrap();
    let child = registry.get_entity("top.child").unwrap();

    registry.delete_entity("top.child").unwrap();
    assert!(registry.tree().node(child).is_err());
    assert!(registry.get_state("top.child").is_err());

    // Reattaching something else under the same token starts fresh
    let fresh = registry
        .add_entity(leaf_with(9, Value::from(0)), "top.child")
        .unwrap();
    assert_eq!(
        registry.get_state("top.child").unwrap().state(),
        Some(&Value::Int(0))
    );
    assert_ne!(fresh, child);
}

#[test]
fn remove_then_reattach_preserves_deep_state() {
    let mut registry = EntityRegistry::new();
    registry.add_entity(top_descriptor(), "top").unwrap();

    let detached = registry.remove_entity("top").unwrap();
    // State came back to every node
    let child = registry.tree().get_entity(detached, "child").unwrap();
    assert_eq!(
        registry
            .tree()
            .node(child)
            .unwrap()
            .state()
            .and_then(|s| s.get("bar")),
        Some(&Value::Int(5))
    );

    // Attach under a different root key; extraction repeats
    registry.add_entity(detached, "relocated").unwrap();
    assert_eq!(
        registry
            .get_state("relocated.child")
            .unwrap()
            .state()
            .and_then(|s| s.get("bar")),
        Some(&Value::Int(5))
    );
    assert!(registry.tree().node(child).unwrap().state().is_none());
}

#[test]
fn remove_by_id_equals_remove_by_path() {
    let mut registry = EntityRegistry::new();
    registry.add_entity(top_descriptor(), "top").unwrap();
    let child = registry.get_entity("top.child").unwrap();

    let removed = registry.remove_entity(child).unwrap();
    assert_eq!(removed, child);
    assert!(registry.get_entity("top.child").is_err());

    let err = registry.remove_entity(child).unwrap_err();
    assert!(matches!(err.kind, ErrorKind::NotAttached(_)));
}

//! Attachment paths, token disambiguation, and attach atomicity.

use trellis::foundation::{ErrorKind, Value};
use trellis::path::Token;
use trellis::tree::{ElementHandle, EntityRegistry, NodeDescriptor};

fn leaf(handle: u64) -> NodeDescriptor {
    NodeDescriptor::leaf(ElementHandle(handle))
}

#[test]
fn attaches_roots_and_descendants_by_path() {
    let mut registry = EntityRegistry::new();
    let top = registry
        .add_entity(
            NodeDescriptor::group()
                .with_child("header", leaf(1))
                .unwrap(),
            "top",
        )
        .unwrap();
    assert_eq!(registry.root("top"), Some(top));
    assert_eq!(registry.roots().len(), 1);

    let footer = registry.add_entity(leaf(2), "top.footer").unwrap();
    assert_eq!(registry.get_entity("top.footer").unwrap(), footer);
    assert!(registry.tree().node(footer).unwrap().is_attached());
    assert_eq!(
        registry.tree().node(footer).unwrap().path().to_string(),
        "top.footer"
    );
}

#[test]
fn trailing_index_traverses_while_explicit_token_inserts() {
    let mut registry = EntityRegistry::new();
    registry
        .add_entity(
            NodeDescriptor::list()
                .with_item(NodeDescriptor::list())
                .unwrap()
                .with_item(NodeDescriptor::list())
                .unwrap(),
            "entity",
        )
        .unwrap();

    // "entity[0]" traverses to the first child list and grafts inside it
    let grafted = registry.add_entity(leaf(1), "entity[0]").unwrap();
    assert_eq!(
        registry.tree().node(grafted).unwrap().path().to_string(),
        "entity[0][0]"
    );

    // The same index as an explicit token inserts into "entity" itself
    let inserted = registry
        .add_entity_with(leaf(2), "entity", Token::Index(0))
        .unwrap();
    assert_eq!(
        registry.tree().node(inserted).unwrap().path().to_string(),
        "entity[0]"
    );
    // The grafted leaf shifted with its parent
    assert_eq!(
        registry.tree().node(grafted).unwrap().path().to_string(),
        "entity[1][0]"
    );
}

#[test]
fn rejects_duplicate_and_invalid_roots() {
    let mut registry = EntityRegistry::new();
    registry.add_entity(leaf(1), "top").unwrap();

    assert!(matches!(
        registry.add_entity(leaf(2), "top").unwrap_err().kind,
        ErrorKind::DuplicateKey { .. }
    ));
    assert!(matches!(
        registry.add_entity(leaf(2), "").unwrap_err().kind,
        ErrorKind::EmptyPath
    ));
    assert!(matches!(
        registry.add_entity(leaf(2), "[0]").unwrap_err().kind,
        ErrorKind::InvalidTokens { .. }
    ));
}

#[test]
fn attach_of_attached_entity_changes_nothing() {
    let mut registry = EntityRegistry::new();
    let top = registry
        .add_entity(leaf(1).with_state(Value::from(5)), "top")
        .unwrap();

    let roots_before: Vec<_> = registry.roots().to_vec();
    let state_before = registry.state_roots().to_vec();

    let err = registry.add_entity(top, "dup").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::AlreadyAttached { .. }));

    assert_eq!(registry.roots(), roots_before.as_slice());
    assert_eq!(registry.state_roots(), state_before.as_slice());
    assert!(registry.root("dup").is_none());
}

#[test]
fn attach_of_linked_child_is_rejected() {
    let mut registry = EntityRegistry::new();
    let group = registry
        .create(
            NodeDescriptor::group()
                .with_child("inner", leaf(1))
                .unwrap(),
        )
        .unwrap();
    let inner = registry.tree().get_entity(group, "inner").unwrap();

    let err = registry.add_entity(inner, "top").unwrap_err();
    assert!(matches!(err.kind, ErrorKind::AlreadyLinked { .. }));
    assert!(registry.roots().is_empty());
}

#[test]
fn detached_composition_then_one_shot_attach() {
    let mut registry = EntityRegistry::new();
    let panel = registry.create(NodeDescriptor::group()).unwrap();
    registry
        .add_child(panel, leaf(1).with_state(Value::from(1)), Some(Token::key("a").unwrap()))
        .unwrap();
    registry
        .add_child(panel, leaf(2).with_state(Value::from(2)), Some(Token::key("b").unwrap()))
        .unwrap();
    // Nothing extracted yet
    assert!(registry.state_roots().is_empty());

    registry.add_entity(panel, "panel").unwrap();
    assert_eq!(
        registry.get_state("panel.a").unwrap().state(),
        Some(&Value::Int(1))
    );
    assert_eq!(
        registry.get_state("panel.b").unwrap().state(),
        Some(&Value::Int(2))
    );
}

#[test]
fn attachment_flag_covers_whole_subtree() {
    let mut registry = EntityRegistry::new();
    let top = registry
        .add_entity(
            NodeDescriptor::group()
                .with_child(
                    "rows",
                    NodeDescriptor::list().with_item(leaf(1)).unwrap(),
                )
                .unwrap(),
            "top",
        )
        .unwrap();
    for id in [
        top,
        registry.get_entity("top.rows").unwrap(),
        registry.get_entity("top.rows[0]").unwrap(),
    ] {
        assert!(registry.tree().node(id).unwrap().is_attached());
    }
}

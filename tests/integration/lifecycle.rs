//! A full composition lifecycle: build, attach, mutate, dispatch,
//! detach, reattach.

use trellis::foundation::{NodeId, Result, Value};
use trellis::path::{EntityPath, PathPart, Token};
use trellis::tree::{ElementHandle, EntityRegistry, EntityTree, NodeDescriptor};

fn increment(tree: &mut EntityTree, id: NodeId, _: &[Value]) -> Result<Value> {
    let count = tree
        .node(id)?
        .state()
        .and_then(Value::as_int)
        .unwrap_or(0);
    tree.set_state(id, Value::Int(count + 1))?;
    Ok(Value::Int(count + 1))
}

fn row(index: u64) -> NodeDescriptor {
    NodeDescriptor::group()
        .with_child(
            "label",
            NodeDescriptor::leaf(ElementHandle(index * 10))
                .with_state(Value::string(format!("row {index}"))),
        )
        .expect("group accepts child")
        .with_child(
            "toggle",
            NodeDescriptor::leaf(ElementHandle(index * 10 + 1)).with_state(Value::from(false)),
        )
        .expect("group accepts child")
}

#[test]
fn full_lifecycle() {
    let mut registry = EntityRegistry::new();

    // Build and attach a panel with two rows
    let panel = NodeDescriptor::group()
        .with_state(Value::map([("visible", Value::from(true))]))
        .with_child(
            "rows",
            NodeDescriptor::list()
                .with_item(row(0))
                .unwrap()
                .with_item(row(1))
                .unwrap(),
        )
        .unwrap();
    registry.add_entity(panel, "panel").unwrap();

    // Paths built programmatically resolve the same entities as strings
    let joined = EntityPath::join([
        PathPart::from("panel.rows"),
        PathPart::from(1usize),
        PathPart::from("label"),
    ])
    .unwrap();
    assert_eq!(joined.to_string(), "panel.rows[1].label");
    assert_eq!(
        registry.get_entity(&joined).unwrap(),
        registry.get_entity("panel.rows[1].label").unwrap()
    );

    // Insert a row at the front; everything shifts
    registry
        .add_entity_with(row(2), "panel.rows", Token::Index(0))
        .unwrap();
    assert_eq!(
        registry
            .get_state("panel.rows[1].label")
            .unwrap()
            .state(),
        Some(&Value::string("row 0"))
    );

    // Relative traversal from deep inside the hierarchy
    let toggle = registry.get_entity("panel.rows[2].toggle").unwrap();
    let sibling_label = registry
        .tree()
        .get_entity(toggle, "^.label")
        .unwrap();
    assert_eq!(
        registry.tree().node(sibling_label).unwrap().path().to_string(),
        "panel.rows[2].label"
    );

    // Detach one row; its state comes along, siblings close the gap
    let detached = registry.remove_entity("panel.rows[0]").unwrap();
    let label = registry.tree().get_entity(detached, "label").unwrap();
    assert_eq!(
        registry.tree().node(label).unwrap().state(),
        Some(&Value::string("row 2"))
    );
    assert_eq!(
        registry.get_state("panel.rows[0].label").unwrap().state(),
        Some(&Value::string("row 0"))
    );

    // Reattach it at the end by grafting into the list
    registry.add_entity(detached, "panel.rows").unwrap_err();
    registry
        .add_entity_with(detached, "panel.rows", Token::Index(2))
        .unwrap();
    assert_eq!(
        registry.get_state("panel.rows[2].label").unwrap().state(),
        Some(&Value::string("row 2"))
    );
}

#[test]
fn callbacks_mutate_detached_state() {
    let mut registry = EntityRegistry::new();
    let counter = registry
        .create(
            NodeDescriptor::leaf(ElementHandle(1))
                .with_state(Value::Int(0))
                .with_util("increment", increment),
        )
        .unwrap();

    registry.tree_mut().call_util(counter, "increment", &[]).unwrap();
    let result = registry.tree_mut().call_util(counter, "increment", &[]).unwrap();
    assert_eq!(result, Value::Int(2));
    assert_eq!(
        registry.tree().node(counter).unwrap().state(),
        Some(&Value::Int(2))
    );
}

#[test]
fn deleted_subtree_ids_go_stale_everywhere() {
    let mut registry = EntityRegistry::new();
    registry
        .add_entity(
            NodeDescriptor::group()
                .with_child(
                    "gone",
                    NodeDescriptor::group()
                        .with_child("inner", NodeDescriptor::leaf(ElementHandle(1)))
                        .unwrap(),
                )
                .unwrap(),
            "top",
        )
        .unwrap();
    let gone = registry.get_entity("top.gone").unwrap();
    let inner = registry.get_entity("top.gone.inner").unwrap();

    registry.delete_entity(gone).unwrap();
    assert!(registry.tree().node(gone).is_err());
    assert!(registry.tree().node(inner).is_err());
    assert!(registry.remove_entity(gone).is_err());
    assert!(registry.get_entity("top.gone").is_err());
}

#[test]
fn attach_failures_surface_path_errors_verbatim() {
    let mut registry = EntityRegistry::new();
    let err = registry
        .add_entity(NodeDescriptor::group(), "not a path")
        .unwrap_err();
    assert_eq!(
        err.class(),
        trellis::foundation::ErrorClass::Syntax
    );
}

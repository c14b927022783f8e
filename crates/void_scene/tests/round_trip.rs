//! Snapshot round-trips across registries

use serde_json::json;
use void_reflect::{TypeBuilder, TypeRegistry};
use void_scene::{deserialize, serialize, ComponentEntry, SceneGraph, SerializedNode};

#[derive(Default)]
struct A {
    value: i32,
}
void_reflect::impl_component!(A, "A");

#[derive(Default)]
struct Body {
    mass: f32,
    drag: f64,
    sleeping: bool,
    label: String,
    // not a property, reset on reload
    cache: Vec<u8>,
}
void_reflect::impl_component!(Body, "Body");

fn register_a(registry: &mut TypeRegistry) {
    registry.register(
        TypeBuilder::<A>::new("A")
            .getter("value", |a: &A| a.value)
            .setter("setValue", |a: &mut A, v: i32| a.value = v),
    );
}

fn register_body(registry: &mut TypeRegistry) {
    registry.register(
        TypeBuilder::<Body>::new("Body")
            .getter("mass", |b: &Body| b.mass)
            .setter("setMass", |b: &mut Body, v: f32| b.mass = v)
            .getter("drag", |b: &Body| b.drag)
            .setter("setDrag", |b: &mut Body, v: f64| b.drag = v)
            .getter("sleeping", |b: &Body| b.sleeping)
            .setter("setSleeping", |b: &mut Body, v: bool| b.sleeping = v)
            .getter("label", |b: &Body| b.label.clone())
            .setter("setLabel", |b: &mut Body, v: String| b.label = v),
    );
}

fn full_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    register_a(&mut registry);
    register_body(&mut registry);
    registry
}

#[test]
fn test_scene_example() {
    let text = r#"{"components":[{"type":"A","value":5}],"entities":[]}"#;
    let registry = full_registry();

    let node = SerializedNode::from_json_str(text).unwrap();
    let graph = deserialize(&node, &registry);

    assert_eq!(graph.entity_count(), 1);
    assert_eq!(graph.component_count(), 1);
    assert_eq!(graph.component::<A>(graph.root()).unwrap().value, 5);

    let json: serde_json::Value = serde_json::from_str(text).unwrap();
    assert_eq!(serialize(&graph, &registry).to_json_value().unwrap(), json);
}

#[test]
fn test_round_trip_preserves_tree_and_values() {
    let registry = full_registry();
    let mut graph = SceneGraph::new();
    let root = graph.root();
    graph.add_component(root, Box::new(A { value: -3 })).unwrap();

    let left = graph.add_entity(root).unwrap();
    let right = graph.add_entity(root).unwrap();
    let leaf = graph.add_entity(left).unwrap();
    graph
        .add_component(
            left,
            Box::new(Body {
                mass: 1.5,
                drag: 0.25,
                sleeping: true,
                label: "crate \"one\"".to_string(),
                cache: vec![1, 2, 3],
            }),
        )
        .unwrap();
    graph.add_component(leaf, Box::new(A { value: 42 })).unwrap();
    graph.add_component(right, Box::new(A { value: 7 })).unwrap();
    graph.add_component(right, Box::new(Body::default())).unwrap();

    let snapshot = serialize(&graph, &registry);
    drop(graph);

    let rebuilt = deserialize(&snapshot, &registry);
    let root = rebuilt.root();
    let children = rebuilt.children(root).to_vec();

    assert_eq!(rebuilt.entity_count(), 4);
    assert_eq!(rebuilt.component_count(), 5);
    assert_eq!(rebuilt.component::<A>(root).unwrap().value, -3);

    let body = rebuilt.component::<Body>(children[0]).unwrap();
    assert_eq!(body.mass, 1.5);
    assert_eq!(body.drag, 0.25);
    assert!(body.sleeping);
    assert_eq!(body.label, "crate \"one\"");
    assert!(body.cache.is_empty());

    let leaf = rebuilt.children(children[0])[0];
    assert_eq!(rebuilt.component::<A>(leaf).unwrap().value, 42);
    assert_eq!(rebuilt.component::<A>(children[1]).unwrap().value, 7);
    assert!(rebuilt.component::<Body>(children[1]).is_some());

    assert_eq!(serialize(&rebuilt, &registry), snapshot);
}

#[test]
fn test_float_fields_save_as_written() {
    let text = r#"{"components":[{"type":"Body","mass":0.1,"drag":0.1,"sleeping":false,"label":""}],"entities":[]}"#;
    let registry = full_registry();

    let graph = deserialize(&SerializedNode::from_json_str(text).unwrap(), &registry);
    let saved = serialize(&graph, &registry).to_json_value().unwrap();

    assert_eq!(saved["components"][0]["mass"].to_string(), "0.1");
    assert_eq!(saved, serde_json::from_str::<serde_json::Value>(text).unwrap());
}

#[test]
fn test_reload_into_registry_without_type() {
    let mut old_registry = TypeRegistry::new();
    register_a(&mut old_registry);
    register_body(&mut old_registry);

    let mut graph = SceneGraph::new();
    let root = graph.root();
    graph.add_component(root, Box::new(Body::default())).unwrap();
    graph.add_component(root, Box::new(A { value: 11 })).unwrap();
    let child = graph.add_entity(root).unwrap();
    graph.add_component(child, Box::new(A { value: 12 })).unwrap();

    let snapshot = serialize(&graph, &old_registry);
    drop(graph);
    drop(old_registry);

    let mut new_registry = TypeRegistry::with_generation(2);
    register_a(&mut new_registry);

    let rebuilt = deserialize(&snapshot, &new_registry);
    let root = rebuilt.root();
    assert_eq!(rebuilt.components(root).count(), 1);
    assert_eq!(rebuilt.component::<A>(root).unwrap().value, 11);
    assert_eq!(rebuilt.component::<A>(rebuilt.children(root)[0]).unwrap().value, 12);
}

#[test]
fn test_schema_drift_is_tolerated() {
    let registry = full_registry();
    let node = SerializedNode::new().with_component(
        ComponentEntry::new("A")
            .with_field("value", 8)
            .with_field("retired", json!("gone")),
    );

    let graph = deserialize(&node, &registry);
    assert_eq!(graph.component::<A>(graph.root()).unwrap().value, 8);
    assert_eq!(
        serialize(&graph, &registry).components[0],
        ComponentEntry::new("A").with_field("value", 8)
    );
}

#[test]
fn test_scene_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("level.json");
    let registry = full_registry();

    let mut graph = SceneGraph::new();
    let root = graph.root();
    let child = graph.add_entity(root).unwrap();
    graph.add_component(child, Box::new(A { value: 99 })).unwrap();
    serialize(&graph, &registry).save(&path).unwrap();

    let loaded = deserialize(&SerializedNode::load(&path).unwrap(), &registry);
    let child = loaded.children(loaded.root())[0];
    assert_eq!(loaded.component::<A>(child).unwrap().value, 99);
}

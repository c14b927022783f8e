//! Tree serializer: live graph -> snapshot
//!
//! Read-only and depth-first; an entity's components are captured before its
//! children. Failures are logged per component or per property and never
//! abort the traversal.

use crate::graph::{EntityId, SceneGraph};
use crate::node::{ComponentEntry, SerializedNode};
use void_reflect::{Component, TypeRegistry};

/// Capture the whole graph
pub fn serialize(graph: &SceneGraph, registry: &TypeRegistry) -> SerializedNode {
    serialize_entity(graph, graph.root(), registry)
}

/// Capture the subtree rooted at `entity`
pub fn serialize_entity(graph: &SceneGraph, entity: EntityId, registry: &TypeRegistry) -> SerializedNode {
    let components = graph
        .components(entity)
        .map(|component| serialize_component(component, registry))
        .collect();

    let entities = graph
        .children(entity)
        .iter()
        .map(|child| serialize_entity(graph, *child, registry))
        .collect();

    SerializedNode { components, entities }
}

/// Capture one component's primitive properties
///
/// A component the registry cannot reflect keeps its entry with the type
/// name only, so a later module that knows the type can still recreate it.
pub fn serialize_component(component: &dyn Component, registry: &TypeRegistry) -> ComponentEntry {
    let type_name = component.type_name();
    let mut entry = ComponentEntry::new(type_name);

    let properties = match registry.properties(type_name) {
        Ok(properties) => properties,
        Err(e) => {
            log::error!("Can't serialize '{}': {}", type_name, e);
            return entry;
        }
    };

    for property in properties.iter() {
        match property.read_json(component) {
            Ok(value) => {
                entry.fields.insert(property.name().to_string(), value);
            }
            Err(e) => log::error!("Can't read {}:{}: {}", type_name, property.name(), e),
        }
    }

    entry
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use void_reflect::TypeBuilder;

    #[derive(Default)]
    struct Gauge {
        level: f64,
        broken: bool,
    }
    void_reflect::impl_component!(Gauge, "Gauge");

    #[derive(Default)]
    struct Unknown;
    void_reflect::impl_component!(Unknown, "Unknown");

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register(
            TypeBuilder::<Gauge>::new("Gauge")
                .getter("level", |g: &Gauge| if g.broken { f64::NAN } else { g.level })
                .setter("setLevel", |g: &mut Gauge, v: f64| g.level = v)
                .getter("broken", |g: &Gauge| g.broken)
                .setter("setBroken", |g: &mut Gauge, v: bool| g.broken = v),
        );
        registry
    }

    #[test]
    fn test_serialize_nested_graph() {
        let registry = registry();
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let child = graph.add_entity(root).unwrap();
        graph
            .add_component(child, Box::new(Gauge { level: 2.5, broken: false }))
            .unwrap();

        let node = serialize(&graph, &registry);
        assert!(node.components.is_empty());
        assert_eq!(node.entities.len(), 1);
        assert_eq!(
            node.entities[0].to_json_value().unwrap(),
            json!({
                "components": [{"type": "Gauge", "level": 2.5, "broken": false}],
                "entities": []
            })
        );
    }

    #[test]
    fn test_unreadable_property_is_skipped() {
        let registry = registry();
        let entry = serialize_component(&Gauge { level: 1.0, broken: true }, &registry);

        assert_eq!(entry.type_name, "Gauge");
        assert!(!entry.fields.contains_key("level"));
        assert_eq!(entry.fields["broken"], json!(true));
    }

    #[test]
    fn test_unknown_type_keeps_type_only() {
        let registry = registry();
        let mut graph = SceneGraph::new();
        let root = graph.root();
        graph.add_component(root, Box::new(Unknown)).unwrap();
        graph.add_component(root, Box::new(Gauge::default())).unwrap();

        let node = serialize(&graph, &registry);
        assert_eq!(node.components.len(), 2);
        assert_eq!(node.components[0], ComponentEntry::new("Unknown"));
        assert_eq!(node.components[1].fields.len(), 2);
    }
}

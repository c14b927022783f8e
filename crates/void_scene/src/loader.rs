//! Tree loader: snapshot -> live graph
//!
//! Types are resolved through the registry passed in, which after a reload is
//! the new module's. Unknown types are skipped, unknown fields ignored, and bad
//! field values logged; a partial graph is a valid result.
//!
//! The returned graph is detached: the caller broadcasts
//! [`ManagerAdded`](crate::ManagerAdded) into it once it is installed.

use crate::graph::{EntityId, SceneGraph};
use crate::node::{ComponentEntry, SerializedNode};
use void_reflect::{Component, TypeRegistry};

/// Build a new graph from a snapshot
pub fn deserialize(node: &SerializedNode, registry: &TypeRegistry) -> SceneGraph {
    let mut graph = SceneGraph::new();
    let root = graph.root();
    load_into(&mut graph, root, node, registry);
    graph
}

/// Populate `entity` with the snapshot's components and children
pub fn load_into(graph: &mut SceneGraph, entity: EntityId, node: &SerializedNode, registry: &TypeRegistry) {
    for entry in &node.components {
        let Some(component) = load_component(entry, registry) else {
            continue;
        };
        if let Err(e) = graph.add_component(entity, component) {
            log::error!("Can't attach '{}': {}", entry.type_name, e);
        }
    }

    for child_node in &node.entities {
        match graph.add_entity(entity) {
            Ok(child) => load_into(graph, child, child_node, registry),
            Err(e) => log::error!("Can't create child entity: {}", e),
        }
    }
}

/// Instantiate one component and apply its recorded fields
///
/// Returns `None` when the type is unknown to the registry.
pub fn load_component(entry: &ComponentEntry, registry: &TypeRegistry) -> Option<Box<dyn Component>> {
    let mut component = match registry.create_instance(&entry.type_name) {
        Ok(component) => component,
        Err(e) => {
            log::error!("Can't create component: {}", e);
            return None;
        }
    };

    let properties = match registry.properties(&entry.type_name) {
        Ok(properties) => properties,
        Err(e) => {
            log::error!("Can't reflect '{}': {}", entry.type_name, e);
            return Some(component);
        }
    };

    for (field, value) in &entry.fields {
        let Some(property) = properties.get(field) else {
            log::debug!("Ignoring field {}:{}, no such property", entry.type_name, field);
            continue;
        };
        if let Err(e) = property.write_json(&mut *component, value) {
            log::error!("Can't set {}:{}: {}", entry.type_name, field, e);
        }
    }

    Some(component)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use void_reflect::TypeBuilder;

    #[derive(Default)]
    struct Counter {
        value: i32,
        name: String,
    }
    void_reflect::impl_component!(Counter, "Counter");

    fn registry() -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        registry.register(
            TypeBuilder::<Counter>::new("Counter")
                .getter("value", |c: &Counter| c.value)
                .setter("setValue", |c: &mut Counter, v: i32| c.value = v)
                .getter("name", |c: &Counter| c.name.clone())
                .setter("setName", |c: &mut Counter, v: String| c.name = v),
        );
        registry
    }

    #[test]
    fn test_load_component_fields() {
        let entry = ComponentEntry::new("Counter")
            .with_field("value", 5)
            .with_field("name", "hello");
        let component = load_component(&entry, &registry()).unwrap();
        let counter = component.downcast_ref::<Counter>().unwrap();

        assert_eq!(counter.value, 5);
        assert_eq!(counter.name, "hello");
    }

    #[test]
    fn test_bad_field_does_not_block_siblings() {
        let entry = ComponentEntry::new("Counter")
            .with_field("value", "five")
            .with_field("name", "kept");
        let component = load_component(&entry, &registry()).unwrap();
        let counter = component.downcast_ref::<Counter>().unwrap();

        assert_eq!(counter.value, 0);
        assert_eq!(counter.name, "kept");
    }

    #[test]
    fn test_unknown_field_is_ignored() {
        let entry = ComponentEntry::new("Counter")
            .with_field("removedField", json!(1.5))
            .with_field("value", 9);
        let component = load_component(&entry, &registry()).unwrap();
        assert_eq!(component.downcast_ref::<Counter>().unwrap().value, 9);
    }

    #[test]
    fn test_unknown_type_is_omitted() {
        let node = SerializedNode::new()
            .with_component(ComponentEntry::new("Vanished").with_field("value", 1))
            .with_component(ComponentEntry::new("Counter").with_field("value", 2))
            .with_entity(SerializedNode::new().with_component(ComponentEntry::new("Counter")));

        let graph = deserialize(&node, &registry());
        let root = graph.root();

        assert_eq!(graph.components(root).count(), 1);
        assert_eq!(graph.component::<Counter>(root).unwrap().value, 2);
        assert_eq!(graph.children(root).len(), 1);
        assert!(graph.component::<Counter>(graph.children(root)[0]).is_some());
    }
}

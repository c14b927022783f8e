//! Arena-backed entity tree
//!
//! Entities are stored in one arena and addressed by [`EntityId`]. Parents own
//! ordered lists of child ids; there are no back-references, so the tree can
//! be dropped in one piece. Ids are only meaningful for the graph that issued
//! them and die with it.

use crate::error::{Result, SceneError};
use std::any::Any;
use std::fmt;
use void_reflect::Component;

/// Handle to an entity inside one [`SceneGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    /// Raw arena index
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Default)]
struct EntityData {
    /// At most one component per type name
    components: Vec<Box<dyn Component>>,
    /// Children in insertion order
    children: Vec<EntityId>,
}

/// A tree of entities owning components
pub struct SceneGraph {
    entities: Vec<EntityData>,
}

impl SceneGraph {
    /// Create a graph holding a single empty root entity
    pub fn new() -> Self {
        Self {
            entities: vec![EntityData::default()],
        }
    }

    /// The root entity
    pub fn root(&self) -> EntityId {
        EntityId(0)
    }

    /// Check if an id belongs to this graph
    pub fn contains(&self, entity: EntityId) -> bool {
        entity.index() < self.entities.len()
    }

    /// Create a child of `parent`
    pub fn add_entity(&mut self, parent: EntityId) -> Result<EntityId> {
        if !self.contains(parent) {
            return Err(SceneError::EntityNotFound(parent));
        }
        let id = EntityId(self.entities.len() as u32);
        self.entities.push(EntityData::default());
        self.entities[parent.index()].children.push(id);
        Ok(id)
    }

    /// Attach a component, replacing one of the same type
    ///
    /// Returns the replaced component, if any.
    pub fn add_component(
        &mut self,
        entity: EntityId,
        component: Box<dyn Component>,
    ) -> Result<Option<Box<dyn Component>>> {
        let data = self
            .entities
            .get_mut(entity.index())
            .ok_or(SceneError::EntityNotFound(entity))?;

        let type_name = component.type_name();
        if let Some(slot) = data.components.iter_mut().find(|c| c.type_name() == type_name) {
            log::warn!("Entity {:?} already has '{}', replacing", entity, type_name);
            return Ok(Some(std::mem::replace(slot, component)));
        }
        data.components.push(component);
        Ok(None)
    }

    /// Components attached to an entity, in attachment order
    pub fn components(
        &self,
        entity: EntityId,
    ) -> impl Iterator<Item = &(dyn Component + 'static)> + '_ {
        self.entities
            .get(entity.index())
            .into_iter()
            .flat_map(|data| data.components.iter().map(|c| &**c))
    }

    /// Find a component by type name
    pub fn find_component(
        &self,
        entity: EntityId,
        type_name: &str,
    ) -> Option<&(dyn Component + 'static)> {
        self.components(entity).find(|c| c.type_name() == type_name)
    }

    /// Find a component by type name, mutably
    pub fn find_component_mut(
        &mut self,
        entity: EntityId,
        type_name: &str,
    ) -> Option<&mut (dyn Component + 'static)> {
        self.entities
            .get_mut(entity.index())?
            .components
            .iter_mut()
            .find(|c| c.type_name() == type_name)
            .map(|c| &mut **c)
    }

    /// Find a component by concrete type
    pub fn component<T: Component>(&self, entity: EntityId) -> Option<&T> {
        self.components(entity).find_map(|c| c.downcast_ref::<T>())
    }

    /// Find a component by concrete type, mutably
    pub fn component_mut<T: Component>(&mut self, entity: EntityId) -> Option<&mut T> {
        self.entities
            .get_mut(entity.index())?
            .components
            .iter_mut()
            .find_map(|c| c.downcast_mut::<T>())
    }

    /// Direct children of an entity
    pub fn children(&self, entity: EntityId) -> &[EntityId] {
        self.entities
            .get(entity.index())
            .map(|data| data.children.as_slice())
            .unwrap_or(&[])
    }

    /// Direct children matching a predicate
    pub fn find_entities<F>(&self, entity: EntityId, mut predicate: F) -> Vec<EntityId>
    where
        F: FnMut(&SceneGraph, EntityId) -> bool,
    {
        self.children(entity)
            .iter()
            .copied()
            .filter(|child| predicate(self, *child))
            .collect()
    }

    /// Deliver an event to every component in the subtree rooted at `entity`
    ///
    /// Pre-order: an entity's components see the event before its children.
    pub fn broadcast(&mut self, entity: EntityId, event: &dyn Any) {
        let mut stack = vec![entity];
        while let Some(current) = stack.pop() {
            let Some(data) = self.entities.get_mut(current.index()) else {
                continue;
            };
            for component in data.components.iter_mut() {
                component.on_event(event);
            }
            stack.extend(data.children.iter().rev().copied());
        }
    }

    /// Total number of entities, root included
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Total number of attached components
    pub fn component_count(&self) -> usize {
        self.entities.iter().map(|e| e.components.len()).sum()
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneGraph")
            .field("entities", &self.entity_count())
            .field("components", &self.component_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Probe {
        seen: Vec<u32>,
    }

    impl Component for Probe {
        fn type_name(&self) -> &str {
            "Probe"
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }

        fn on_event(&mut self, event: &dyn Any) {
            if let Some(value) = event.downcast_ref::<u32>() {
                self.seen.push(*value);
            }
        }
    }

    #[derive(Default)]
    struct Tag;
    void_reflect::impl_component!(Tag, "Tag");

    #[test]
    fn test_new_graph_has_root() {
        let graph = SceneGraph::new();
        assert_eq!(graph.entity_count(), 1);
        assert_eq!(graph.component_count(), 0);
        assert!(graph.children(graph.root()).is_empty());
    }

    #[test]
    fn test_tree_structure() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.add_entity(root).unwrap();
        let b = graph.add_entity(root).unwrap();
        let c = graph.add_entity(a).unwrap();

        assert_eq!(graph.children(root), &[a, b]);
        assert_eq!(graph.children(a), &[c]);
        assert!(graph.add_entity(EntityId(99)).is_err());
    }

    #[test]
    fn test_one_component_per_type() {
        let mut graph = SceneGraph::new();
        let root = graph.root();

        assert!(graph.add_component(root, Box::new(Tag)).unwrap().is_none());
        assert!(graph.add_component(root, Box::new(Probe::default())).unwrap().is_none());
        assert!(graph.add_component(root, Box::new(Tag)).unwrap().is_some());
        assert_eq!(graph.component_count(), 2);
        assert!(graph.find_component(root, "Tag").is_some());
        assert!(graph.component::<Probe>(root).is_some());
    }

    #[test]
    fn test_find_entities() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let tagged = graph.add_entity(root).unwrap();
        graph.add_entity(root).unwrap();
        graph.add_component(tagged, Box::new(Tag)).unwrap();

        let found = graph.find_entities(root, |g, e| g.find_component(e, "Tag").is_some());
        assert_eq!(found, vec![tagged]);
    }

    #[test]
    fn test_broadcast_reaches_subtree_only() {
        let mut graph = SceneGraph::new();
        let root = graph.root();
        let a = graph.add_entity(root).unwrap();
        let a_child = graph.add_entity(a).unwrap();
        let b = graph.add_entity(root).unwrap();
        for entity in [a, a_child, b] {
            graph.add_component(entity, Box::new(Probe::default())).unwrap();
        }

        graph.broadcast(a, &7u32);

        assert_eq!(graph.component::<Probe>(a).unwrap().seen, vec![7]);
        assert_eq!(graph.component::<Probe>(a_child).unwrap().seen, vec![7]);
        assert!(graph.component::<Probe>(b).unwrap().seen.is_empty());
    }
}

//! Type-erased snapshot format
//!
//! This is also the on-disk scene layout:
//!
//! ```json
//! {
//!   "components": [ { "type": "InternalComponent", "value": 5 } ],
//!   "entities": [ { "components": [], "entities": [] } ]
//! }
//! ```
//!
//! `type` is the only mandatory component field; missing `components` or
//! `entities` arrays read as empty.

use crate::error::{Result, SceneError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// One component: its type name plus primitive field values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentEntry {
    /// Stable component type name
    #[serde(rename = "type")]
    pub type_name: String,
    /// Field name to JSON literal
    #[serde(flatten)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl ComponentEntry {
    /// Create an entry with no fields
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Add a field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }
}

/// A captured subtree
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SerializedNode {
    /// Components of this entity, in traversal order
    #[serde(default)]
    pub components: Vec<ComponentEntry>,
    /// Child entities, in traversal order
    #[serde(default)]
    pub entities: Vec<SerializedNode>,
}

impl SerializedNode {
    /// Create an empty node
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component entry
    pub fn with_component(mut self, component: ComponentEntry) -> Self {
        self.components.push(component);
        self
    }

    /// Add a child node
    pub fn with_entity(mut self, entity: SerializedNode) -> Self {
        self.entities.push(entity);
        self
    }

    /// Parse from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse from a JSON value
    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Convert to a JSON value
    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Render as pretty-printed JSON
    pub fn to_json_string_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Read a scene file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SceneError::io(path, e))?;
        Self::from_json_str(&text)
    }

    /// Write a scene file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let text = self.to_json_string_pretty()?;
        std::fs::write(path, text).map_err(|e| SceneError::io(path, e))
    }

    /// Number of nodes in this subtree, self included
    pub fn node_count(&self) -> usize {
        1 + self.entities.iter().map(SerializedNode::node_count).sum::<usize>()
    }
}

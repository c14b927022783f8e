//! Property discovery by naming convention
//!
//! A property `x` exists when a type exposes a one-parameter mutator `setX`
//! returning nothing, and exactly one zero-parameter accessor `x` whose return
//! type equals the mutator's parameter type. Only primitive kinds qualify.

use crate::component::Component;
use crate::error::{ReflectError, Result};
use crate::method::{MethodInfo, TypeTag};
use crate::value::{Value, ValueKind};
use std::collections::HashMap;

const SETTER_PREFIX: &str = "set";

/// A primitive-typed accessor/mutator pair
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    kind: ValueKind,
    getter: MethodInfo,
    setter: MethodInfo,
}

impl Property {
    /// Property name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Static value kind
    pub fn kind(&self) -> ValueKind {
        self.kind
    }

    /// Invoke the accessor
    pub fn read(&self, target: &dyn Component) -> Result<Value> {
        let value = self
            .getter
            .invoke(target.as_any(), &[])?
            .ok_or_else(|| ReflectError::invocation(&self.name, "accessor returned nothing"))?;

        if value.kind() != self.kind {
            return Err(ReflectError::invocation(
                &self.name,
                format!("accessor returned {}, declared {}", value.kind(), self.kind),
            ));
        }
        Ok(value)
    }

    /// Coerce `value` to the mutator's parameter kind and invoke it
    pub fn write(&self, target: &mut dyn Component, value: Value) -> Result<()> {
        let value = value
            .coerce(self.kind)
            .map_err(|e| ReflectError::invocation(&self.name, e.to_string()))?;
        self.setter.invoke_mut(target.as_any_mut(), &[value])?;
        Ok(())
    }

    /// Read as a JSON literal
    pub fn read_json(&self, target: &dyn Component) -> Result<serde_json::Value> {
        self.read(target)?.to_json()
    }

    /// Parse a JSON literal as the property kind and write it
    pub fn write_json(&self, target: &mut dyn Component, json: &serde_json::Value) -> Result<()> {
        let value = Value::from_json(self.kind, json)?;
        self.write(target, value)
    }
}

/// Name to property mapping for one type
#[derive(Debug, Clone, Default)]
pub struct PropertyIndex {
    properties: HashMap<String, Property>,
}

impl PropertyIndex {
    /// Derive the properties exposed by a method catalog
    pub fn scan(methods: &[MethodInfo]) -> Self {
        let mut properties = HashMap::new();

        for setter in methods {
            if setter.returns().is_some() || setter.params().len() != 1 {
                continue;
            }
            let Some(name) = property_name(setter.name()) else {
                continue;
            };
            let param = &setter.params()[0];
            let TypeTag::Value(kind) = param else {
                continue;
            };

            let getters: Vec<&MethodInfo> = methods
                .iter()
                .filter(|m| m.name() == name && m.params().is_empty() && m.returns() == Some(param))
                .collect();

            match getters.as_slice() {
                [getter] => {
                    properties.insert(
                        name.clone(),
                        Property {
                            name,
                            kind: *kind,
                            getter: (*getter).clone(),
                            setter: setter.clone(),
                        },
                    );
                }
                [] => {}
                _ => log::debug!("Skipping property '{}': ambiguous accessor", name),
            }
        }

        Self { properties }
    }

    /// Look up a property by name
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Iterate over all properties
    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    /// Property names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.properties.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// `setFooBar` -> `fooBar`
fn property_name(setter: &str) -> Option<String> {
    let rest = setter.strip_prefix(SETTER_PREFIX)?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    Some(first.to_lowercase().chain(chars).collect())
}

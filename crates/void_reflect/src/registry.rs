//! Reload-scoped type registry
//!
//! Maps stable type names to factories and method catalogs. A registry lives
//! exactly as long as one loaded module generation; every reload builds a new
//! one and drops the old, so nothing obtained from it may outlive a reload.

use crate::component::Component;
use crate::error::{ReflectError, Result};
use crate::method::{Invoker, MethodInfo, TypeTag};
use crate::property::PropertyIndex;
use crate::value::{Primitive, Value};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Zero-argument component constructor
pub type Factory = Arc<dyn Fn() -> Box<dyn Component> + Send + Sync>;

/// A registered component type
#[derive(Clone)]
pub struct TypeInfo {
    /// Stable type name
    pub name: String,
    factory: Factory,
    methods: Vec<MethodInfo>,
}

impl TypeInfo {
    /// Reflective method catalog
    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    /// Create a fresh instance
    pub fn create(&self) -> Box<dyn Component> {
        (self.factory)()
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("name", &self.name)
            .field("methods", &self.methods.len())
            .finish()
    }
}

/// Catalog of component types for one module generation
pub struct TypeRegistry {
    /// Types by name
    types: HashMap<String, TypeInfo>,
    /// Cached property indices, valid for this generation only
    property_cache: RwLock<HashMap<String, Arc<PropertyIndex>>>,
    /// Module generation this registry belongs to
    generation: u64,
}

impl TypeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::with_generation(0)
    }

    /// Create an empty registry for a module generation
    pub fn with_generation(generation: u64) -> Self {
        Self {
            types: HashMap::new(),
            property_cache: RwLock::new(HashMap::new()),
            generation,
        }
    }

    /// Module generation
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Register a component type
    pub fn register<T: Component>(&mut self, builder: TypeBuilder<T>) -> &mut Self {
        let info = builder.build();
        if self.types.contains_key(&info.name) {
            log::warn!("Type '{}' registered twice, replacing", info.name);
        }
        self.property_cache.write().remove(&info.name);
        self.types.insert(info.name.clone(), info);
        self
    }

    /// Check if a type is registered
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Get type info by name
    pub fn get(&self, name: &str) -> Result<&TypeInfo> {
        self.types
            .get(name)
            .ok_or_else(|| ReflectError::TypeNotFound(name.to_string()))
    }

    /// Create an instance by name
    pub fn create_instance(&self, name: &str) -> Result<Box<dyn Component>> {
        Ok(self.get(name)?.create())
    }

    /// Property index for a type, computed once per generation
    pub fn properties(&self, name: &str) -> Result<Arc<PropertyIndex>> {
        if let Some(index) = self.property_cache.read().get(name) {
            return Ok(index.clone());
        }

        let index = Arc::new(PropertyIndex::scan(self.get(name)?.methods()));
        self.property_cache
            .write()
            .insert(name.to_string(), index.clone());
        Ok(index)
    }

    /// Get all registered type names, sorted
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.types.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Get the number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeRegistry")
            .field("generation", &self.generation)
            .field("types", &self.types.len())
            .finish()
    }
}

/// Fluent description of a component type's factory and methods
pub struct TypeBuilder<T> {
    name: String,
    factory: Factory,
    methods: Vec<MethodInfo>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component + Default> TypeBuilder<T> {
    /// Describe a type constructed with `Default`
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_factory(name, T::default)
    }
}

impl<T: Component> TypeBuilder<T> {
    /// Describe a type with a custom constructor
    pub fn with_factory<F>(name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            factory: Arc::new(move || Box::new(factory()) as Box<dyn Component>),
            methods: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Add a zero-parameter accessor
    pub fn getter<R, F>(self, name: &str, f: F) -> Self
    where
        R: Primitive,
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        let method_name = name.to_string();
        let invoker = Invoker::Ref(Arc::new(move |target: &dyn Any, _args: &[Value]| {
            let this = receiver::<T>(target, &method_name)?;
            Ok(Some(f(this).into_value()))
        }));
        self.method_info(MethodInfo::new(name, vec![], Some(TypeTag::Value(R::KIND)), invoker))
    }

    /// Add a one-parameter mutator returning nothing
    pub fn setter<A, F>(self, name: &str, f: F) -> Self
    where
        A: Primitive,
        F: Fn(&mut T, A) + Send + Sync + 'static,
    {
        let method_name = name.to_string();
        let invoker = Invoker::Mut(Arc::new(move |target: &mut dyn Any, args: &[Value]| {
            let arg = A::from_value(args[0].clone())
                .map_err(|e| ReflectError::invocation(&method_name, e.to_string()))?;
            let this = target
                .downcast_mut::<T>()
                .ok_or_else(|| stale_receiver::<T>(&method_name))?;
            f(this, arg);
            Ok(None)
        }));
        self.method_info(MethodInfo::new(name, vec![TypeTag::Value(A::KIND)], None, invoker))
    }

    /// Add a one-parameter method with a result
    pub fn method<A, R, F>(self, name: &str, f: F) -> Self
    where
        A: Primitive,
        R: Primitive,
        F: Fn(&T, A) -> R + Send + Sync + 'static,
    {
        let method_name = name.to_string();
        let invoker = Invoker::Ref(Arc::new(move |target: &dyn Any, args: &[Value]| {
            let arg = A::from_value(args[0].clone())
                .map_err(|e| ReflectError::invocation(&method_name, e.to_string()))?;
            let this = receiver::<T>(target, &method_name)?;
            Ok(Some(f(this, arg).into_value()))
        }));
        self.method_info(MethodInfo::new(
            name,
            vec![TypeTag::Value(A::KIND)],
            Some(TypeTag::Value(R::KIND)),
            invoker,
        ))
    }

    /// Add a raw catalog entry, e.g. for non-primitive signatures
    pub fn method_info(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    fn build(self) -> TypeInfo {
        TypeInfo {
            name: self.name,
            factory: self.factory,
            methods: self.methods,
        }
    }
}

fn receiver<'a, T: 'static>(target: &'a dyn Any, method: &str) -> Result<&'a T> {
    target
        .downcast_ref::<T>()
        .ok_or_else(|| stale_receiver::<T>(method))
}

fn stale_receiver<T>(method: &str) -> ReflectError {
    ReflectError::invocation(
        method,
        format!("receiver is not a {}", std::any::type_name::<T>()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::ValueKind;

    #[derive(Default)]
    struct Counter {
        value: i32,
        label: String,
    }

    crate::impl_component!(Counter, "Counter");

    fn counter_type() -> TypeBuilder<Counter> {
        TypeBuilder::<Counter>::new("Counter")
            .getter("value", |c: &Counter| c.value)
            .setter("setValue", |c: &mut Counter, v: i32| c.value = v)
            .getter("label", |c: &Counter| c.label.clone())
            .setter("setLabel", |c: &mut Counter, v: String| c.label = v)
            .method("multiplyValue", |c: &Counter, by: i32| c.value * by)
    }

    #[test]
    fn test_registry_creation() {
        let registry = TypeRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.generation(), 0);
    }

    #[test]
    fn test_create_instance() {
        let mut registry = TypeRegistry::new();
        registry.register(counter_type());

        let component = registry.create_instance("Counter").unwrap();
        assert_eq!(component.type_name(), "Counter");
        assert!(matches!(
            registry.create_instance("Missing"),
            Err(ReflectError::TypeNotFound(_))
        ));
    }

    #[test]
    fn test_properties_follow_convention() {
        let mut registry = TypeRegistry::new();
        registry.register(counter_type());

        let index = registry.properties("Counter").unwrap();
        assert_eq!(index.names(), vec!["label", "value"]);
        assert_eq!(index.get("label").unwrap().kind(), ValueKind::String);
        assert!(index.get("multiplyValue").is_none());
    }

    #[test]
    fn test_properties_are_cached() {
        let mut registry = TypeRegistry::new();
        registry.register(counter_type());

        let first = registry.properties("Counter").unwrap();
        let second = registry.properties("Counter").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_read_write_through_properties() {
        let mut registry = TypeRegistry::new();
        registry.register(counter_type());
        let index = registry.properties("Counter").unwrap();

        let mut component = registry.create_instance("Counter").unwrap();
        let value = index.get("value").unwrap();
        value.write(component.as_mut(), Value::Int(5)).unwrap();
        assert_eq!(value.read(component.as_ref()).unwrap(), Value::Int(5));
        assert_eq!(component.downcast_ref::<Counter>().unwrap().value, 5);

        let label = index.get("label").unwrap();
        assert!(label.write(component.as_mut(), Value::Int(1)).is_err());
    }

    #[test]
    fn test_stale_receiver_is_an_error() {
        #[derive(Default)]
        struct Other;
        crate::impl_component!(Other, "Counter");

        let mut registry = TypeRegistry::new();
        registry.register(counter_type());
        let index = registry.properties("Counter").unwrap();

        let other = Other;
        assert!(matches!(
            index.get("value").unwrap().read(&other),
            Err(ReflectError::PropertyInvocation { .. })
        ));
    }
}

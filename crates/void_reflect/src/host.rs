//! Module hosts
//!
//! A module host owns the currently loaded project module and the
//! [`TypeRegistry`] it filled. Loading replaces both; the previous registry is
//! dropped before the new module is linked.

use crate::error::{ReflectError, Result};
use crate::registry::TypeRegistry;
use std::path::{Path, PathBuf};

/// Loads and replaces project modules
pub trait ModuleHost {
    /// Load the module at `path`, replacing every previously registered type
    ///
    /// On failure the host is left unloaded with an empty registry.
    fn load(&mut self, path: &Path) -> Result<()>;

    /// Registry of the currently loaded module
    fn registry(&self) -> &TypeRegistry;

    /// Whether a module is currently loaded
    fn is_loaded(&self) -> bool;
}

/// Registration entry point of an in-process module
pub type RegisterFn = Box<dyn Fn(&mut TypeRegistry) -> Result<()> + Send>;

/// Host whose "module" is a registration function linked into the process
///
/// Swapping the registration function and loading again behaves like a
/// rebuilt module: the registry is discarded and rebuilt from scratch.
pub struct InProcessHost {
    register: RegisterFn,
    registry: TypeRegistry,
    loaded_path: Option<PathBuf>,
    generation: u64,
}

impl InProcessHost {
    /// Create a host around a registration function
    pub fn new<F>(register: F) -> Self
    where
        F: Fn(&mut TypeRegistry) -> Result<()> + Send + 'static,
    {
        Self {
            register: Box::new(register),
            registry: TypeRegistry::new(),
            loaded_path: None,
            generation: 0,
        }
    }

    /// Replace the registration function; takes effect on the next load
    pub fn set_registration<F>(&mut self, register: F)
    where
        F: Fn(&mut TypeRegistry) -> Result<()> + Send + 'static,
    {
        self.register = Box::new(register);
    }

    /// Path passed to the last successful load
    pub fn loaded_path(&self) -> Option<&Path> {
        self.loaded_path.as_deref()
    }

    /// Number of load attempts so far
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl ModuleHost for InProcessHost {
    fn load(&mut self, path: &Path) -> Result<()> {
        self.generation += 1;
        self.registry = TypeRegistry::with_generation(self.generation);
        self.loaded_path = None;

        let mut registry = TypeRegistry::with_generation(self.generation);
        (self.register)(&mut registry).map_err(|e| match e {
            e @ ReflectError::ModuleLoad { .. } => e,
            other => ReflectError::module_load(path, other.to_string()),
        })?;

        log::info!(
            "Loaded in-process module '{}' generation {} with {} types",
            path.display(),
            self.generation,
            registry.len()
        );
        self.registry = registry;
        self.loaded_path = Some(path.to_path_buf());
        Ok(())
    }

    fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn is_loaded(&self) -> bool {
        self.loaded_path.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeBuilder;

    #[derive(Default)]
    struct Marker;
    crate::impl_component!(Marker, "Marker");

    #[test]
    fn test_load_replaces_registry() {
        let mut host = InProcessHost::new(|registry| {
            registry.register(TypeBuilder::<Marker>::new("Marker"));
            Ok(())
        });
        assert!(!host.is_loaded());

        host.load(Path::new("module")).unwrap();
        assert!(host.registry().contains("Marker"));
        assert_eq!(host.registry().generation(), 1);

        host.set_registration(|_| Ok(()));
        host.load(Path::new("module")).unwrap();
        assert!(!host.registry().contains("Marker"));
        assert_eq!(host.registry().generation(), 2);
    }

    #[test]
    fn test_failed_load_leaves_host_unloaded() {
        let mut host = InProcessHost::new(|registry| {
            registry.register(TypeBuilder::<Marker>::new("Marker"));
            Ok(())
        });
        host.load(Path::new("module")).unwrap();

        host.set_registration(|_| Err(ReflectError::TypeNotFound("Broken".into())));
        let err = host.load(Path::new("module")).unwrap_err();
        assert!(matches!(err, ReflectError::ModuleLoad { .. }));
        assert!(!host.is_loaded());
        assert!(host.registry().is_empty());
    }
}

//! Native module host backed by dynamic libraries
//!
//! A project module is a `cdylib` built with the same toolchain and the same
//! `void_reflect` version as the host. It exports two symbols, usually through
//! [`export_module!`](crate::export_module):
//!
//! - `void_module_api_version() -> u32`
//! - `void_module_register(registry: *mut TypeRegistry)`
//!
//! Factories and invokers in the registry point into the library's code, so
//! the registry (and every instance it created) must be dropped before the
//! library is closed. The host enforces that order on every reload; callers
//! must drop their instances before calling [`ModuleHost::load`].

use crate::error::{ReflectError, Result};
use crate::host::ModuleHost;
use crate::registry::TypeRegistry;
use libloading::{Library, Symbol};
use std::path::{Path, PathBuf};

/// ABI revision for module compatibility checking
pub const VOID_MODULE_API_VERSION: u32 = 1;

/// `void_module_api_version`
pub type ApiVersionFn = extern "C" fn() -> u32;

/// `void_module_register`
pub type RegisterTypesFn = unsafe extern "C" fn(registry: *mut TypeRegistry);

const API_VERSION_SYMBOL: &[u8] = b"void_module_api_version\0";
const REGISTER_SYMBOL: &[u8] = b"void_module_register\0";

/// Module host loading `cdylib` project modules
pub struct NativeModuleHost {
    /// Registry filled by the current library; declared first so it drops first
    registry: TypeRegistry,
    /// The current library handle
    library: Option<Library>,
    /// Shadow copy the library was opened from
    shadow_path: Option<PathBuf>,
    /// Directory shadow copies are written to
    shadow_dir: PathBuf,
    /// Load attempts so far
    generation: u64,
}

impl NativeModuleHost {
    /// Create a host writing shadow copies into the system temp directory
    pub fn new() -> Self {
        Self::with_shadow_dir(std::env::temp_dir().join("void_modules"))
    }

    /// Create a host writing shadow copies into `shadow_dir`
    pub fn with_shadow_dir(shadow_dir: impl Into<PathBuf>) -> Self {
        Self {
            registry: TypeRegistry::new(),
            library: None,
            shadow_path: None,
            shadow_dir: shadow_dir.into(),
            generation: 0,
        }
    }

    /// Number of load attempts so far
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Close the current library, dropping its registry first
    pub fn unload(&mut self) {
        self.registry = TypeRegistry::with_generation(self.generation);
        if let Some(library) = self.library.take() {
            drop(library);
            log::debug!("Closed module generation {}", self.generation);
        }
        if let Some(shadow) = self.shadow_path.take() {
            if let Err(e) = std::fs::remove_file(&shadow) {
                log::warn!("Failed to remove shadow module {}: {}", shadow.display(), e);
            }
        }
    }

    /// Copy the artifact to a generation-unique path
    ///
    /// The OS loader caches libraries by path, so reopening the original file
    /// after a rebuild can hand back the stale image.
    fn shadow_copy(&self, path: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.shadow_dir)?;

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("module");
        let mut file_name = format!("{}-{}", stem, self.generation);
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            file_name.push('.');
            file_name.push_str(ext);
        }

        let shadow = self.shadow_dir.join(file_name);
        std::fs::copy(path, &shadow)
            .map_err(|e| ReflectError::module_load(path, format!("shadow copy failed: {}", e)))?;
        Ok(shadow)
    }

    fn open(&self, path: &Path, shadow: &Path) -> Result<(Library, TypeRegistry)> {
        // Safety: loading runs the library's initialisers; project modules are
        // trusted code built for this host.
        let library = unsafe {
            Library::new(shadow).map_err(|e| ReflectError::module_load(path, e.to_string()))?
        };

        let api_version: Symbol<ApiVersionFn> = unsafe {
            library.get(API_VERSION_SYMBOL).map_err(|_| {
                ReflectError::symbol_not_found(path.display().to_string(), "void_module_api_version")
            })?
        };
        let module_version = api_version();
        if module_version != VOID_MODULE_API_VERSION {
            return Err(ReflectError::VersionMismatch {
                module_version,
                expected_version: VOID_MODULE_API_VERSION,
            });
        }

        let register: Symbol<RegisterTypesFn> = unsafe {
            library.get(REGISTER_SYMBOL).map_err(|_| {
                ReflectError::symbol_not_found(path.display().to_string(), "void_module_register")
            })?
        };

        let mut registry = TypeRegistry::with_generation(self.generation);
        // Safety: the pointer is valid for the duration of the call and the
        // module was built against this registry layout (checked above).
        unsafe { register(&mut registry) };
        drop(register);
        drop(api_version);

        Ok((library, registry))
    }
}

impl ModuleHost for NativeModuleHost {
    fn load(&mut self, path: &Path) -> Result<()> {
        self.unload();
        self.generation += 1;

        if !path.exists() {
            return Err(ReflectError::module_load(path, "module artifact not found"));
        }

        let shadow = self.shadow_copy(path)?;
        match self.open(path, &shadow) {
            Ok((library, registry)) => {
                log::info!(
                    "Loaded module '{}' generation {} with {} types",
                    path.display(),
                    self.generation,
                    registry.len()
                );
                self.registry = registry;
                self.library = Some(library);
                self.shadow_path = Some(shadow);
                Ok(())
            }
            Err(e) => {
                let _ = std::fs::remove_file(&shadow);
                Err(e)
            }
        }
    }

    fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    fn is_loaded(&self) -> bool {
        self.library.is_some()
    }
}

impl Default for NativeModuleHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for NativeModuleHost {
    fn drop(&mut self) {
        self.unload();
    }
}

/// Export a registration function as a loadable project module
///
/// ```ignore
/// fn register(registry: &mut void_reflect::TypeRegistry) {
///     registry.register(TypeBuilder::<Health>::new("Health"));
/// }
///
/// void_reflect::export_module!(register);
/// ```
#[macro_export]
macro_rules! export_module {
    ($register:path) => {
        #[no_mangle]
        pub extern "C" fn void_module_api_version() -> u32 {
            $crate::VOID_MODULE_API_VERSION
        }

        /// # Safety
        /// `registry` must be null or point to a live registry.
        #[no_mangle]
        pub unsafe extern "C" fn void_module_register(registry: *mut $crate::TypeRegistry) {
            if let Some(registry) = registry.as_mut() {
                $register(registry);
            }
        }
    };
}

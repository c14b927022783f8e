//! # void_reflect - Runtime Reflection for Hot-Reloadable Projects
//!
//! Project components live in a dynamically loaded module that can vanish and
//! reappear at any time. Nothing about their types is known at compile time;
//! the host only sees what the module registers at load time.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐
//! │ Project module  │────▶│   ModuleHost    │  NativeModuleHost (libloading)
//! │ (cdylib)        │     │                 │  InProcessHost (tests, static)
//! └─────────────────┘     └────────┬────────┘
//!                                  │ fills
//!                                  ▼
//!                         ┌─────────────────┐
//!                         │  TypeRegistry   │  name -> factory + methods
//!                         └────────┬────────┘
//!                                  │ scans (once per generation)
//!                                  ▼
//!                         ┌─────────────────┐
//!                         │  PropertyIndex  │  setX / x pairs -> Property
//!                         └─────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use void_reflect::{TypeBuilder, TypeRegistry, Value};
//!
//! #[derive(Default)]
//! struct Health { value: i32 }
//! void_reflect::impl_component!(Health, "Health");
//!
//! let mut registry = TypeRegistry::new();
//! registry.register(
//!     TypeBuilder::<Health>::new("Health")
//!         .getter("value", |h: &Health| h.value)
//!         .setter("setValue", |h: &mut Health, v: i32| h.value = v),
//! );
//!
//! let mut health = registry.create_instance("Health")?;
//! let index = registry.properties("Health")?;
//! index.get("value").unwrap().write(health.as_mut(), Value::Int(5))?;
//! ```

mod component;
mod error;
mod host;
mod method;
mod property;
mod registry;
mod value;

#[cfg(feature = "native")]
mod native;

pub use component::Component;
pub use error::{ReflectError, Result};
pub use host::{InProcessHost, ModuleHost, RegisterFn};
pub use method::{Invoker, MethodInfo, MutInvoker, RefInvoker, TypeTag};
pub use property::{Property, PropertyIndex};
pub use registry::{Factory, TypeBuilder, TypeInfo, TypeRegistry};
pub use value::{Primitive, Value, ValueKind};

#[cfg(feature = "native")]
pub use native::{ApiVersionFn, NativeModuleHost, RegisterTypesFn, VOID_MODULE_API_VERSION};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::component::Component;
    pub use crate::error::{ReflectError, Result};
    pub use crate::host::{InProcessHost, ModuleHost};
    pub use crate::property::{Property, PropertyIndex};
    pub use crate::registry::{TypeBuilder, TypeRegistry};
    pub use crate::value::{Value, ValueKind};

    #[cfg(feature = "native")]
    pub use crate::native::NativeModuleHost;
}

//! Component trait implemented by project types

use std::any::Any;

/// A typed unit of state or behavior attached to one entity
///
/// The type name is the reconnection key between old and new code, so it
/// must stay stable across module reloads.
pub trait Component: Any + Send {
    /// Stable, human-readable type name
    fn type_name(&self) -> &str;

    /// Get as Any reference (for reflection and downcasting)
    fn as_any(&self) -> &dyn Any;

    /// Get as mutable Any reference
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Receive an event broadcast into the component's subtree
    fn on_event(&mut self, _event: &dyn Any) {}
}

impl dyn Component {
    /// Downcast to a concrete type
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Downcast to a mutable concrete type
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }
}

/// Implement [`Component`] for a type that does not handle events
///
/// ```ignore
/// #[derive(Default)]
/// struct Health { value: i32 }
///
/// void_reflect::impl_component!(Health, "Health");
/// ```
#[macro_export]
macro_rules! impl_component {
    ($ty:ty, $name:expr) => {
        impl $crate::Component for $ty {
            fn type_name(&self) -> &str {
                $name
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }
        }
    };
}

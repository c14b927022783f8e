//! Demo project module
//!
//! Build it as a `cdylib` and point `void-project` at the artifact. Edit this
//! file while the host is running: the module is rebuilt and reloaded, and
//! every `value` and `ticks` survives the reload.

use std::any::Any;

use void_reflect::{Component, TypeBuilder, TypeRegistry};
use void_scene::{ManagerAdded, Tick};

/// Holds a single integer
pub struct InternalComponent {
    value: i32,
}

impl InternalComponent {
    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn set_value(&mut self, value: i32) {
        self.value = value;
    }

    /// Not a property: takes an argument
    pub fn multiply_value(&self, multiplier: i32) -> i32 {
        self.value * multiplier
    }
}

impl Default for InternalComponent {
    fn default() -> Self {
        Self { value: 100 }
    }
}

void_reflect::impl_component!(InternalComponent, "InternalComponent");

/// Counts host ticks
#[derive(Default)]
pub struct OtherInternalComponent {
    ticks: u32,
}

impl OtherInternalComponent {
    pub fn ticks(&self) -> i32 {
        self.ticks as i32
    }

    pub fn set_ticks(&mut self, ticks: i32) {
        self.ticks = ticks.max(0) as u32;
    }
}

impl Component for OtherInternalComponent {
    fn type_name(&self) -> &str {
        "OtherInternalComponent"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn on_event(&mut self, event: &dyn Any) {
        if let Some(tick) = event.downcast_ref::<Tick>() {
            self.ticks = self.ticks.wrapping_add(1);
            if tick.frame % 600 == 0 {
                log::info!("ticks() => {}", self.ticks);
            }
        } else if let Some(added) = event.downcast_ref::<ManagerAdded>() {
            log::info!("Manager available: {}", added.name);
        }
    }
}

/// Register every component of this module
pub fn register(registry: &mut TypeRegistry) {
    registry
        .register(
            TypeBuilder::<InternalComponent>::new("InternalComponent")
                .getter("value", InternalComponent::value)
                .setter("setValue", InternalComponent::set_value)
                .method("multiplyValue", InternalComponent::multiply_value),
        )
        .register(
            TypeBuilder::<OtherInternalComponent>::new("OtherInternalComponent")
                .getter("ticks", OtherInternalComponent::ticks)
                .setter("setTicks", OtherInternalComponent::set_ticks),
        );
}

void_reflect::export_module!(register);

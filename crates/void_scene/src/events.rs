//! Events broadcast into scene subtrees

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A host service became available to the subtree
///
/// Sent once per registered manager right after a graph is built, so that
/// freshly constructed components can discover the services around them.
#[derive(Clone)]
pub struct ManagerAdded {
    /// Manager name
    pub name: String,
    /// The manager itself
    pub manager: Arc<dyn Any + Send + Sync>,
}

impl ManagerAdded {
    /// Create a notification for a manager
    pub fn new(name: impl Into<String>, manager: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            name: name.into(),
            manager,
        }
    }

    /// Downcast the manager to a concrete type
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.manager.clone().downcast::<T>().ok()
    }
}

impl fmt::Debug for ManagerAdded {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerAdded").field("name", &self.name).finish()
    }
}

/// Host heartbeat forwarded into the project graph
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tick {
    /// Tick counter
    pub frame: u64,
    /// Seconds since the previous tick
    pub delta: f32,
}

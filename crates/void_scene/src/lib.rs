//! # void_scene - Project Scene Trees
//!
//! The live entity tree of a project, plus the type-erased snapshot format used
//! to carry it across a module reload and to store it on disk.
//!
//! ## Reload Round-Trip
//!
//! ```text
//!  SceneGraph (old module) ──serialize──▶ SerializedNode ──deserialize──▶ SceneGraph (new module)
//!                                              │   ▲
//!                                         save │   │ load
//!                                              ▼   │
//!                                          scene.json
//! ```
//!
//! Only properties found by the property index survive the trip. Anything a
//! component keeps outside its `x`/`setX` pairs is reset to the defaults of the
//! new module's constructor.
//!
//! ## Example
//!
//! ```ignore
//! use void_scene::{deserialize, serialize, SerializedNode};
//!
//! let snapshot = serialize(&graph, old_registry);
//! drop(graph);
//! // ... unload old module, load new module ...
//! let graph = deserialize(&snapshot, new_registry);
//! ```

mod error;
mod events;
mod graph;
mod loader;
mod node;
mod serializer;

pub use error::{Result, SceneError};
pub use events::{ManagerAdded, Tick};
pub use graph::{EntityId, SceneGraph};
pub use loader::{deserialize, load_component, load_into};
pub use node::{ComponentEntry, SerializedNode};
pub use serializer::{serialize, serialize_component, serialize_entity};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{Result, SceneError};
    pub use crate::events::{ManagerAdded, Tick};
    pub use crate::graph::{EntityId, SceneGraph};
    pub use crate::loader::deserialize;
    pub use crate::node::{ComponentEntry, SerializedNode};
    pub use crate::serializer::serialize;
}

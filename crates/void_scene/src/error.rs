//! Error types for the scene system

use std::path::PathBuf;
use thiserror::Error;

use crate::graph::EntityId;

/// Result type for scene operations
pub type Result<T> = std::result::Result<T, SceneError>;

/// Errors that can occur in the scene system
#[derive(Debug, Error)]
pub enum SceneError {
    /// Scene file missing or unreadable
    #[error("Failed to read scene '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed scene JSON
    #[error("Malformed scene: {0}")]
    Parse(#[from] serde_json::Error),

    /// Entity handle does not belong to this graph
    #[error("Entity {0:?} not found")]
    EntityNotFound(EntityId),

    /// Reflection failure
    #[error(transparent)]
    Reflect(#[from] void_reflect::ReflectError),
}

impl SceneError {
    /// Create an IO error for a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SceneError::Io {
            path: path.into(),
            source,
        }
    }
}

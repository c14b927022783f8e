//! Error types for the project runtime

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for project operations
pub type Result<T> = std::result::Result<T, ProjectError>;

/// Errors that can occur while running a project
#[derive(Debug, Error)]
pub enum ProjectError {
    /// File missing or unreadable
    #[error("Failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed configuration file
    #[error("Invalid config '{path}': {source}")]
    Config {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Operation needs a loaded module
    #[error("No project module is loaded")]
    ModuleNotLoaded,

    /// Operation needs a live graph
    #[error("No project graph exists")]
    NoGraph,

    /// Build process could not be started
    #[error("Failed to launch '{command}': {message}")]
    Launch {
        command: String,
        message: String,
    },

    /// File watcher error
    #[cfg(feature = "watch")]
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Reflection or module error
    #[error(transparent)]
    Reflect(#[from] void_reflect::ReflectError),

    /// Scene error
    #[error(transparent)]
    Scene(#[from] void_scene::SceneError),
}

impl ProjectError {
    /// Create an IO error for a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProjectError::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a launch error
    pub fn launch(command: impl Into<String>, message: impl Into<String>) -> Self {
        ProjectError::Launch {
            command: command.into(),
            message: message.into(),
        }
    }
}

/// Which coordinator step failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReloadErrorKind {
    /// Module failed to load or link
    ModuleLoad,
    /// Scene file missing or unreadable
    SceneRead,
    /// Scene file is not a valid snapshot
    SceneParse,
}

impl fmt::Display for ReloadErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ModuleLoad => write!(f, "module load"),
            Self::SceneRead => write!(f, "scene read"),
            Self::SceneParse => write!(f, "scene parse"),
        }
    }
}

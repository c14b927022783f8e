//! Error types for reflection and module hosting

use std::path::PathBuf;
use thiserror::Error;

use crate::value::ValueKind;

/// Result type for reflection operations
pub type Result<T> = std::result::Result<T, ReflectError>;

/// Errors that can occur while reflecting over project types
#[derive(Debug, Error)]
pub enum ReflectError {
    /// Type name is not known to the active registry
    #[error("Type '{0}' not registered")]
    TypeNotFound(String),

    /// Accessor or mutator failed, or its argument could not be coerced
    #[error("Property '{property}' failed: {message}")]
    PropertyInvocation {
        property: String,
        message: String,
    },

    /// A value could not be read as the expected primitive kind
    #[error("Expected {expected}, found {found}")]
    Parse {
        expected: ValueKind,
        found: String,
    },

    /// Module failed to load or link
    #[error("Failed to load module '{path}': {message}")]
    ModuleLoad {
        path: PathBuf,
        message: String,
    },

    /// Module does not export a required symbol
    #[error("Symbol '{symbol}' not found in module '{module}'")]
    SymbolNotFound {
        module: String,
        symbol: String,
    },

    /// Module was built against another ABI revision
    #[error("Version mismatch: module API version {module_version}, expected {expected_version}")]
    VersionMismatch {
        module_version: u32,
        expected_version: u32,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ReflectError {
    /// Create a property invocation error
    pub fn invocation(property: impl Into<String>, message: impl Into<String>) -> Self {
        ReflectError::PropertyInvocation {
            property: property.into(),
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse(expected: ValueKind, found: impl Into<String>) -> Self {
        ReflectError::Parse {
            expected,
            found: found.into(),
        }
    }

    /// Create a module load error
    pub fn module_load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        ReflectError::ModuleLoad {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a symbol not found error
    pub fn symbol_not_found(module: impl Into<String>, symbol: impl Into<String>) -> Self {
        ReflectError::SymbolNotFound {
            module: module.into(),
            symbol: symbol.into(),
        }
    }
}

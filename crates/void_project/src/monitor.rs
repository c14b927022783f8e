//! File monitor and file loader
//!
//! The coordinator never touches the filesystem directly. It asks a
//! [`FileMonitor`] whether the module artifact or the scene file changed, and
//! reads scene text through a [`FileLoader`].

use crate::error::{ProjectError, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Edge-triggered change detection
pub trait FileMonitor {
    /// Whether the file exists right now
    fn exists(&self, path: &Path) -> bool;

    /// Whether the file changed since the previous call for the same path
    ///
    /// Reports each modification once. The first call for an existing file
    /// reports a change.
    fn changed(&mut self, path: &Path) -> bool;
}

/// Reads whole text files
pub trait FileLoader {
    /// Read a file, failing on missing or unreadable files
    fn load_text(&self, path: &Path) -> Result<String>;
}

/// On-disk identity of a file version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeToken {
    modified: Option<SystemTime>,
    len: u64,
}

impl ChangeToken {
    /// Token for the file's current state, `None` if it does not exist
    pub fn of(path: &Path) -> Option<Self> {
        let metadata = std::fs::metadata(path).ok()?;
        Some(Self {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }
}

/// Monitor comparing modification time and size on every poll
#[derive(Debug, Default)]
pub struct PollingFileMonitor {
    tokens: HashMap<PathBuf, Option<ChangeToken>>,
}

impl PollingFileMonitor {
    /// Create a monitor that has seen nothing yet
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget a path; its next poll reports a change if it exists
    pub fn forget(&mut self, path: &Path) {
        self.tokens.remove(path);
    }
}

impl FileMonitor for PollingFileMonitor {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn changed(&mut self, path: &Path) -> bool {
        let current = ChangeToken::of(path);
        let previous = self.tokens.insert(path.to_path_buf(), current).flatten();

        // Deletion is recorded but not reported; the reappearance is.
        current.is_some() && current != previous
    }
}

/// Loader backed by `std::fs`
#[derive(Debug, Clone, Copy, Default)]
pub struct FsFileLoader;

impl FileLoader for FsFileLoader {
    fn load_text(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| ProjectError::io(path, e))
    }
}

//! # void_project - Hot Reload for Project Modules
//!
//! Runs a project's module and scene inside a long-lived host, rebuilding and
//! reloading the module whenever its sources change while keeping the state of
//! the live scene.
//!
//! ## Architecture
//!
//! ```text
//!  sources ──notify──▶ BuildWatchSupervisor ──(one build at a time)──▶ module artifact
//!  assets  ──notify──┘                                                      │
//!                                                                 polled by │
//!                                                                           ▼
//!  host tick ─────────────────────────────────────────────────▶ ReloadCoordinator
//!                                                               capture ▸ reload ▸ rebuild
//!                                                                           │
//!                                                                           ▼
//!                                                                      SceneGraph
//! ```
//!
//! The supervisor runs on background threads. The coordinator and everything it
//! owns stay on the ticking thread; the filesystem is the only channel between
//! the two.
//!
//! ## Example
//!
//! ```ignore
//! use void_project::prelude::*;
//! use void_reflect::NativeModuleHost;
//!
//! let mut coordinator = ReloadCoordinator::new(
//!     NativeModuleHost::new(),
//!     PollingFileMonitor::new(),
//!     FsFileLoader,
//!     "generated/build/libtest_project.so",
//! );
//! coordinator.select_scene("scenes/main.json");
//!
//! loop {
//!     coordinator.tick();
//!     std::thread::sleep(std::time::Duration::from_millis(16));
//! }
//! ```

mod backoff;
mod config;
mod coordinator;
mod error;
mod monitor;
mod supervisor;

pub use backoff::RetryBackoff;
pub use config::{default_module_artifact, BuildConfig, ProjectConfig, DEFAULT_CONFIG_FILE};
pub use coordinator::{ReloadCoordinator, ReloadState};
pub use error::{ProjectError, ReloadErrorKind, Result};
pub use monitor::{ChangeToken, FileLoader, FileMonitor, FsFileLoader, PollingFileMonitor};
pub use supervisor::{
    BuildKind, BuildLauncher, BuildProcess, BuildSettings, BuildSlot, BuildSlotGuard, BuildTrigger,
    BuildWatchSupervisor, OutputSink, OutputStream, ShellLauncher,
};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::ProjectConfig;
    pub use crate::coordinator::{ReloadCoordinator, ReloadState};
    pub use crate::error::{ProjectError, ReloadErrorKind, Result};
    pub use crate::monitor::{FileLoader, FileMonitor, FsFileLoader, PollingFileMonitor};
    pub use crate::supervisor::{BuildKind, BuildSettings, BuildWatchSupervisor, ShellLauncher};
}

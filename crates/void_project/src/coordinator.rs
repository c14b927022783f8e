//! Reload coordinator
//!
//! A tick-driven state machine that keeps the live project graph in sync with
//! the module artifact and the selected scene file. Each tick resolves pending
//! work in a fixed order:
//!
//! 1. module artifact changed: capture the graph, drop it, mark the module stale
//! 2. scene changed or reload requested: drop the graph and any capture
//! 3. module stale: load the module
//! 4. scene not loaded: read and parse the scene file
//! 5. no graph: build one from the scene, or else from the capture, then
//!    announce every registered manager into it
//!
//! All of this runs on the thread that calls [`ReloadCoordinator::tick`].
//! Failures abort only their own step and are retried on later ticks.

use crate::backoff::RetryBackoff;
use crate::error::{ProjectError, ReloadErrorKind, Result};
use crate::monitor::{FileLoader, FileMonitor};
use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use void_reflect::{ModuleHost, TypeRegistry};
use void_scene::{ManagerAdded, SceneGraph, SerializedNode};

/// Coordinator state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadState {
    /// Nothing to show: no module yet, or no scene or capture to build from
    Idle,
    /// Module artifact changed on disk
    ModuleStale,
    /// Module is being loaded
    Reloading,
    /// Scene file changed or a reload was requested
    SceneStale,
    /// Scene file is being read
    SceneLoading,
    /// Graph is being built from a snapshot
    GraphBuilding,
    /// A graph is live
    Ready,
    /// A step failed and is waiting to be retried
    Error(ReloadErrorKind),
}

impl fmt::Display for ReloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::ModuleStale => write!(f, "module stale"),
            Self::Reloading => write!(f, "reloading"),
            Self::SceneStale => write!(f, "scene stale"),
            Self::SceneLoading => write!(f, "scene loading"),
            Self::GraphBuilding => write!(f, "graph building"),
            Self::Ready => write!(f, "ready"),
            Self::Error(kind) => write!(f, "error ({})", kind),
        }
    }
}

/// Keeps a project graph alive across module and scene reloads
pub struct ReloadCoordinator<H, M, L> {
    host: H,
    monitor: M,
    loader: L,

    module_path: PathBuf,
    module_loaded: bool,

    scene_path: Option<PathBuf>,
    scene_loaded: bool,
    reload_requested: bool,

    /// Parsed scene file waiting to be built
    scene_snapshot: Option<SerializedNode>,
    /// Graph captured before a module reload
    captured: Option<SerializedNode>,

    /// Dropped before the module it was built from
    graph: Option<SceneGraph>,
    graph_generation: u64,

    managers: Vec<(String, Arc<dyn Any + Send + Sync>)>,

    state: ReloadState,
    last_error: Option<ReloadErrorKind>,
    module_backoff: RetryBackoff,
    scene_backoff: RetryBackoff,
}

impl<H, M, L> ReloadCoordinator<H, M, L>
where
    H: ModuleHost,
    M: FileMonitor,
    L: FileLoader,
{
    /// Create a coordinator for the module artifact at `module_path`
    ///
    /// Nothing happens until the first tick.
    pub fn new(host: H, monitor: M, loader: L, module_path: impl Into<PathBuf>) -> Self {
        Self {
            host,
            monitor,
            loader,
            module_path: module_path.into(),
            module_loaded: false,
            scene_path: None,
            scene_loaded: false,
            reload_requested: false,
            scene_snapshot: None,
            captured: None,
            graph: None,
            graph_generation: 0,
            managers: Vec::new(),
            state: ReloadState::Idle,
            last_error: None,
            module_backoff: RetryBackoff::new(0),
            scene_backoff: RetryBackoff::new(0),
        }
    }

    /// Back off failed module and scene loads, capped at `max_ticks`
    pub fn with_retry_backoff(mut self, max_ticks: u32) -> Self {
        self.module_backoff = RetryBackoff::new(max_ticks);
        self.scene_backoff = RetryBackoff::new(max_ticks);
        self
    }

    /// Make `path` the authoritative scene; it is loaded on the next tick
    pub fn select_scene(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        log::info!("Selected scene {}", path.display());
        self.scene_path = Some(path);
        self.reload_requested = true;
    }

    /// Reload the selected scene from disk on the next tick
    ///
    /// Unsaved changes to the live graph are lost.
    pub fn request_reload(&mut self) {
        self.reload_requested = true;
    }

    /// Register a host service and announce it to the live graph
    ///
    /// Registered managers are also announced to every graph built later.
    pub fn add_manager(&mut self, name: impl Into<String>, manager: Arc<dyn Any + Send + Sync>) {
        let name = name.into();
        if let Some(graph) = self.graph.as_mut() {
            let root = graph.root();
            graph.broadcast(root, &ManagerAdded::new(name.clone(), Arc::clone(&manager)));
        }
        self.managers.push((name, manager));
    }

    /// Deliver a host event to every component of the live graph
    pub fn forward_event(&mut self, event: &dyn Any) {
        if let Some(graph) = self.graph.as_mut() {
            let root = graph.root();
            graph.broadcast(root, event);
        }
    }

    /// Run one pass of the reload pipeline
    pub fn tick(&mut self) {
        self.check_module();
        self.check_scene();
        self.load_module();
        self.load_scene();
        self.build_graph();
        self.settle();
    }

    /// Step 1
    fn check_module(&mut self) {
        if !self.monitor.changed(&self.module_path) {
            return;
        }
        self.set_state(ReloadState::ModuleStale);
        self.module_backoff.reset();

        if let Some(graph) = self.graph.take() {
            if self.module_loaded {
                let snapshot = void_scene::serialize(&graph, self.host.registry());
                log::debug!("Captured {} nodes before module reload", snapshot.node_count());
                self.captured = Some(snapshot);
            }
        }
        self.module_loaded = false;
    }

    /// Step 2
    fn check_scene(&mut self) {
        let Some(scene_path) = self.scene_path.as_deref() else {
            return;
        };
        let changed = self.monitor.changed(scene_path);
        if !changed && !self.reload_requested {
            return;
        }
        self.set_state(ReloadState::SceneStale);
        self.reload_requested = false;
        self.scene_backoff.reset();

        self.graph = None;
        self.captured = None;
        self.scene_snapshot = None;
        self.scene_loaded = false;
    }

    /// Step 3
    fn load_module(&mut self) {
        if self.module_loaded || !self.module_backoff.ready() {
            return;
        }
        self.set_state(ReloadState::Reloading);

        match self.host.load(&self.module_path) {
            Ok(()) => {
                log::info!(
                    "Loaded project module {} ({} types)",
                    self.module_path.display(),
                    self.host.registry().len()
                );
                self.module_loaded = true;
                self.module_backoff.reset();
                self.clear_error(ReloadErrorKind::ModuleLoad);
            }
            Err(e) => {
                log::error!("Failed to load project module: {}", e);
                self.module_backoff.failed();
                self.fail(ReloadErrorKind::ModuleLoad);
            }
        }
    }

    /// Step 4
    fn load_scene(&mut self) {
        if !self.module_loaded || self.scene_loaded {
            return;
        }
        let Some(scene_path) = self.scene_path.clone() else {
            return;
        };
        if !self.scene_backoff.ready() {
            return;
        }
        self.set_state(ReloadState::SceneLoading);

        let text = match self.loader.load_text(&scene_path) {
            Ok(text) => text,
            Err(e) => {
                log::error!("Failed to read scene: {}", e);
                self.scene_backoff.failed();
                self.fail(ReloadErrorKind::SceneRead);
                return;
            }
        };

        match SerializedNode::from_json_str(&text) {
            Ok(snapshot) => {
                log::info!("Loaded scene {}", scene_path.display());
                self.scene_snapshot = Some(snapshot);
                self.scene_loaded = true;
                self.scene_backoff.reset();
                self.clear_error(ReloadErrorKind::SceneRead);
                self.clear_error(ReloadErrorKind::SceneParse);
            }
            Err(e) => {
                log::error!("Failed to parse scene {}: {}", scene_path.display(), e);
                self.scene_backoff.failed();
                self.fail(ReloadErrorKind::SceneParse);
            }
        }
    }

    /// Step 5
    fn build_graph(&mut self) {
        if !self.module_loaded || self.graph.is_some() {
            return;
        }
        // The scene file wins over an in-memory capture
        let Some(snapshot) = self.scene_snapshot.take().or_else(|| self.captured.take()) else {
            return;
        };
        self.captured = None;
        self.set_state(ReloadState::GraphBuilding);
        self.install(&snapshot);
    }

    fn install(&mut self, snapshot: &SerializedNode) {
        let mut graph = void_scene::deserialize(snapshot, self.host.registry());
        let root = graph.root();
        for (name, manager) in &self.managers {
            graph.broadcast(root, &ManagerAdded::new(name.clone(), Arc::clone(manager)));
        }

        self.graph_generation += 1;
        log::info!(
            "Built project graph {} ({} entities, {} components)",
            self.graph_generation,
            graph.entity_count(),
            graph.component_count()
        );
        self.graph = Some(graph);
    }

    fn settle(&mut self) {
        let state = if self.graph.is_some() {
            ReloadState::Ready
        } else if let Some(kind) = self.last_error {
            ReloadState::Error(kind)
        } else {
            ReloadState::Idle
        };
        self.set_state(state);
    }

    fn fail(&mut self, kind: ReloadErrorKind) {
        self.last_error = Some(kind);
        self.set_state(ReloadState::Error(kind));
    }

    fn clear_error(&mut self, kind: ReloadErrorKind) {
        if self.last_error == Some(kind) {
            self.last_error = None;
        }
    }

    fn set_state(&mut self, state: ReloadState) {
        if self.state != state {
            log::debug!("Reload state: {} -> {}", self.state, state);
            self.state = state;
        }
    }

    /// Replace the live graph with one built from `snapshot`
    pub fn load_from_json(&mut self, snapshot: &SerializedNode) -> Result<()> {
        if !self.module_loaded {
            return Err(ProjectError::ModuleNotLoaded);
        }
        self.graph = None;
        self.captured = None;
        self.scene_snapshot = None;
        // The caller's snapshot stands in for the selected scene until the file changes
        self.scene_loaded = true;
        self.reload_requested = false;
        self.scene_backoff.reset();
        self.clear_error(ReloadErrorKind::SceneRead);
        self.clear_error(ReloadErrorKind::SceneParse);
        self.install(snapshot);
        self.settle();
        Ok(())
    }

    /// Capture the live graph
    pub fn save_to_json(&self) -> Result<SerializedNode> {
        let graph = self.graph.as_ref().ok_or(ProjectError::NoGraph)?;
        Ok(void_scene::serialize(graph, self.host.registry()))
    }

    /// Write the live graph to a scene file
    pub fn save_scene(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.save_to_json()?.save(path)?;
        log::info!("Saved scene {}", path.display());
        Ok(())
    }

    /// Current state
    pub fn state(&self) -> ReloadState {
        self.state
    }

    /// The live project graph
    pub fn graph(&self) -> Option<&SceneGraph> {
        self.graph.as_ref()
    }

    /// The live project graph, mutably
    pub fn graph_mut(&mut self) -> Option<&mut SceneGraph> {
        self.graph.as_mut()
    }

    /// Number of graphs built so far
    pub fn graph_generation(&self) -> u64 {
        self.graph_generation
    }

    /// Whether the module is loaded and current
    pub fn is_module_loaded(&self) -> bool {
        self.module_loaded
    }

    /// Whether the selected scene has been read since it last changed
    pub fn is_scene_loaded(&self) -> bool {
        self.scene_loaded
    }

    /// Whether a capture is waiting for the next module
    pub fn has_capture(&self) -> bool {
        self.captured.is_some()
    }

    /// Registry of the loaded module
    pub fn registry(&self) -> &TypeRegistry {
        self.host.registry()
    }

    /// Module artifact path
    pub fn module_path(&self) -> &Path {
        &self.module_path
    }

    /// Selected scene path
    pub fn scene_path(&self) -> Option<&Path> {
        self.scene_path.as_deref()
    }

    /// The module host
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The file monitor
    pub fn monitor_mut(&mut self) -> &mut M {
        &mut self.monitor
    }
}

impl<H, M, L> fmt::Debug for ReloadCoordinator<H, M, L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReloadCoordinator")
            .field("module_path", &self.module_path)
            .field("scene_path", &self.scene_path)
            .field("state", &self.state)
            .field("graph_generation", &self.graph_generation)
            .finish()
    }
}

//! Build-watch supervisor
//!
//! Watches project sources and asset sources, and rebuilds the module artifact
//! or the packed assets when they change. Both watches share one [`BuildSlot`],
//! so a compile and an asset pack never run at the same time and never write
//! the output directory concurrently.
//!
//! Notifications that arrive while a build is in flight are dropped, not
//! queued. The coordinator picks up the new artifact by polling, so the two
//! sides only meet on the filesystem.

use crate::config::ProjectConfig;
use crate::error::{ProjectError, Result};
use crate::monitor::FileMonitor;
use parking_lot::Mutex;
use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// What a build produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildKind {
    /// Compile the project module
    Compile,
    /// Pack asset sources into runtime assets
    PackAssets,
}

impl fmt::Display for BuildKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile => write!(f, "compile"),
            Self::PackAssets => write!(f, "pack-assets"),
        }
    }
}

/// Single-slot build permit
#[derive(Debug, Default)]
pub struct BuildSlot {
    busy: AtomicBool,
}

impl BuildSlot {
    /// Create a free slot
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the slot if it is free
    ///
    /// The returned guard frees the slot when dropped.
    pub fn try_acquire(self: &Arc<Self>) -> Option<BuildSlotGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BuildSlotGuard {
                slot: Arc::clone(self),
            })
    }

    /// Free the slot
    pub fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    /// Whether a build holds the slot
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Holds the [`BuildSlot`] until dropped
#[derive(Debug)]
pub struct BuildSlotGuard {
    slot: Arc<BuildSlot>,
}

impl Drop for BuildSlotGuard {
    fn drop(&mut self) {
        self.slot.release();
    }
}

/// Stream a build output line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Receives build output line by line, from any thread
pub type OutputSink = Arc<dyn Fn(OutputStream, &str) + Send + Sync>;

/// A running build
pub trait BuildProcess: Send {
    /// Block until the build exits; `None` if it was killed by a signal
    fn wait(&mut self) -> Result<Option<i32>>;
}

/// Starts build commands
pub trait BuildLauncher: Send + Sync {
    /// Start `command` in `working_dir`, streaming its output into `sink`
    fn spawn(&self, command: &str, working_dir: &Path, sink: OutputSink) -> Result<Box<dyn BuildProcess>>;
}

/// Launcher running commands through the platform shell
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellLauncher;

impl ShellLauncher {
    /// Create a shell launcher
    pub fn new() -> Self {
        Self
    }

    fn command(command: &str) -> Command {
        if cfg!(windows) {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", command]);
            cmd
        } else {
            let mut cmd = Command::new("sh");
            cmd.args(["-c", command]);
            cmd
        }
    }
}

impl BuildLauncher for ShellLauncher {
    fn spawn(&self, command: &str, working_dir: &Path, sink: OutputSink) -> Result<Box<dyn BuildProcess>> {
        let mut child = Self::command(command)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ProjectError::launch(command, e.to_string()))?;

        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(stream_lines(stdout, OutputStream::Stdout, Arc::clone(&sink)));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(stream_lines(stderr, OutputStream::Stderr, sink));
        }

        Ok(Box::new(ShellProcess { child, readers }))
    }
}

fn stream_lines<R: Read + Send + 'static>(source: R, stream: OutputStream, sink: OutputSink) -> JoinHandle<()> {
    thread::spawn(move || {
        for line in BufReader::new(source).lines() {
            match line {
                Ok(line) => sink(stream, &line),
                Err(e) => {
                    log::debug!("Build output {:?} closed: {}", stream, e);
                    break;
                }
            }
        }
    })
}

struct ShellProcess {
    child: Child,
    readers: Vec<JoinHandle<()>>,
}

impl BuildProcess for ShellProcess {
    fn wait(&mut self) -> Result<Option<i32>> {
        let status = self
            .child
            .wait()
            .map_err(|e| ProjectError::launch("build", e.to_string()))?;
        for reader in self.readers.drain(..) {
            let _ = reader.join();
        }
        Ok(status.code())
    }
}

/// Where and how to build
#[derive(Debug, Clone, Default)]
pub struct BuildSettings {
    /// Working directory for build commands
    pub project_dir: PathBuf,
    /// Directories whose changes trigger a compile
    pub source_dirs: Vec<PathBuf>,
    /// Directories whose changes trigger an asset pack
    pub asset_dirs: Vec<PathBuf>,
    /// Compile command; empty disables compiling
    pub compile_command: String,
    /// Asset pack command; empty disables packing
    pub pack_command: String,
}

impl BuildSettings {
    /// Settings with watch directories resolved against the project directory
    pub fn from_config(config: &ProjectConfig) -> Self {
        let resolve = |dirs: &[PathBuf]| -> Vec<PathBuf> {
            dirs.iter().map(|d| config.project_dir.join(d)).collect()
        };
        Self {
            project_dir: config.project_dir.clone(),
            source_dirs: resolve(&config.build.source_dirs),
            asset_dirs: resolve(&config.build.asset_dirs),
            compile_command: config.build.compile_command.clone(),
            pack_command: config.build.pack_command.clone(),
        }
    }

    fn command(&self, kind: BuildKind) -> &str {
        match kind {
            BuildKind::Compile => &self.compile_command,
            BuildKind::PackAssets => &self.pack_command,
        }
    }
}

struct Shared {
    settings: BuildSettings,
    launcher: Arc<dyn BuildLauncher>,
    slot: Arc<BuildSlot>,
    builds: Mutex<Vec<JoinHandle<()>>>,
    completed: AtomicUsize,
    dropped: AtomicUsize,
}

impl Shared {
    fn trigger(self: &Arc<Self>, kind: BuildKind) -> bool {
        let command = self.settings.command(kind).trim().to_string();
        if command.is_empty() {
            log::debug!("No {} command configured", kind);
            return false;
        }

        let Some(guard) = self.slot.try_acquire() else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            log::debug!("Build in flight, ignoring {} trigger", kind);
            return false;
        };

        let shared = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name(format!("void-build-{}", kind))
            .spawn(move || {
                let _guard = guard;
                shared.run(kind, &command);
                shared.completed.fetch_add(1, Ordering::Release);
            });

        match spawned {
            Ok(handle) => {
                let mut builds = self.builds.lock();
                builds.retain(|h| !h.is_finished());
                builds.push(handle);
                true
            }
            Err(e) => {
                log::error!("Failed to start {} build thread: {}", kind, e);
                false
            }
        }
    }

    fn run(&self, kind: BuildKind, command: &str) {
        log::info!("Starting {} build: {}", kind, command);

        let sink: OutputSink = Arc::new(move |stream: OutputStream, line: &str| match stream {
            OutputStream::Stdout => log::info!("[{}] {}", kind, line),
            OutputStream::Stderr => log::warn!("[{}] {}", kind, line),
        });

        let status = self
            .launcher
            .spawn(command, &self.settings.project_dir, sink)
            .and_then(|mut process| process.wait());

        match status {
            Ok(Some(0)) => log::info!("{} build finished", kind),
            Ok(Some(code)) => log::warn!("{} build failed with exit code {}", kind, code),
            Ok(None) => log::warn!("{} build was terminated", kind),
            Err(e) => log::error!("{} build failed: {}", kind, e),
        }
    }
}

/// Cloneable handle starting builds through a supervisor's slot
#[derive(Clone)]
pub struct BuildTrigger {
    shared: Arc<Shared>,
}

impl BuildTrigger {
    /// Start a `kind` build unless one is in flight
    pub fn fire(&self, kind: BuildKind) -> bool {
        self.shared.trigger(kind)
    }
}

impl fmt::Debug for BuildTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildTrigger")
            .field("busy", &self.shared.slot.is_busy())
            .finish()
    }
}

/// Runs watches and the builds they trigger
pub struct BuildWatchSupervisor {
    shared: Arc<Shared>,
    #[cfg(feature = "watch")]
    watchers: Vec<notify::RecommendedWatcher>,
    dispatchers: Vec<JoinHandle<()>>,
}

impl BuildWatchSupervisor {
    /// Create a supervisor; nothing is watched until [`start`](Self::start)
    pub fn new(settings: BuildSettings, launcher: Arc<dyn BuildLauncher>) -> Self {
        Self {
            shared: Arc::new(Shared {
                settings,
                launcher,
                slot: Arc::new(BuildSlot::new()),
                builds: Mutex::new(Vec::new()),
                completed: AtomicUsize::new(0),
                dropped: AtomicUsize::new(0),
            }),
            #[cfg(feature = "watch")]
            watchers: Vec::new(),
            dispatchers: Vec::new(),
        }
    }

    /// Start watching source and asset directories
    #[cfg(feature = "watch")]
    pub fn start(&mut self) -> Result<()> {
        let source_dirs = self.shared.settings.source_dirs.clone();
        let asset_dirs = self.shared.settings.asset_dirs.clone();
        self.watch(BuildKind::Compile, &source_dirs)?;
        self.watch(BuildKind::PackAssets, &asset_dirs)?;
        Ok(())
    }

    /// Without the `watch` feature only explicit triggers build
    #[cfg(not(feature = "watch"))]
    pub fn start(&mut self) -> Result<()> {
        log::warn!("Built without the watch feature, sources are not watched");
        Ok(())
    }

    #[cfg(feature = "watch")]
    fn watch(&mut self, kind: BuildKind, dirs: &[PathBuf]) -> Result<()> {
        use notify::{RecursiveMode, Watcher};

        let dirs: Vec<&PathBuf> = dirs.iter().filter(|d| d.is_dir()).collect();
        if dirs.is_empty() {
            log::debug!("No directories to watch for {}", kind);
            return Ok(());
        }

        let (tx, rx) = crossbeam_channel::unbounded::<notify::Result<notify::Event>>();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = tx.send(res);
        })?;
        for dir in dirs {
            watcher.watch(dir, RecursiveMode::Recursive)?;
            log::info!("Watching {} for {}", dir.display(), kind);
        }

        // Ends once the watcher, and with it the sender, is dropped
        let trigger = self.trigger();
        let dispatcher = thread::Builder::new()
            .name(format!("void-watch-{}", kind))
            .spawn(move || {
                for res in rx.iter() {
                    match res {
                        Ok(event) if is_change(&event) => {
                            trigger.fire(kind);
                        }
                        Ok(_) => {}
                        Err(e) => log::warn!("Watch error ({}): {}", kind, e),
                    }
                }
            })
            .map_err(|e| ProjectError::launch(format!("{} watch", kind), e.to_string()))?;

        self.watchers.push(watcher);
        self.dispatchers.push(dispatcher);
        Ok(())
    }

    /// Compile right away if the module artifact does not exist yet
    ///
    /// Returns whether a build was started.
    pub fn ensure_built(&self, monitor: &dyn FileMonitor, artifact: &Path) -> bool {
        if monitor.exists(artifact) {
            return false;
        }
        log::info!("{} is missing, building", artifact.display());
        self.on_change(BuildKind::Compile)
    }

    /// Handle one change notification
    ///
    /// Returns whether a build was started; `false` when one is already in
    /// flight or no command is configured for `kind`.
    pub fn on_change(&self, kind: BuildKind) -> bool {
        self.shared.trigger(kind)
    }

    /// Handle for firing builds from other threads
    pub fn trigger(&self) -> BuildTrigger {
        BuildTrigger {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Block until every started build has finished
    pub fn wait_idle(&self) {
        let builds: Vec<JoinHandle<()>> = self.shared.builds.lock().drain(..).collect();
        for build in builds {
            let _ = build.join();
        }
    }

    /// The shared build slot
    pub fn slot(&self) -> &Arc<BuildSlot> {
        &self.shared.slot
    }

    /// Builds run to completion so far
    pub fn completed_builds(&self) -> usize {
        self.shared.completed.load(Ordering::Acquire)
    }

    /// Triggers ignored because a build was in flight
    pub fn dropped_triggers(&self) -> usize {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    /// Stop watching; running builds are left to finish
    pub fn stop(&mut self) {
        #[cfg(feature = "watch")]
        self.watchers.clear();
        for dispatcher in self.dispatchers.drain(..) {
            let _ = dispatcher.join();
        }
    }
}

impl Drop for BuildWatchSupervisor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(feature = "watch")]
fn is_change(event: &notify::Event) -> bool {
    use notify::EventKind;
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_is_exclusive() {
        let slot = Arc::new(BuildSlot::new());
        let guard = slot.try_acquire().unwrap();
        assert!(slot.is_busy());
        assert!(slot.try_acquire().is_none());

        drop(guard);
        assert!(!slot.is_busy());
        assert!(slot.try_acquire().is_some());
    }

    #[test]
    fn test_explicit_release() {
        let slot = Arc::new(BuildSlot::new());
        let guard = slot.try_acquire().unwrap();
        std::mem::forget(guard);
        assert!(slot.is_busy());

        slot.release();
        assert!(slot.try_acquire().is_some());
    }

    #[cfg(unix)]
    #[test]
    fn test_shell_launcher_streams_output() {
        let dir = tempfile::tempdir().unwrap();
        let lines = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&lines);
        let sink: OutputSink = Arc::new(move |stream: OutputStream, line: &str| {
            captured.lock().push((stream, line.to_string()))
        });

        let mut process = ShellLauncher::new()
            .spawn("pwd; echo oops 1>&2; exit 3", dir.path(), sink)
            .unwrap();
        assert_eq!(process.wait().unwrap(), Some(3));

        let lines = lines.lock();
        assert!(lines.contains(&(OutputStream::Stderr, "oops".to_string())));
        assert!(lines.iter().any(|(stream, _)| *stream == OutputStream::Stdout));
    }

    #[test]
    fn test_empty_command_never_takes_slot() {
        let supervisor = BuildWatchSupervisor::new(BuildSettings::default(), Arc::new(ShellLauncher::new()));
        assert!(!supervisor.on_change(BuildKind::Compile));
        assert!(!supervisor.slot().is_busy());
        assert_eq!(supervisor.dropped_triggers(), 0);
    }
}

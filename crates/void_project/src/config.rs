//! Project configuration
//!
//! # Configuration Sources (in priority order)
//!
//! 1. Environment: `VOID_PROJECT_SCENE`, `VOID_PROJECT_TICK_MS`,
//!    `VOID_PROJECT_NO_WATCH`
//! 2. Config file: the path given on the command line, or `void-project.toml`
//!    in the working directory
//! 3. Built-in defaults
//!
//! # Example Config File
//!
//! ```toml
//! project_dir = "demos/test_project"
//! module_artifact = "generated/build/libtest_project.so"
//! scene = "scenes/main.json"
//! tick_ms = 16
//! retry_backoff_max_ticks = 64
//!
//! [build]
//! source_dirs = ["src"]
//! asset_dirs = ["res_src"]
//! compile_command = "cargo build --lib"
//! pack_command = ""
//! watch = true
//! ```
//!
//! Relative paths are resolved against the project directory, and a relative
//! `project_dir` against the directory of the config file.

use crate::error::{ProjectError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file looked up when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "void-project.toml";

/// Build and watch settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Source directories, relative to the project directory
    pub source_dirs: Vec<PathBuf>,
    /// Asset source directories, relative to the project directory
    pub asset_dirs: Vec<PathBuf>,
    /// Shell command producing the module artifact
    pub compile_command: String,
    /// Shell command packing asset sources; empty to disable
    pub pack_command: String,
    /// Whether to watch sources and rebuild on change
    pub watch: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source_dirs: vec![PathBuf::from("src")],
            asset_dirs: vec![PathBuf::from("res_src")],
            compile_command: "cargo build --lib".to_string(),
            pack_command: String::new(),
            watch: true,
        }
    }
}

/// Complete project configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Project root; build commands run here
    pub project_dir: PathBuf,
    /// Module artifact, relative to the project directory
    pub module_artifact: PathBuf,
    /// Scene to open at startup, relative to the project directory
    pub scene: Option<PathBuf>,
    /// Tick interval in milliseconds
    pub tick_ms: u64,
    /// Cap for the retry backoff of failed loads; 0 retries every tick
    pub retry_backoff_max_ticks: u32,
    /// Build settings
    pub build: BuildConfig,
    /// File this config was read from
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            project_dir: PathBuf::from("."),
            module_artifact: default_module_artifact(),
            scene: None,
            tick_ms: 16,
            retry_backoff_max_ticks: 64,
            build: BuildConfig::default(),
            config_path: None,
        }
    }
}

/// Platform-specific file name of the demo module
pub fn default_module_artifact() -> PathBuf {
    let file_name = if cfg!(windows) {
        "test_project.dll"
    } else if cfg!(target_os = "macos") {
        "libtest_project.dylib"
    } else {
        "libtest_project.so"
    };
    Path::new("generated").join("build").join(file_name)
}

impl ProjectConfig {
    /// Load configuration from all sources
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load_from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => {
                log::info!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                Self::default()
            }
        };

        config.apply_env_from(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ProjectError::io(path, e))?;
        let mut config = Self::from_toml_str(&content).map_err(|source| ProjectError::Config {
            path: path.to_path_buf(),
            source,
        })?;

        if config.project_dir.is_relative() {
            if let Some(parent) = path.parent() {
                config.project_dir = parent.join(&config.project_dir);
            }
        }
        config.config_path = Some(path.to_path_buf());
        log::info!("Loaded project config from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply environment overrides read through `lookup`
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(scene) = lookup("VOID_PROJECT_SCENE").filter(|s| !s.is_empty()) {
            log::info!("Scene from env: {}", scene);
            self.scene = Some(PathBuf::from(scene));
        }

        if let Some(tick_ms) = lookup("VOID_PROJECT_TICK_MS") {
            match tick_ms.parse() {
                Ok(tick_ms) => self.tick_ms = tick_ms,
                Err(e) => log::warn!("Ignoring VOID_PROJECT_TICK_MS={}: {}", tick_ms, e),
            }
        }

        if lookup("VOID_PROJECT_NO_WATCH").map(|v| v == "1" || v == "true").unwrap_or(false) {
            self.build.watch = false;
        }
    }

    /// Absolute-or-cwd-relative path of the module artifact
    pub fn artifact_path(&self) -> PathBuf {
        self.project_dir.join(&self.module_artifact)
    }

    /// Path of the startup scene, if any
    pub fn scene_path(&self) -> Option<PathBuf> {
        self.scene.as_ref().map(|scene| self.project_dir.join(scene))
    }

    /// Tick interval
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    /// Log the effective configuration
    pub fn log_summary(&self) {
        log::info!("Project:  {}", self.project_dir.display());
        log::info!("Module:   {}", self.artifact_path().display());
        match self.scene_path() {
            Some(scene) => log::info!("Scene:    {}", scene.display()),
            None => log::info!("Scene:    (none)"),
        }
        log::info!("Tick:     {} ms", self.tick_ms);
        log::info!("Watching: {}", self.build.watch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = ProjectConfig::default();
        assert_eq!(config.tick_ms, 16);
        assert_eq!(config.retry_backoff_max_ticks, 64);
        assert!(config.build.watch);
        assert!(config.module_artifact.starts_with("generated/build"));
        assert_eq!(config.tick_interval(), Duration::from_millis(16));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = ProjectConfig::from_toml_str(
            r#"
            scene = "scenes/main.json"

            [build]
            pack_command = "pack res_src generated/res"
            "#,
        )
        .unwrap();

        assert_eq!(config.scene, Some(PathBuf::from("scenes/main.json")));
        assert_eq!(config.tick_ms, 16);
        assert_eq!(config.build.pack_command, "pack res_src generated/res");
        assert_eq!(config.build.compile_command, "cargo build --lib");
        assert_eq!(config.build.source_dirs, vec![PathBuf::from("src")]);
    }

    #[test]
    fn test_bad_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("void-project.toml");
        std::fs::write(&path, "tick_ms = \"fast\"").unwrap();

        assert!(matches!(
            ProjectConfig::load_from_file(&path),
            Err(ProjectError::Config { .. })
        ));
        assert!(matches!(
            ProjectConfig::load(Some(&dir.path().join("missing.toml"))),
            Err(ProjectError::Io { .. })
        ));
    }

    #[test]
    fn test_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("void-project.toml");
        std::fs::write(&path, "project_dir = \"game\"\nscene = \"main.json\"\n").unwrap();

        let config = ProjectConfig::load_from_file(&path).unwrap();
        assert_eq!(config.project_dir, dir.path().join("game"));
        assert_eq!(config.scene_path(), Some(dir.path().join("game").join("main.json")));
        assert_eq!(
            config.artifact_path(),
            dir.path().join("game").join(default_module_artifact())
        );
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("VOID_PROJECT_SCENE", "other.json"),
            ("VOID_PROJECT_TICK_MS", "100"),
            ("VOID_PROJECT_NO_WATCH", "1"),
        ]
        .into_iter()
        .collect();

        let mut config = ProjectConfig::default();
        config.apply_env_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.scene, Some(PathBuf::from("other.json")));
        assert_eq!(config.tick_ms, 100);
        assert!(!config.build.watch);
    }

    #[test]
    fn test_bad_env_value_is_ignored() {
        let mut config = ProjectConfig::default();
        config.apply_env_from(|key| (key == "VOID_PROJECT_TICK_MS").then(|| "soon".to_string()));
        assert_eq!(config.tick_ms, 16);
        assert!(config.build.watch);
    }
}

//! Void project host
//!
//! Loads a project module and its scene, rebuilds the module when sources
//! change, and reloads it without losing scene state.
//!
//! Run with: cargo run -p void_project -- [void-project.toml]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use void_project::prelude::*;
use void_reflect::NativeModuleHost;
use void_scene::Tick;

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = match ProjectConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };
    config.log_summary();

    if let Err(e) = run(config) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(config: ProjectConfig) -> Result<()> {
    let artifact = config.artifact_path();

    let mut supervisor =
        BuildWatchSupervisor::new(BuildSettings::from_config(&config), Arc::new(ShellLauncher::new()));
    if config.build.watch {
        supervisor.start()?;
    }
    let monitor = PollingFileMonitor::new();
    supervisor.ensure_built(&monitor, &artifact);

    let mut coordinator = ReloadCoordinator::new(
        NativeModuleHost::new(),
        monitor,
        FsFileLoader,
        artifact,
    )
    .with_retry_backoff(config.retry_backoff_max_ticks);

    coordinator.add_manager("project_config", Arc::new(config.clone()));
    if let Some(scene) = config.scene_path() {
        coordinator.select_scene(scene);
    }

    let interval = config.tick_interval();
    let mut frame = 0u64;
    let mut last = Instant::now();
    let mut state = coordinator.state();

    loop {
        let now = Instant::now();
        coordinator.tick();
        coordinator.forward_event(&Tick {
            frame,
            delta: now.duration_since(last).as_secs_f32(),
        });

        if coordinator.state() != state {
            state = coordinator.state();
            log::info!("Project is {}", state);
        }

        last = now;
        frame += 1;
        std::thread::sleep(interval.saturating_sub(now.elapsed()));
    }
}

//! Engine binary for the Townsfolk simulation.
//!
//! Loads configuration, builds the town, seeds its inhabitants and runs the
//! tick scheduler until Ctrl-C.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `townsfolk-config.yaml` (or the path in
//!    `TOWNSFOLK_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Build the simulation: clock, buildings, decor, grid
//! 4. Spawn seed agents
//! 5. Start the scheduler
//! 6. Pause on Ctrl-C and log the final status

mod error;
mod log_callback;
mod spawner;

use std::path::PathBuf;
use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use townsfolk_core::config::{ConfigError, LoggingConfig, SimulationConfig};
use townsfolk_core::narrative::NullNarrator;
use townsfolk_core::persistence::InMemoryPersistence;
use townsfolk_core::scheduler::Scheduler;
use townsfolk_core::tick::Simulation;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::log_callback::LogCallback;

/// Config file used when `TOWNSFOLK_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "townsfolk-config.yaml";

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step fails.
#[tokio::main]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let (config, config_source) = load_config()?;

    // 2. Initialize structured logging.
    init_logging(&config.logging)?;
    info!(
        source = %config_source,
        world_name = %config.world.name,
        seed = config.world.seed,
        tick_interval_ms = config.world.tick_interval_ms,
        minutes_per_tick = config.world.minutes_per_tick,
        policy = ?config.decision.policy,
        "Configuration loaded"
    );

    // 3. Build the simulation.
    let seed_count = config.agents.seed_count;
    let spawn_seed = config.world.seed;
    let mut simulation = Simulation::new(
        config,
        Arc::new(NullNarrator),
        Arc::new(InMemoryPersistence::new()),
    )?;

    // 4. Spawn seed agents.
    let mut rng = StdRng::seed_from_u64(spawn_seed);
    let agents = spawner::spawn_seed_agents(seed_count, simulation.buildings(), simulation.grid(), &mut rng)?;
    for agent in agents {
        let _ = simulation.add_agent(agent);
    }
    info!(
        agents = simulation.agent_count(),
        buildings = simulation.buildings().len(),
        policy = simulation.policy_name(),
        "Town assembled"
    );

    // 5. Start the scheduler.
    let mut scheduler = Scheduler::new(simulation, Box::new(LogCallback::new()));
    let _ = scheduler.start().await?;
    info!("Simulation running, press Ctrl-C to stop");

    // 6. Run until interrupted.
    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    scheduler.pause().await;

    let status = scheduler.status().await;
    let sim = scheduler.simulation();
    let sim = sim.lock().await;
    info!(
        ticks_run = status.ticks_run,
        clock = %sim.clock(),
        agents = sim.agent_count(),
        "townsfolk-engine shutdown complete"
    );
    Ok(())
}

/// Load configuration from `TOWNSFOLK_CONFIG` or the default path, falling
/// back to built-in defaults when the default file is absent.
///
/// Returns the config and a description of where it came from.
fn load_config() -> Result<(SimulationConfig, String), ConfigError> {
    if let Ok(path) = std::env::var("TOWNSFOLK_CONFIG") {
        let config = SimulationConfig::from_file(&PathBuf::from(&path))?;
        return Ok((config, path));
    }
    let path = PathBuf::from(DEFAULT_CONFIG_PATH);
    if path.exists() {
        let config = SimulationConfig::from_file(&path)?;
        Ok((config, String::from(DEFAULT_CONFIG_PATH)))
    } else {
        let mut config = SimulationConfig::default();
        config.world.apply_env_overrides();
        Ok((config, String::from("defaults")))
    }
}

/// Install the global subscriber. `RUST_LOG` wins over the configured level.
fn init_logging(logging: &LoggingConfig) -> Result<(), EngineError> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&logging.level));
    let filter = filter.map_err(|e| EngineError::Logging {
        message: format!("invalid log filter {:?}: {e}", logging.level),
    })?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| EngineError::Logging {
        message: e.to_string(),
    })
}

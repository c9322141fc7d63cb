//! Configuration loading and typed config structures for the Townsfolk
//! simulation.
//!
//! The canonical configuration lives in `townsfolk-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror
//! the YAML structure, and provides a loader that reads and validates the
//! file. Every field has a default, so an empty document is a valid
//! configuration.

use std::path::Path;

use serde::Deserialize;
use townsfolk_agents::NeedsConfig;
use townsfolk_types::{DecorElement, Weather};
use townsfolk_world::{BuildingSpec, GridConfig};
use tracing::warn;

/// Smallest accepted wall-clock tick interval.
pub const MIN_TICK_INTERVAL_MS: u64 = 100;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value parsed but is out of range.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `townsfolk-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Clock, cadence and seed.
    #[serde(default)]
    pub world: WorldConfig,

    /// Pathfinding grid dimensions and projection.
    #[serde(default)]
    pub grid: GridConfig,

    /// Movement speed and arrival tolerance.
    #[serde(default)]
    pub movement: MovementConfig,

    /// Need decay rates and emergency floors.
    #[serde(default)]
    pub needs: NeedsConfig,

    /// Urgency policy selection and thresholds.
    #[serde(default)]
    pub decision: DecisionConfig,

    /// Narrative event cadence.
    #[serde(default)]
    pub events: EventsConfig,

    /// Save cadence.
    #[serde(default)]
    pub persistence: PersistenceConfig,

    /// Seed buildings and decor.
    #[serde(default)]
    pub town: TownConfig,

    /// Seed population.
    #[serde(default)]
    pub agents: AgentsConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `TOWNSFOLK_SEED` overrides `world.seed`
    /// - `TOWNSFOLK_TICK_INTERVAL_MS` overrides `world.tick_interval_ms`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, applying environment
    /// overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.world.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Check ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| Err(ConfigError::Invalid { reason });

        if self.world.tick_interval_ms < MIN_TICK_INTERVAL_MS {
            return invalid(format!(
                "world.tick_interval_ms must be at least {MIN_TICK_INTERVAL_MS}, got {}",
                self.world.tick_interval_ms
            ));
        }
        if self.world.minutes_per_tick == 0 {
            return invalid(String::from("world.minutes_per_tick must be at least 1"));
        }
        if self.world.start_hour > 23 || self.world.start_minute > 59 {
            return invalid(format!(
                "world start time {}:{} is not a valid time of day",
                self.world.start_hour, self.world.start_minute
            ));
        }
        if self.movement.cells_per_tick == 0 {
            return invalid(String::from("movement.cells_per_tick must be at least 1"));
        }
        if !self.movement.arrival_tolerance.is_finite() || self.movement.arrival_tolerance < 0.0 {
            return invalid(format!(
                "movement.arrival_tolerance must be non-negative, got {}",
                self.movement.arrival_tolerance
            ));
        }
        if self.events.probability_percent > 100 {
            return invalid(format!(
                "events.probability_percent must be 0-100, got {}",
                self.events.probability_percent
            ));
        }
        self.needs.validate().map_err(|e| ConfigError::Invalid {
            reason: e.to_string(),
        })?;
        Ok(())
    }
}

/// World-level configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorldConfig {
    /// Human-readable town name.
    #[serde(default = "default_world_name")]
    pub name: String,

    /// Seed for weather and event rolls.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// In-world minutes each tick represents.
    #[serde(default = "default_minutes_per_tick")]
    pub minutes_per_tick: u32,

    /// Whether `start()` runs one tick before waiting for the first
    /// interval.
    #[serde(default = "default_true")]
    pub run_first_tick_immediately: bool,

    /// Hour the clock starts at.
    #[serde(default = "default_start_hour")]
    pub start_hour: u8,

    /// Minute the clock starts at.
    #[serde(default)]
    pub start_minute: u8,

    /// Day the clock starts at.
    #[serde(default = "default_start_day")]
    pub start_day: u32,

    /// Weather on the first day.
    #[serde(default)]
    pub start_weather: Weather,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            name: default_world_name(),
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
            minutes_per_tick: default_minutes_per_tick(),
            run_first_tick_immediately: true,
            start_hour: default_start_hour(),
            start_minute: 0,
            start_day: default_start_day(),
            start_weather: Weather::default(),
        }
    }
}

impl WorldConfig {
    /// Apply `TOWNSFOLK_SEED` and `TOWNSFOLK_TICK_INTERVAL_MS` if set.
    ///
    /// Unparsable values are ignored with a warning.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("TOWNSFOLK_SEED") {
            match val.parse() {
                Ok(seed) => self.seed = seed,
                Err(e) => warn!(value = %val, error = %e, "Ignoring invalid TOWNSFOLK_SEED"),
            }
        }
        if let Ok(val) = std::env::var("TOWNSFOLK_TICK_INTERVAL_MS") {
            match val.parse() {
                Ok(ms) => self.tick_interval_ms = ms,
                Err(e) => warn!(
                    value = %val,
                    error = %e,
                    "Ignoring invalid TOWNSFOLK_TICK_INTERVAL_MS"
                ),
            }
        }
    }
}

fn default_world_name() -> String {
    String::from("Townsfolk")
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_minutes_per_tick() -> u32 {
    5
}

const fn default_true() -> bool {
    true
}

const fn default_start_hour() -> u8 {
    8
}

const fn default_start_day() -> u32 {
    1
}

/// Movement configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MovementConfig {
    /// Path cells advanced per tick (default: 1).
    #[serde(default = "default_cells_per_tick")]
    pub cells_per_tick: usize,

    /// Distance under which an agent counts as already at its destination
    /// (default: 0.5).
    #[serde(default = "default_arrival_tolerance")]
    pub arrival_tolerance: f64,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            cells_per_tick: default_cells_per_tick(),
            arrival_tolerance: default_arrival_tolerance(),
        }
    }
}

const fn default_cells_per_tick() -> usize {
    1
}

const fn default_arrival_tolerance() -> f64 {
    0.5
}

/// Which urgency policy drives agent decisions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// The most depleted need below its threshold wins.
    #[default]
    LowestNeed,
    /// Fixed-priority behavior tree.
    BehaviorTree,
}

/// Decision configuration shared by both policies.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DecisionConfig {
    /// Active policy (default: `lowest_need`).
    #[serde(default)]
    pub policy: PolicyKind,

    /// Thresholds used by the lowest-need policy.
    #[serde(default)]
    pub resolver: ResolverThresholds,

    /// Thresholds used by the behavior tree.
    #[serde(default)]
    pub behavior: BehaviorThresholds,

    /// Conversation reach for agents outside, in world units
    /// (default: 3.0).
    #[serde(default = "default_conversation_radius")]
    pub conversation_radius: f64,

    /// Need bump applied when a critical need is served (default: 40).
    #[serde(default = "default_critical_bump")]
    pub critical_bump: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            resolver: ResolverThresholds::default(),
            behavior: BehaviorThresholds::default(),
            conversation_radius: default_conversation_radius(),
            critical_bump: default_critical_bump(),
        }
    }
}

const fn default_conversation_radius() -> f64 {
    3.0
}

const fn default_critical_bump() -> f64 {
    40.0
}

/// Urgency thresholds for the lowest-need policy.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ResolverThresholds {
    /// Default: 30.
    #[serde(default = "default_resolver_hunger")]
    pub hunger: f64,
    /// Default: 25.
    #[serde(default = "default_resolver_thirst")]
    pub thirst: f64,
    /// Default: 20.
    #[serde(default = "default_resolver_fatigue")]
    pub fatigue: f64,
    /// Default: 15.
    #[serde(default = "default_resolver_social")]
    pub social: f64,
    /// Default: 10.
    #[serde(default = "default_resolver_diversion")]
    pub diversion: f64,
    /// Default: 40.
    #[serde(default = "default_resolver_health")]
    pub health: f64,
}

impl Default for ResolverThresholds {
    fn default() -> Self {
        Self {
            hunger: default_resolver_hunger(),
            thirst: default_resolver_thirst(),
            fatigue: default_resolver_fatigue(),
            social: default_resolver_social(),
            diversion: default_resolver_diversion(),
            health: default_resolver_health(),
        }
    }
}

const fn default_resolver_hunger() -> f64 {
    30.0
}

const fn default_resolver_thirst() -> f64 {
    25.0
}

const fn default_resolver_fatigue() -> f64 {
    20.0
}

const fn default_resolver_social() -> f64 {
    15.0
}

const fn default_resolver_diversion() -> f64 {
    10.0
}

const fn default_resolver_health() -> f64 {
    40.0
}

/// Critical-need thresholds for the behavior tree.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BehaviorThresholds {
    /// Default: 30.
    #[serde(default = "default_behavior_hunger")]
    pub hunger: f64,
    /// Default: 20.
    #[serde(default = "default_behavior_social")]
    pub social: f64,
    /// Default: 25.
    #[serde(default = "default_behavior_fatigue")]
    pub fatigue: f64,
    /// Default: 20.
    #[serde(default = "default_behavior_energy")]
    pub energy: f64,
    /// Default: 25.
    #[serde(default = "default_behavior_diversion")]
    pub diversion: f64,
}

impl Default for BehaviorThresholds {
    fn default() -> Self {
        Self {
            hunger: default_behavior_hunger(),
            social: default_behavior_social(),
            fatigue: default_behavior_fatigue(),
            energy: default_behavior_energy(),
            diversion: default_behavior_diversion(),
        }
    }
}

const fn default_behavior_hunger() -> f64 {
    30.0
}

const fn default_behavior_social() -> f64 {
    20.0
}

const fn default_behavior_fatigue() -> f64 {
    25.0
}

const fn default_behavior_energy() -> f64 {
    20.0
}

const fn default_behavior_diversion() -> f64 {
    25.0
}

/// Narrative event cadence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EventsConfig {
    /// Ticks between generation attempts (default: 3; 0 disables).
    #[serde(default = "default_interval_ticks")]
    pub interval_ticks: u64,

    /// Chance an attempt actually calls the generator (default: 75).
    #[serde(default = "default_probability_percent")]
    pub probability_percent: u8,

    /// Maximum simultaneously active events (default: 5).
    #[serde(default = "default_max_active")]
    pub max_active: usize,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            interval_ticks: default_interval_ticks(),
            probability_percent: default_probability_percent(),
            max_active: default_max_active(),
        }
    }
}

const fn default_interval_ticks() -> u64 {
    3
}

const fn default_probability_percent() -> u8 {
    75
}

const fn default_max_active() -> usize {
    5
}

/// Persistence cadence.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PersistenceConfig {
    /// Save every agent and building every N ticks (default: 1; 0
    /// disables).
    #[serde(default = "default_save_every_ticks")]
    pub save_every_ticks: u64,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            save_every_ticks: default_save_every_ticks(),
        }
    }
}

const fn default_save_every_ticks() -> u64 {
    1
}

/// Seed town layout.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TownConfig {
    /// Buildings created at startup and on reset.
    #[serde(default)]
    pub buildings: Vec<BuildingSpec>,

    /// Decor created at startup.
    #[serde(default)]
    pub decor: Vec<DecorElement>,
}

/// Seed population.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AgentsConfig {
    /// Number of agents the engine spawns at startup (default: 5).
    #[serde(default = "default_seed_count")]
    pub seed_count: u32,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            seed_count: default_seed_count(),
        }
    }
}

const fn default_seed_count() -> u32 {
    5
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset (default: `info`).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    String::from("info")
}

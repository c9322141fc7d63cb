//! Tunable parameters for the needs model.
//!
//! [`NeedsConfig`] mirrors the `needs` section of `townsfolk-config.yaml`.
//! All decay rates are expressed per in-world minute so that the tick
//! length (`world.minutes_per_tick`) can change without retuning.

use serde::{Deserialize, Serialize};
use townsfolk_types::{Need, Weather};

use crate::error::AgentError;

/// Configuration for need decay and health loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeedsConfig {
    /// Hunger lost per minute (default: 0.15).
    #[serde(default = "default_hunger_decay")]
    pub hunger_decay: f64,

    /// Thirst lost per minute (default: 0.25).
    #[serde(default = "default_thirst_decay")]
    pub thirst_decay: f64,

    /// Fatigue lost per minute before the weather multiplier (default: 0.1).
    #[serde(default = "default_fatigue_decay")]
    pub fatigue_decay: f64,

    /// Social lost per minute (default: 0.05).
    #[serde(default = "default_social_decay")]
    pub social_decay: f64,

    /// Diversion lost per minute (default: 0.1).
    #[serde(default = "default_diversion_decay")]
    pub diversion_decay: f64,

    /// Energy lost per minute before the weather multiplier (default: 0.1).
    #[serde(default = "default_energy_decay")]
    pub energy_decay: f64,

    /// Health lost per minute while any emergency floor is breached
    /// (default: 0.1).
    #[serde(default = "default_health_loss")]
    pub health_loss: f64,

    /// Fatigue below which health suffers (default: 10).
    #[serde(default = "default_fatigue_floor")]
    pub fatigue_floor: f64,

    /// Hunger below which health suffers (default: 5).
    #[serde(default = "default_hunger_floor")]
    pub hunger_floor: f64,

    /// Thirst below which health suffers (default: 5).
    #[serde(default = "default_thirst_floor")]
    pub thirst_floor: f64,

    /// Extra health lost per minute outside in snow (default: 0.2).
    #[serde(default = "default_snow_exposure")]
    pub snow_exposure: f64,

    /// Extra health lost per minute outside in a storm (default: 0.15).
    #[serde(default = "default_storm_exposure")]
    pub storm_exposure: f64,

    /// Fatigue/energy decay multiplier on sunny days (default: 0.9).
    #[serde(default = "default_sunny_multiplier")]
    pub sunny_multiplier: f64,

    /// Fatigue/energy decay multiplier in rain (default: 1.2).
    #[serde(default = "default_rain_multiplier")]
    pub rain_multiplier: f64,

    /// Fatigue/energy decay multiplier in storms (default: 1.5).
    #[serde(default = "default_storm_multiplier")]
    pub storm_multiplier: f64,
}

impl Default for NeedsConfig {
    fn default() -> Self {
        Self {
            hunger_decay: default_hunger_decay(),
            thirst_decay: default_thirst_decay(),
            fatigue_decay: default_fatigue_decay(),
            social_decay: default_social_decay(),
            diversion_decay: default_diversion_decay(),
            energy_decay: default_energy_decay(),
            health_loss: default_health_loss(),
            fatigue_floor: default_fatigue_floor(),
            hunger_floor: default_hunger_floor(),
            thirst_floor: default_thirst_floor(),
            snow_exposure: default_snow_exposure(),
            storm_exposure: default_storm_exposure(),
            sunny_multiplier: default_sunny_multiplier(),
            rain_multiplier: default_rain_multiplier(),
            storm_multiplier: default_storm_multiplier(),
        }
    }
}

impl NeedsConfig {
    /// Base per-minute decay for one need, before weather.
    pub const fn decay_rate(&self, need: Need) -> f64 {
        match need {
            Need::Hunger => self.hunger_decay,
            Need::Thirst => self.thirst_decay,
            Need::Fatigue => self.fatigue_decay,
            Need::Social => self.social_decay,
            Need::Diversion => self.diversion_decay,
            Need::Energy => self.energy_decay,
        }
    }

    /// Weather multiplier applied to fatigue and energy decay.
    pub const fn weather_multiplier(&self, weather: Weather) -> f64 {
        match weather {
            Weather::Sunny => self.sunny_multiplier,
            Weather::Rain => self.rain_multiplier,
            Weather::Storm => self.storm_multiplier,
            Weather::Cloudy | Weather::Snow => 1.0,
        }
    }

    /// Reject negative or non-finite parameters.
    pub fn validate(&self) -> Result<(), AgentError> {
        let params = [
            ("hunger_decay", self.hunger_decay),
            ("thirst_decay", self.thirst_decay),
            ("fatigue_decay", self.fatigue_decay),
            ("social_decay", self.social_decay),
            ("diversion_decay", self.diversion_decay),
            ("energy_decay", self.energy_decay),
            ("health_loss", self.health_loss),
            ("fatigue_floor", self.fatigue_floor),
            ("hunger_floor", self.hunger_floor),
            ("thirst_floor", self.thirst_floor),
            ("snow_exposure", self.snow_exposure),
            ("storm_exposure", self.storm_exposure),
            ("sunny_multiplier", self.sunny_multiplier),
            ("rain_multiplier", self.rain_multiplier),
            ("storm_multiplier", self.storm_multiplier),
        ];
        for (name, value) in params {
            if !value.is_finite() || value < 0.0 {
                return Err(AgentError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

const fn default_hunger_decay() -> f64 {
    0.15
}

const fn default_thirst_decay() -> f64 {
    0.25
}

const fn default_fatigue_decay() -> f64 {
    0.1
}

const fn default_social_decay() -> f64 {
    0.05
}

const fn default_diversion_decay() -> f64 {
    0.1
}

const fn default_energy_decay() -> f64 {
    0.1
}

const fn default_health_loss() -> f64 {
    0.1
}

const fn default_fatigue_floor() -> f64 {
    10.0
}

const fn default_hunger_floor() -> f64 {
    5.0
}

const fn default_thirst_floor() -> f64 {
    5.0
}

const fn default_snow_exposure() -> f64 {
    0.2
}

const fn default_storm_exposure() -> f64 {
    0.15
}

const fn default_sunny_multiplier() -> f64 {
    0.9
}

const fn default_rain_multiplier() -> f64 {
    1.2
}

const fn default_storm_multiplier() -> f64 {
    1.5
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(NeedsConfig::default().validate().is_ok());
    }

    #[test]
    fn thirst_decays_fastest_social_slowest() {
        let config = NeedsConfig::default();
        let rates: Vec<f64> = Need::ALL.iter().map(|n| config.decay_rate(*n)).collect();
        let max = rates.iter().copied().fold(f64::MIN, f64::max);
        let min = rates.iter().copied().fold(f64::MAX, f64::min);
        assert!((config.decay_rate(Need::Thirst) - max).abs() < f64::EPSILON);
        assert!((config.decay_rate(Need::Social) - min).abs() < f64::EPSILON);
    }

    #[test]
    fn negative_rate_rejected() {
        let config = NeedsConfig {
            social_decay: -0.5,
            ..NeedsConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AgentError::InvalidParameter {
                name: "social_decay",
                ..
            })
        ));
    }

    #[test]
    fn storm_multiplier_is_harshest() {
        let config = NeedsConfig::default();
        assert!(config.weather_multiplier(Weather::Storm) > config.weather_multiplier(Weather::Rain));
        assert!(config.weather_multiplier(Weather::Sunny) < config.weather_multiplier(Weather::Cloudy));
    }
}

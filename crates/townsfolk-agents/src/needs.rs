//! Needs model applied to agents each tick.
//!
//! Three independent sources move an agent's needs:
//!
//! - [`decay`] -- time passing lowers every need, and breached emergency
//!   floors or bad weather outdoors erode health
//! - [`replenish_by_activity`] -- whatever the agent is doing raises the
//!   matching needs by a fixed amount per tick
//! - [`satisfy_on_entry`] -- entering a building grants a one-off boost
//!   depending on the building type and the services it offers
//!
//! Happiness is never decayed on its own; [`happiness`] derives it from
//! the need deficits and health after every decay pass.
//!
//! All results are clamped to `[0, 100]` by [`Level`].

use std::collections::BTreeMap;

use rand::Rng;
use townsfolk_types::{Activity, Agent, Building, BuildingType, Level, Need, Needs, Service, Weather};
use tracing::trace;

use crate::config::NeedsConfig;

/// What one call to [`decay`] did to an agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayOutcome {
    /// Health lost this pass (before clamping).
    pub health_lost: f64,
    /// Whether an emergency floor (fatigue, hunger, thirst) was breached.
    pub emergency: bool,
}

/// Lower every need for `minutes` of in-world time.
///
/// Fatigue and energy decay faster in rain and storms and slower on sunny
/// days. Health drops while fatigue, hunger or thirst is below its
/// emergency floor, and further while the agent is outside in snow or a
/// storm. Happiness is recomputed at the end.
pub fn decay(agent: &mut Agent, minutes: u32, weather: Weather, config: &NeedsConfig) -> DecayOutcome {
    let minutes = f64::from(minutes);
    let weather_factor = config.weather_multiplier(weather);

    for need in Need::ALL {
        let mut rate = config.decay_rate(need);
        if matches!(need, Need::Fatigue | Need::Energy) {
            rate *= weather_factor;
        }
        agent.needs.adjust(need, -(rate * minutes));
    }

    let needs = &agent.needs;
    let emergency = needs.fatigue.value() < config.fatigue_floor
        || needs.hunger.value() < config.hunger_floor
        || needs.thirst.value() < config.thirst_floor;

    let mut health_lost = 0.0;
    if emergency {
        health_lost += config.health_loss * minutes;
    }
    if agent.is_outside() {
        match weather {
            Weather::Snow => health_lost += config.snow_exposure * minutes,
            Weather::Storm => health_lost += config.storm_exposure * minutes,
            Weather::Sunny | Weather::Cloudy | Weather::Rain => {}
        }
    }
    agent.health = agent.health.adjusted(-health_lost);
    agent.happiness = happiness(&agent.needs, agent.health);
    if health_lost > 0.0 {
        trace!(agent_id = %agent.id, health_lost, emergency, health = %agent.health, "Health eroded");
    }

    DecayOutcome {
        health_lost,
        emergency,
    }
}

/// Weighted happiness from need and health deficits.
///
/// Starts from 100 and subtracts 20% of the hunger, social and health
/// deficits, 15% of thirst and fatigue, and 10% of diversion. Energy does
/// not count.
pub fn happiness(needs: &Needs, health: Level) -> Level {
    let deficit = |level: Level| 100.0 - level.value();
    Level::new(
        100.0
            - deficit(needs.hunger) * 0.2
            - deficit(needs.thirst) * 0.15
            - deficit(needs.fatigue) * 0.15
            - deficit(needs.social) * 0.2
            - deficit(needs.diversion) * 0.1
            - deficit(health) * 0.2,
    )
}

/// Per-tick need gains while engaged in `activity`.
pub const fn activity_gains(activity: Activity) -> &'static [(Need, f64)] {
    match activity {
        Activity::Meal => &[(Need::Hunger, 15.0)],
        Activity::Rest => &[(Need::Fatigue, 20.0), (Need::Energy, 10.0)],
        Activity::Social => &[(Need::Social, 20.0), (Need::Diversion, 5.0)],
        Activity::Leisure => &[(Need::Diversion, 20.0), (Need::Energy, 5.0)],
        Activity::Work => &[(Need::Social, 3.0), (Need::Energy, -3.0)],
    }
}

/// Raise the needs matching the agent's current activity by one tick's
/// worth.
pub fn replenish_by_activity(agent: &mut Agent) {
    for (need, amount) in activity_gains(agent.status.activity) {
        agent.needs.adjust(*need, *amount);
    }
}

/// One-off effects of entering a building.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryEffect {
    /// Need deltas.
    pub needs: BTreeMap<Need, f64>,
    /// Health delta.
    pub health: f64,
}

impl EntryEffect {
    /// Whether entering changes nothing.
    pub fn is_empty(&self) -> bool {
        self.needs.is_empty() && self.health.abs() < f64::EPSILON
    }

    fn add(&mut self, need: Need, amount: f64) {
        *self.needs.entry(need).or_insert(0.0) += amount;
    }
}

/// Needs boosted by a building type on entry.
const fn type_effect(building_type: BuildingType) -> &'static [(Need, f64)] {
    match building_type {
        BuildingType::Residence => &[(Need::Fatigue, 50.0), (Need::Energy, 40.0), (Need::Hunger, 25.0)],
        BuildingType::Tavern => &[(Need::Thirst, 70.0), (Need::Social, 45.0), (Need::Diversion, 25.0)],
        BuildingType::Market => &[(Need::Social, 20.0), (Need::Diversion, 15.0)],
        BuildingType::Library => &[(Need::Diversion, 40.0)],
        BuildingType::Forge
        | BuildingType::Temple
        | BuildingType::Barracks
        | BuildingType::Shop
        | BuildingType::Restaurant
        | BuildingType::Park
        | BuildingType::Office
        | BuildingType::Factory
        | BuildingType::Bar => &[],
    }
}

const MEAL_GAINS: &[(Need, f64)] = &[(Need::Hunger, 50.0)];
const DRINK_GAINS: &[(Need, f64)] = &[(Need::Thirst, 60.0)];
const REST_GAINS: &[(Need, f64)] = &[(Need::Fatigue, 40.0), (Need::Energy, 30.0)];

/// Effects of a generic service, keyed by the need it primarily serves.
const fn service_effect(service: Service) -> Option<(Need, &'static [(Need, f64)])> {
    match service {
        Service::Meal => Some((Need::Hunger, MEAL_GAINS)),
        Service::Drink => Some((Need::Thirst, DRINK_GAINS)),
        Service::Rest => Some((Need::Fatigue, REST_GAINS)),
        Service::Commerce
        | Service::Training
        | Service::Healing
        | Service::Worship
        | Service::Craft
        | Service::Protection
        | Service::Diversion => None,
    }
}

/// Health restored by a healing service.
const HEALING_GAIN: f64 = 70.0;

/// Compute the effects of entering `building`, without applying them.
///
/// The type-specific rule applies first. A generic service effect is
/// skipped when the type rule already boosted the need it primarily
/// serves, so a tavern offering drinks grants thirst once.
pub fn entry_effect(building: &Building) -> EntryEffect {
    let mut effect = EntryEffect::default();
    let by_type = type_effect(building.building_type);
    for (need, amount) in by_type {
        effect.add(*need, *amount);
    }

    for service in &building.services {
        if *service == Service::Healing {
            effect.health += HEALING_GAIN;
            continue;
        }
        let Some((primary, gains)) = service_effect(*service) else {
            continue;
        };
        if by_type.iter().any(|(need, _)| *need == primary) {
            continue;
        }
        for (need, amount) in gains {
            effect.add(*need, *amount);
        }
    }
    effect
}

/// Apply the entry effects of `building` to `agent` and return them.
pub fn satisfy_on_entry(agent: &mut Agent, building: &Building) -> EntryEffect {
    let effect = entry_effect(building);
    for (need, amount) in &effect.needs {
        agent.needs.adjust(*need, *amount);
    }
    agent.health = agent.health.adjusted(effect.health);
    effect
}

/// Starting needs for a freshly created agent: comfortably satisfied but
/// not full (hunger and energy 70-90, the rest 60-90).
pub fn random_needs<R: Rng + ?Sized>(rng: &mut R) -> Needs {
    Needs {
        hunger: Level::new(rng.random_range(70.0..90.0)),
        thirst: Level::new(rng.random_range(60.0..90.0)),
        fatigue: Level::new(rng.random_range(60.0..90.0)),
        social: Level::new(rng.random_range(60.0..90.0)),
        diversion: Level::new(rng.random_range(60.0..90.0)),
        energy: Level::new(rng.random_range(70.0..90.0)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use townsfolk_types::{BuildingId, Personality, Position, Profession, Whereabouts};

    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn make_agent(level: f64) -> Agent {
        Agent::new(
            "Tomas",
            40,
            Profession::Blacksmith,
            Personality::Strict,
            Needs::uniform(level),
            Position::new(0.0, 0.0),
        )
    }

    fn put_inside(agent: &mut Agent) {
        agent.whereabouts = Whereabouts::Inside {
            building_id: BuildingId::new(),
            position: agent.position(),
        };
    }

    #[test]
    fn decay_lowers_each_need_by_rate() {
        let mut agent = make_agent(80.0);
        let config = NeedsConfig::default();
        let _ = decay(&mut agent, 10, Weather::Cloudy, &config);
        assert!(approx(agent.needs.hunger.value(), 78.5));
        assert!(approx(agent.needs.thirst.value(), 77.5));
        assert!(approx(agent.needs.fatigue.value(), 79.0));
        assert!(approx(agent.needs.social.value(), 79.5));
        assert!(approx(agent.needs.diversion.value(), 79.0));
        assert!(approx(agent.needs.energy.value(), 79.0));
    }

    #[test]
    fn weather_scales_fatigue_decay() {
        let config = NeedsConfig::default();
        let mut sunny = make_agent(80.0);
        let mut storm = make_agent(80.0);
        let _ = decay(&mut sunny, 10, Weather::Sunny, &config);
        let _ = decay(&mut storm, 10, Weather::Storm, &config);
        assert!(approx(sunny.needs.fatigue.value(), 79.1));
        assert!(approx(storm.needs.fatigue.value(), 78.5));
        // Hunger is weather-independent.
        assert!(approx(sunny.needs.hunger.value(), storm.needs.hunger.value()));
    }

    #[test]
    fn decay_floors_at_zero() {
        let mut agent = make_agent(1.0);
        let _ = decay(&mut agent, 10_000, Weather::Storm, &NeedsConfig::default());
        for (_, level) in agent.needs.iter() {
            assert!(approx(level.value(), 0.0));
        }
        assert!(approx(agent.health.value(), 0.0));
        assert!(agent.happiness.value() >= 0.0);
    }

    #[test]
    fn healthy_agent_indoors_keeps_health() {
        let mut agent = make_agent(80.0);
        put_inside(&mut agent);
        let outcome = decay(&mut agent, 5, Weather::Snow, &NeedsConfig::default());
        assert!(!outcome.emergency);
        assert!(approx(outcome.health_lost, 0.0));
        assert!(approx(agent.health.value(), 100.0));
    }

    #[test]
    fn starving_agent_loses_health() {
        let mut agent = make_agent(80.0);
        put_inside(&mut agent);
        agent.needs.set(Need::Hunger, 2.0);
        let outcome = decay(&mut agent, 10, Weather::Cloudy, &NeedsConfig::default());
        assert!(outcome.emergency);
        assert!(approx(agent.health.value(), 99.0));
    }

    #[test]
    fn snow_hurts_agents_outside() {
        let mut agent = make_agent(80.0);
        let outcome = decay(&mut agent, 10, Weather::Snow, &NeedsConfig::default());
        assert!(approx(outcome.health_lost, 2.0));
        assert!(approx(agent.health.value(), 98.0));
    }

    #[test]
    fn happiness_formula() {
        let needs = Needs::uniform(100.0);
        assert!(approx(happiness(&needs, Level::FULL).value(), 100.0));

        let mut needs = Needs::uniform(100.0);
        needs.set(Need::Hunger, 50.0);
        // 100 - 50 * 0.2
        assert!(approx(happiness(&needs, Level::FULL).value(), 90.0));

        let empty = Needs::uniform(0.0);
        // 100 - 100 * (0.2 + 0.15 + 0.15 + 0.2 + 0.1 + 0.2) = 0
        assert!(approx(happiness(&empty, Level::EMPTY).value(), 0.0));
    }

    #[test]
    fn rest_replenishes_fatigue_and_energy() {
        let mut agent = make_agent(50.0);
        agent.status.activity = Activity::Rest;
        replenish_by_activity(&mut agent);
        assert!(approx(agent.needs.fatigue.value(), 70.0));
        assert!(approx(agent.needs.energy.value(), 60.0));
        assert!(approx(agent.needs.hunger.value(), 50.0));
    }

    #[test]
    fn work_costs_energy() {
        let mut agent = make_agent(50.0);
        agent.status.activity = Activity::Work;
        replenish_by_activity(&mut agent);
        assert!(approx(agent.needs.social.value(), 53.0));
        assert!(approx(agent.needs.energy.value(), 47.0));
    }

    #[test]
    fn replenish_clamps_at_hundred() {
        let mut agent = make_agent(95.0);
        agent.status.activity = Activity::Social;
        replenish_by_activity(&mut agent);
        assert!(approx(agent.needs.social.value(), 100.0));
    }

    #[test]
    fn tavern_does_not_double_count_drink() {
        let tavern = Building::new("Tavern", BuildingType::Tavern, Position::default(), 20)
            .with_services([Service::Meal, Service::Drink, Service::Rest]);
        let effect = entry_effect(&tavern);
        assert!(approx(effect.needs[&Need::Thirst], 70.0));
        assert!(approx(effect.needs[&Need::Social], 45.0));
        assert!(approx(effect.needs[&Need::Diversion], 25.0));
        assert!(approx(effect.needs[&Need::Hunger], 50.0));
        assert!(approx(effect.needs[&Need::Fatigue], 40.0));
        assert!(approx(effect.needs[&Need::Energy], 30.0));
    }

    #[test]
    fn residence_rest_service_is_covered() {
        let house = Building::new("House", BuildingType::Residence, Position::default(), 5)
            .with_services([Service::Rest]);
        let effect = entry_effect(&house);
        assert!(approx(effect.needs[&Need::Fatigue], 50.0));
        assert!(approx(effect.needs[&Need::Energy], 40.0));
        assert!(approx(effect.needs[&Need::Hunger], 25.0));
    }

    #[test]
    fn temple_heals() {
        let temple = Building::new("Temple", BuildingType::Temple, Position::default(), 30)
            .with_services([Service::Worship, Service::Healing]);
        let mut agent = make_agent(50.0);
        agent.health = Level::new(20.0);
        let effect = satisfy_on_entry(&mut agent, &temple);
        assert!(effect.needs.is_empty());
        assert!(approx(agent.health.value(), 90.0));
    }

    #[test]
    fn forge_has_no_effect() {
        let forge = Building::new("Forge", BuildingType::Forge, Position::default(), 5)
            .with_services([Service::Craft, Service::Commerce]);
        assert!(entry_effect(&forge).is_empty());
    }

    #[test]
    fn random_needs_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let needs = random_needs(&mut rng);
            assert!(needs.hunger.value() >= 70.0 && needs.hunger.value() < 90.0);
            assert!(needs.social.value() >= 60.0 && needs.social.value() < 90.0);
        }
    }
}

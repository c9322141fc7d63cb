//! Lowest-need decision resolver.
//!
//! Among the drives currently below their thresholds, the one with the
//! lowest absolute value is the most urgent; ties go to the drive declared
//! first in [`Drive::ALL`]. The agent then heads for the nearest open
//! building serving that drive, trying further ones when the nearest has no
//! reachable free cell.

use townsfolk_types::{Activity, Agent, Building, BuildingType, Personality, Service};
use tracing::debug;

use crate::config::ResolverThresholds;
use crate::decision::{DecisionContext, DecisionOutcome, DecisionPolicy, head_to, started};

/// Something an agent can run low on.
///
/// Five of these are needs; health is tracked separately on the agent but
/// competes for urgency on equal terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drive {
    /// Satiety.
    Hunger,
    /// Hydration.
    Thirst,
    /// Restedness.
    Fatigue,
    /// Social contact.
    Social,
    /// Entertainment.
    Diversion,
    /// Physical health.
    Health,
}

impl Drive {
    /// Every drive, in tie-break order.
    pub const ALL: [Self; 6] = [
        Self::Hunger,
        Self::Thirst,
        Self::Fatigue,
        Self::Social,
        Self::Diversion,
        Self::Health,
    ];

    /// The agent's current level of this drive.
    pub fn level(self, agent: &Agent) -> f64 {
        let needs = &agent.needs;
        match self {
            Self::Hunger => needs.hunger.value(),
            Self::Thirst => needs.thirst.value(),
            Self::Fatigue => needs.fatigue.value(),
            Self::Social => needs.social.value(),
            Self::Diversion => needs.diversion.value(),
            Self::Health => agent.health.value(),
        }
    }

    /// Urgency threshold for this drive.
    pub const fn threshold(self, thresholds: &ResolverThresholds) -> f64 {
        match self {
            Self::Hunger => thresholds.hunger,
            Self::Thirst => thresholds.thirst,
            Self::Fatigue => thresholds.fatigue,
            Self::Social => thresholds.social,
            Self::Diversion => thresholds.diversion,
            Self::Health => thresholds.health,
        }
    }

    /// Activity taken up while satisfying this drive.
    pub const fn activity(self) -> Activity {
        match self {
            Self::Hunger | Self::Thirst => Activity::Meal,
            Self::Fatigue | Self::Health => Activity::Rest,
            Self::Social => Activity::Social,
            Self::Diversion => Activity::Leisure,
        }
    }

    /// Where an agent with `personality` goes to satisfy this drive.
    pub const fn target(self, personality: Personality) -> Target {
        match self {
            Self::Hunger => Target::Service(Service::Meal),
            Self::Thirst | Self::Social => Target::Service(Service::Drink),
            Self::Fatigue => Target::Service(Service::Rest),
            Self::Health => Target::Service(Service::Healing),
            Self::Diversion if personality.prefers_quiet_diversion() => Target::Type(BuildingType::Library),
            Self::Diversion => Target::Type(BuildingType::Tavern),
        }
    }
}

impl core::fmt::Display for Drive {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match self {
            Self::Hunger => "hunger",
            Self::Thirst => "thirst",
            Self::Fatigue => "fatigue",
            Self::Social => "social",
            Self::Diversion => "diversion",
            Self::Health => "health",
        };
        f.write_str(name)
    }
}

/// A kind of building that satisfies a drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// Any building offering this service.
    Service(Service),
    /// Any building of this type.
    Type(BuildingType),
}

impl Target {
    /// Whether `building` qualifies.
    pub fn matches(self, building: &Building) -> bool {
        match self {
            Self::Service(service) => building.offers(service),
            Self::Type(building_type) => building.building_type == building_type,
        }
    }
}

/// The most urgent drive below its threshold, with its level.
pub fn most_urgent(agent: &Agent, thresholds: &ResolverThresholds) -> Option<(Drive, f64)> {
    let mut best: Option<(Drive, f64)> = None;
    for drive in Drive::ALL {
        let level = drive.level(agent);
        if level >= drive.threshold(thresholds) {
            continue;
        }
        if best.is_none_or(|(_, lowest)| level < lowest) {
            best = Some((drive, level));
        }
    }
    best
}

/// The default urgency policy: lowest value below threshold wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct LowestNeedPolicy {
    thresholds: ResolverThresholds,
}

impl LowestNeedPolicy {
    /// Create a resolver with the given thresholds.
    pub const fn new(thresholds: ResolverThresholds) -> Self {
        Self { thresholds }
    }
}

impl DecisionPolicy for LowestNeedPolicy {
    fn name(&self) -> &'static str {
        "lowest_need"
    }

    fn decide(&self, agent: &mut Agent, ctx: &mut DecisionContext<'_>) -> DecisionOutcome {
        let Some((drive, level)) = most_urgent(agent, &self.thresholds) else {
            return DecisionOutcome::Idle;
        };
        let target = drive.target(agent.personality);

        let current = agent.building_id().and_then(|id| ctx.buildings.get(id));
        if current.is_some_and(|b| target.matches(b)) {
            agent.status.activity = drive.activity();
            return DecisionOutcome::Stayed;
        }

        let hour = ctx.clock.hour();
        let candidates: Vec<_> = ctx
            .buildings
            .by_distance(agent.position(), |b| target.matches(b) && b.is_open(hour))
            .into_iter()
            .map(|b| b.id)
            .collect();

        for building_id in candidates {
            match head_to(agent, building_id, None, ctx) {
                Ok(start) => {
                    agent.status.activity = drive.activity();
                    debug!(
                        agent_id = %agent.id,
                        drive = %drive,
                        level,
                        building_id = %building_id,
                        "Decided to satisfy need"
                    );
                    agent.record(format!("{} decided to satisfy need {drive}.", agent.name));
                    return started(start);
                }
                Err(e) => {
                    debug!(agent_id = %agent.id, building_id = %building_id, error = %e, "Building unreachable");
                }
            }
        }

        debug!(agent_id = %agent.id, drive = %drive, level, "No reachable building for urgent need");
        DecisionOutcome::Failed
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use townsfolk_types::{Need, Position, Whereabouts};

    use super::*;
    use crate::decision::fixtures::{make_agent, make_town};

    fn make_thresholds() -> ResolverThresholds {
        ResolverThresholds::default()
    }

    #[test]
    fn nothing_urgent_is_idle() {
        let mut town = make_town();
        let mut agent = make_agent("Ada", Position::default());
        let outcome = LowestNeedPolicy::default().decide(&mut agent, &mut town.context());
        assert_eq!(outcome, DecisionOutcome::Idle);
        assert!(town.movement.is_empty());
    }

    #[test]
    fn hungry_agent_heads_to_nearest_meal() {
        let mut town = make_town();
        let tavern = town.building_named("Tavern");
        let mut agent = make_agent("Ada", Position::default());
        agent.needs.set(Need::Hunger, 10.0);

        let outcome = LowestNeedPolicy::default().decide(&mut agent, &mut town.context());
        assert_eq!(outcome, DecisionOutcome::Moving);
        assert!(town.movement.is_moving(agent.id));
        assert_eq!(agent.status.target_building, Some(tavern));
        assert_eq!(agent.status.activity, Activity::Meal);
        assert!(agent.last_entry().unwrap().description.contains("satisfy need hunger"));
    }

    #[test]
    fn lowest_value_wins_over_declaration_order() {
        let mut agent = make_agent("Ada", Position::default());
        agent.needs.set(Need::Hunger, 20.0);
        agent.needs.set(Need::Diversion, 5.0);
        let (drive, _) = most_urgent(&agent, &make_thresholds()).unwrap();
        assert_eq!(drive, Drive::Diversion);
    }

    #[test]
    fn ties_go_to_first_declared() {
        let mut agent = make_agent("Ada", Position::default());
        agent.needs.set(Need::Thirst, 5.0);
        agent.needs.set(Need::Social, 5.0);
        let (drive, _) = most_urgent(&agent, &make_thresholds()).unwrap();
        assert_eq!(drive, Drive::Thirst);
    }

    #[test]
    fn health_competes_with_needs() {
        let mut agent = make_agent("Ada", Position::default());
        agent.needs.set(Need::Hunger, 25.0);
        agent.health = townsfolk_types::Level::new(12.0);
        let (drive, level) = most_urgent(&agent, &make_thresholds()).unwrap();
        assert_eq!(drive, Drive::Health);
        assert!((level - 12.0).abs() < 1e-9);
        assert_eq!(drive.target(agent.personality), Target::Service(Service::Healing));
    }

    #[test]
    fn diversion_target_depends_on_personality() {
        assert_eq!(
            Drive::Diversion.target(Personality::Wise),
            Target::Type(BuildingType::Library)
        );
        assert_eq!(
            Drive::Diversion.target(Personality::Jovial),
            Target::Type(BuildingType::Tavern)
        );
    }

    #[test]
    fn closed_buildings_are_skipped() {
        let mut town = make_town();
        town.clock = crate::clock::WorldClock::from_parts(1, 5, 0, townsfolk_types::Weather::Sunny).unwrap();
        let far_inn = town.building_named("Far Inn");
        let mut agent = make_agent("Ada", Position::default());
        agent.needs.set(Need::Thirst, 3.0);

        let outcome = LowestNeedPolicy::default().decide(&mut agent, &mut town.context());
        assert_eq!(outcome, DecisionOutcome::Moving);
        assert_eq!(agent.status.target_building, Some(far_inn));
    }

    #[test]
    fn already_inside_matching_building_stays() {
        let mut town = make_town();
        let tavern = town.building_named("Tavern");
        let mut agent = make_agent("Ada", Position::new(9.0, 9.0));
        town.buildings.add_occupant(tavern, agent.id).unwrap();
        agent.whereabouts = Whereabouts::Inside {
            building_id: tavern,
            position: Position::new(9.0, 9.0),
        };
        agent.needs.set(Need::Thirst, 3.0);

        let outcome = LowestNeedPolicy::default().decide(&mut agent, &mut town.context());
        assert_eq!(outcome, DecisionOutcome::Stayed);
        assert!(town.movement.is_empty());
        assert_eq!(agent.building_id(), Some(tavern));
    }

    #[test]
    fn no_matching_building_fails() {
        let mut town = make_town();
        let mut agent = make_agent("Ada", Position::default());
        agent.personality = Personality::Wise;
        agent.needs.set(Need::Diversion, 1.0);
        let library = town.building_named("Library");
        let _ = town.buildings.remove(library);

        let outcome = LowestNeedPolicy::default().decide(&mut agent, &mut town.context());
        assert_eq!(outcome, DecisionOutcome::Failed);
        assert!(agent.history.is_empty());
    }
}

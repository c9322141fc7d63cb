//! Urgency policy seam.
//!
//! During phase (d) of the tick every agent that is not travelling is
//! handed to a [`DecisionPolicy`], which may start a movement, adjust the
//! agent's activity and needs in place, or do nothing. Two policies ship:
//!
//! - [`LowestNeedPolicy`] (default) -- the need with the lowest value among
//!   those below their thresholds wins
//! - [`BehaviorTreePolicy`] -- a fixed-priority tree: event reaction,
//!   critical needs in declared order, schedule and social activity,
//!   fallback errand
//!
//! The choice is made once, from [`DecisionConfig::policy`], by
//! [`policy_for`].
//!
//! [`LowestNeedPolicy`]: crate::resolver::LowestNeedPolicy
//! [`BehaviorTreePolicy`]: crate::behavior::BehaviorTreePolicy

use std::collections::BTreeMap;

use townsfolk_types::{Agent, AgentId, BuildingId};
use townsfolk_world::{BuildingRegistry, PathGrid};

use crate::behavior::BehaviorTreePolicy;
use crate::clock::WorldClock;
use crate::config::{DecisionConfig, PolicyKind};
use crate::events::EventBook;
use crate::movement::{MovementError, MovementRequest, MovementStart, MovementTracker, NeedBump};
use crate::narrative::NarrativeRequest;
use crate::resolver::LowestNeedPolicy;

/// Errors raised while acting on a decision.
///
/// These never abort a tick; the agent simply stays put and is evaluated
/// again next tick.
#[derive(Debug, thiserror::Error)]
pub enum DecisionError {
    /// The chosen building does not exist.
    #[error("building {0} not found")]
    UnknownBuilding(BuildingId),

    /// Every cell around the building is blocked.
    #[error("no free cell next to building {building}")]
    NoFreeCell {
        /// The unreachable building.
        building: BuildingId,
    },

    /// Pathfinding to the building failed.
    #[error(transparent)]
    Movement(#[from] MovementError),
}

/// What a policy did with one agent this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionOutcome {
    /// Nothing was urgent and nothing was done.
    Idle,
    /// The agent is already where its most urgent need is served.
    Stayed,
    /// A movement was started.
    Moving,
    /// The agent acted in place (talked, reacted, consumed a service).
    Acted,
    /// Something was urgent but no building could be reached.
    Failed,
}

/// Everything a policy may read or touch while deciding for one agent.
///
/// The deciding agent is passed separately and is absent from `others`.
pub struct DecisionContext<'a> {
    /// Current world time.
    pub clock: &'a WorldClock,
    /// Building arena.
    pub buildings: &'a mut BuildingRegistry,
    /// Walkability grid.
    pub grid: &'a PathGrid,
    /// In-flight movements.
    pub movement: &'a mut MovementTracker,
    /// Every other agent.
    pub others: &'a BTreeMap<AgentId, Agent>,
    /// Running narrative events.
    pub events: &'a mut EventBook,
    /// Narrative generation requests queued by this tick.
    pub narrative: &'a mut Vec<NarrativeRequest>,
    /// Thresholds and tuning.
    pub config: &'a DecisionConfig,
}

/// A strategy deciding what a stationary agent does next.
pub trait DecisionPolicy: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Decide for `agent`, mutating it and the world through `ctx`.
    fn decide(&self, agent: &mut Agent, ctx: &mut DecisionContext<'_>) -> DecisionOutcome;
}

/// A policy that never acts.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdlePolicy;

impl DecisionPolicy for IdlePolicy {
    fn name(&self) -> &'static str {
        "idle"
    }

    fn decide(&self, _agent: &mut Agent, _ctx: &mut DecisionContext<'_>) -> DecisionOutcome {
        DecisionOutcome::Idle
    }
}

/// Build the policy selected by `config.policy`.
pub fn policy_for(config: &DecisionConfig) -> Box<dyn DecisionPolicy> {
    match config.policy {
        PolicyKind::LowestNeed => Box::new(LowestNeedPolicy::new(config.resolver)),
        PolicyKind::BehaviorTree => Box::new(BehaviorTreePolicy::new(config)),
    }
}

/// Send `agent` to a free cell next to `building_id`, entering the
/// building on arrival and applying `bump` once inside.
pub(crate) fn head_to(
    agent: &mut Agent,
    building_id: BuildingId,
    bump: Option<NeedBump>,
    ctx: &mut DecisionContext<'_>,
) -> Result<MovementStart, DecisionError> {
    let building = ctx
        .buildings
        .get(building_id)
        .ok_or(DecisionError::UnknownBuilding(building_id))?;
    let cell = ctx
        .grid
        .free_cell_near_building(building, agent.position())
        .ok_or(DecisionError::NoFreeCell { building: building_id })?;

    let mut request = MovementRequest::to(cell).entering(building_id);
    if let Some(bump) = bump {
        request = request.with_bump(bump);
    }
    Ok(ctx
        .movement
        .start_movement(agent, request, ctx.grid, ctx.buildings)?)
}

/// Map a successful start to the outcome reported by policies.
pub(crate) const fn started(start: MovementStart) -> DecisionOutcome {
    match start {
        MovementStart::Started { .. } => DecisionOutcome::Moving,
        MovementStart::AlreadyThere => DecisionOutcome::Acted,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod fixtures {
    //! Small town shared by the policy tests.

    use townsfolk_types::{Building, BuildingType, Needs, Personality, Position, Profession, Service, Weather};
    use townsfolk_world::{DecorRegistry, GridConfig};

    use super::*;
    use crate::config::MovementConfig;

    pub(crate) struct Town {
        pub clock: WorldClock,
        pub buildings: BuildingRegistry,
        pub grid: PathGrid,
        pub movement: MovementTracker,
        pub others: BTreeMap<AgentId, Agent>,
        pub events: EventBook,
        pub narrative: Vec<NarrativeRequest>,
        pub config: DecisionConfig,
    }

    impl Town {
        pub(crate) fn context(&mut self) -> DecisionContext<'_> {
            DecisionContext {
                clock: &self.clock,
                buildings: &mut self.buildings,
                grid: &self.grid,
                movement: &mut self.movement,
                others: &self.others,
                events: &mut self.events,
                narrative: &mut self.narrative,
                config: &self.config,
            }
        }

        pub(crate) fn building_named(&self, name: &str) -> BuildingId {
            self.buildings
                .get_buildings()
                .find(|b| b.name == name)
                .map(|b| b.id)
                .unwrap()
        }
    }

    /// Tavern at (10,10), far inn at (-20,-20), library at (5,-5), market
    /// at (15,15), temple at (-5,-10), training yard at (0,15).
    pub(crate) fn make_town() -> Town {
        let buildings = BuildingRegistry::from_buildings([
            Building::new("Tavern", BuildingType::Tavern, Position::new(10.0, 10.0), 20)
                .with_hours(10, 2)
                .with_services([Service::Meal, Service::Drink, Service::Rest]),
            Building::new("Far Inn", BuildingType::Tavern, Position::new(-20.0, -20.0), 20)
                .with_services([Service::Meal, Service::Drink]),
            Building::new("Library", BuildingType::Library, Position::new(5.0, -5.0), 15)
                .with_services([Service::Training, Service::Rest]),
            Building::new("Market", BuildingType::Market, Position::new(15.0, 15.0), 50)
                .with_services([Service::Commerce, Service::Meal]),
            Building::new("Temple", BuildingType::Temple, Position::new(-5.0, -10.0), 30)
                .with_services([Service::Healing]),
            Building::new("Yard", BuildingType::Park, Position::new(0.0, 15.0), 30)
                .with_services([Service::Training]),
        ]);
        let config = GridConfig {
            width: 60,
            height: 60,
            offset_x: 30,
            offset_y: 30,
            ..GridConfig::default()
        };
        let grid = PathGrid::build(config, &buildings, &DecorRegistry::new()).unwrap();
        Town {
            clock: WorldClock::from_parts(1, 12, 0, Weather::Sunny).unwrap(),
            buildings,
            grid,
            movement: MovementTracker::new(&MovementConfig::default()),
            others: BTreeMap::new(),
            events: EventBook::new(5),
            narrative: Vec::new(),
            config: DecisionConfig::default(),
        }
    }

    pub(crate) fn make_agent(name: &str, position: Position) -> Agent {
        Agent::new(
            name,
            30,
            Profession::Farmer,
            Personality::Friendly,
            Needs::uniform(70.0),
            position,
        )
    }
}

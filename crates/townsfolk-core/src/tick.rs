//! The simulation and its tick.
//!
//! [`Simulation`] owns every arena (agents, buildings, decor), the grid, the
//! movement tracker, the event book and the narrative bridge. Nothing is
//! global; the scheduler holds the simulation behind a mutex and calls
//! [`Simulation::run_tick`] on its own cadence.
//!
//! Each tick runs, in order:
//!
//! 0. **Narrative intake** -- fold finished generation calls (dialogue,
//!    reactions, new events, resolutions) into histories and the event book.
//! 1. **Clock** (a) -- advance in-world time, re-rolling weather per day.
//! 2. **Needs** (b) -- decay every agent, then replenish stationary agents
//!    according to their activity.
//! 3. **Movement** (c) -- step every traveller and process the arrivals.
//! 4. **Decisions** (d) -- run the urgency policy for every stationary agent,
//!    then process arrivals it produced in place.
//! 5. **Event generation** (e) -- on the configured interval, roll for a new
//!    narrative event.
//! 6. **Event impacts** (f) -- apply due impact slices and close ended events.
//! 7. **Persist** -- save agents and buildings on the configured cadence.
//!
//! Arrivals are an explicit queue drained at steps 3 and 4, so an agent
//! never enters a building outside those points.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use townsfolk_agents::{decay, replenish_by_activity};
use townsfolk_types::{Agent, AgentId, Building, BuildingId, DecorElement, Level, Need, Whereabouts};
use townsfolk_world::{BuildingRegistry, DecorRegistry, PathGrid, WorldError};
use tracing::{debug, info, warn};

use crate::clock::{ClockError, WorldClock};
use crate::config::SimulationConfig;
use crate::decision::{DecisionContext, DecisionOutcome, DecisionPolicy, policy_for};
use crate::events::{EventBook, parse_event_payload};
use crate::movement::{ArrivalOutcome, MovementTracker, handle_arrival};
use crate::narrative::{NarrativeBridge, NarrativeGenerator, NarrativeOutcome, NarrativeRequest};
use crate::persistence::{Persistence, PersistenceError};

/// Health an agent is left with by [`Simulation::simulate_health_emergency`].
const EMERGENCY_HEALTH: f64 = 10.0;

/// Hunger an agent is left with by [`Simulation::simulate_hunger`].
const STARVING_HUNGER: f64 = 5.0;

/// Errors raised by the simulation.
#[derive(Debug, thiserror::Error)]
pub enum SimulationError {
    /// The clock could not advance or start.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The grid could not be built.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// Loading saved state failed.
    #[error("persistence error: {source}")]
    Persistence {
        /// The underlying persistence error.
        #[from]
        source: PersistenceError,
    },

    /// No agent with this id exists.
    #[error("agent {0} not found")]
    UnknownAgent(AgentId),
}

/// What one tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickSummary {
    /// Tick number, starting at 1.
    pub tick: u64,
    /// World time after the tick.
    pub clock: WorldClock,
    /// Agents that reached a destination.
    pub arrivals: usize,
    /// Arrivals that entered their building.
    pub entries: usize,
    /// Arrivals turned away (closed, full, gone).
    pub failed_entries: usize,
    /// Movements started by decisions.
    pub movements_started: usize,
    /// Decision outcome per stationary agent.
    pub decisions: BTreeMap<AgentId, DecisionOutcome>,
    /// Events registered from generated payloads.
    pub events_registered: usize,
    /// Events that ran their course.
    pub events_ended: usize,
}

impl TickSummary {
    fn new(tick: u64, clock: WorldClock) -> Self {
        Self {
            tick,
            clock,
            arrivals: 0,
            entries: 0,
            failed_entries: 0,
            movements_started: 0,
            decisions: BTreeMap::new(),
            events_registered: 0,
            events_ended: 0,
        }
    }
}

/// Counts from one arrival-queue drain.
#[derive(Debug, Clone, Copy, Default)]
struct ArrivalTally {
    arrivals: usize,
    entries: usize,
    failed: usize,
}

/// The whole simulated town.
pub struct Simulation {
    config: SimulationConfig,
    tick: u64,
    clock: WorldClock,
    rng: StdRng,
    buildings: BuildingRegistry,
    decor: DecorRegistry,
    configured_buildings: BuildingRegistry,
    configured_decor: DecorRegistry,
    grid: PathGrid,
    movement: MovementTracker,
    agents: BTreeMap<AgentId, Agent>,
    events: EventBook,
    narrative: NarrativeBridge,
    policy: Box<dyn DecisionPolicy>,
    persistence: Arc<dyn Persistence>,
}

impl core::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Simulation")
            .field("tick", &self.tick)
            .field("clock", &self.clock)
            .field("agents", &self.agents.len())
            .field("buildings", &self.buildings.len())
            .field("policy", &self.policy.name())
            .finish_non_exhaustive()
    }
}

impl Simulation {
    /// Build the town described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError`] if the start time or the grid
    /// configuration is invalid.
    pub fn new(
        config: SimulationConfig,
        narrator: Arc<dyn NarrativeGenerator>,
        persistence: Arc<dyn Persistence>,
    ) -> Result<Self, SimulationError> {
        let clock = WorldClock::new(&config.world)?;
        let buildings = BuildingRegistry::from_specs(&config.town.buildings);
        let decor = DecorRegistry::from_elements(config.town.decor.iter().cloned());
        let grid = PathGrid::build(config.grid.clone(), &buildings, &decor)?;
        let policy = policy_for(&config.decision);
        info!(
            town = %config.world.name,
            policy = policy.name(),
            buildings = buildings.len(),
            decor = decor.len(),
            blocked_cells = grid.blocked_count(),
            "Simulation created"
        );
        Ok(Self {
            tick: 0,
            clock,
            rng: StdRng::seed_from_u64(config.world.seed),
            movement: MovementTracker::new(&config.movement),
            events: EventBook::new(config.events.max_active),
            narrative: NarrativeBridge::new(narrator),
            configured_buildings: buildings.clone(),
            configured_decor: decor.clone(),
            buildings,
            decor,
            grid,
            agents: BTreeMap::new(),
            policy,
            persistence,
            config,
        })
    }

    /// Replace the urgency policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Box<dyn DecisionPolicy>) -> Self {
        info!(policy = policy.name(), "Decision policy replaced");
        self.policy = policy;
        self
    }

    /// Ticks run so far.
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Current world time.
    pub const fn clock(&self) -> &WorldClock {
        &self.clock
    }

    /// Active configuration.
    pub const fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Name of the active urgency policy.
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    /// Look up an agent.
    pub fn agent(&self, agent_id: AgentId) -> Option<&Agent> {
        self.agents.get(&agent_id)
    }

    /// Every agent, in id order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Number of agents.
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Building arena.
    pub const fn buildings(&self) -> &BuildingRegistry {
        &self.buildings
    }

    /// Walkability grid.
    pub const fn grid(&self) -> &PathGrid {
        &self.grid
    }

    /// Running narrative events.
    pub const fn events(&self) -> &EventBook {
        &self.events
    }

    /// In-flight movements.
    pub const fn movement(&self) -> &MovementTracker {
        &self.movement
    }

    /// Add an agent. An agent placed inside a building that cannot take it
    /// is put outside instead.
    pub fn add_agent(&mut self, mut agent: Agent) -> AgentId {
        if let Some(building_id) = agent.building_id()
            && let Err(e) = self.buildings.add_occupant(building_id, agent.id)
        {
            warn!(agent_id = %agent.id, error = %e, "Agent could not be placed inside, starting outside");
            agent.whereabouts = Whereabouts::Outside {
                position: agent.position(),
            };
        }
        info!(agent_id = %agent.id, agent = %agent.name, position = %agent.position(), "Agent added");
        let id = agent.id;
        self.agents.insert(id, agent);
        id
    }

    /// Remove an agent, clearing its occupancy, movement, event
    /// participation and saved record.
    pub fn remove_agent(&mut self, agent_id: AgentId) -> Option<Agent> {
        let agent = self.agents.remove(&agent_id)?;
        self.movement.forget(agent_id);
        self.buildings.evict_everywhere(agent_id);
        self.events.forget_agent(agent_id);
        if let Err(e) = self.persistence.delete_agent(agent_id) {
            warn!(agent_id = %agent_id, error = %e, "Failed to delete saved agent");
        }
        info!(agent_id = %agent_id, agent = %agent.name, "Agent removed");
        Some(agent)
    }

    /// Add a building and rebuild the grid.
    pub fn add_building(&mut self, building: Building) -> BuildingId {
        let id = self.buildings.insert(building);
        self.grid.rebuild(&self.buildings, &self.decor);
        id
    }

    /// Add a decor element and rebuild the grid if it blocks movement.
    pub fn add_decor(&mut self, element: DecorElement) {
        let blocking = element.blocking;
        let _ = self.decor.insert(element);
        if blocking {
            self.grid.rebuild(&self.buildings, &self.decor);
        }
    }

    /// Run one tick.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::Clock`] if the clock would overflow; the
    /// world is left as it was before the clock step.
    pub fn run_tick(&mut self) -> Result<TickSummary, SimulationError> {
        let tick = self.tick.saturating_add(1);

        let finished = self.narrative.drain_ready();
        let registered = self.apply_narrative(finished);

        let minutes = self.config.world.minutes_per_tick;
        let step = self.clock.advance(minutes, &mut self.rng)?;
        self.tick = tick;
        if step.weather_changed {
            info!(tick, day = self.clock.day(), weather = %self.clock.weather(), "New day");
        }
        info!(tick, clock = %self.clock, agents = self.agents.len(), "Tick started");

        let mut summary = TickSummary::new(tick, self.clock.clone());
        summary.events_registered = registered;

        self.phase_needs(minutes);

        self.movement.advance_all(&mut self.agents);
        self.tally(&mut summary);

        self.phase_decisions(&mut summary);
        self.tally(&mut summary);

        self.phase_event_generation(tick);
        summary.events_ended = self.phase_event_impacts();

        let every = self.config.persistence.save_every_ticks;
        if every > 0 && tick.is_multiple_of(every) {
            self.persist();
        }

        info!(
            tick,
            arrivals = summary.arrivals,
            entries = summary.entries,
            failed_entries = summary.failed_entries,
            movements_started = summary.movements_started,
            events_active = self.events.len(),
            "Tick completed"
        );
        Ok(summary)
    }

    /// Phase (b): decay every agent, replenish the stationary ones.
    fn phase_needs(&mut self, minutes: u32) {
        let weather = self.clock.weather();
        for agent in self.agents.values_mut() {
            let outcome = decay(agent, minutes, weather, &self.config.needs);
            if outcome.emergency {
                debug!(agent_id = %agent.id, health = %agent.health, "Emergency floor breached");
            }
            if !self.movement.is_moving(agent.id) {
                replenish_by_activity(agent);
            }
        }
    }

    /// Drain the arrival queue into `summary`.
    fn tally(&mut self, summary: &mut TickSummary) {
        let counts = self.process_arrivals();
        summary.arrivals = summary.arrivals.saturating_add(counts.arrivals);
        summary.entries = summary.entries.saturating_add(counts.entries);
        summary.failed_entries = summary.failed_entries.saturating_add(counts.failed);
    }

    fn process_arrivals(&mut self) -> ArrivalTally {
        let hour = self.clock.hour();
        let mut tally = ArrivalTally::default();
        for arrival in self.movement.drain_arrivals() {
            let Some(agent) = self.agents.get_mut(&arrival.agent_id) else {
                continue;
            };
            tally.arrivals = tally.arrivals.saturating_add(1);
            match handle_arrival(agent, &arrival, &mut self.buildings, hour) {
                ArrivalOutcome::Entered { .. } => tally.entries = tally.entries.saturating_add(1),
                outcome if outcome.is_failed_entry() => tally.failed = tally.failed.saturating_add(1),
                _ => {}
            }
        }
        tally
    }

    /// Phase (d): every agent not travelling gets a decision.
    fn phase_decisions(&mut self, summary: &mut TickSummary) {
        let stationary: Vec<AgentId> = self
            .agents
            .keys()
            .copied()
            .filter(|id| !self.movement.is_moving(*id))
            .collect();
        let mut requests = Vec::new();
        for agent_id in stationary {
            let Some(outcome) = self.decide_for(agent_id, &mut requests) else {
                continue;
            };
            if outcome == DecisionOutcome::Moving {
                summary.movements_started = summary.movements_started.saturating_add(1);
            }
            summary.decisions.insert(agent_id, outcome);
        }
        self.dispatch(requests);
    }

    /// Run the policy for one agent, lifted out of the arena so the policy
    /// can see everyone else.
    fn decide_for(&mut self, agent_id: AgentId, requests: &mut Vec<NarrativeRequest>) -> Option<DecisionOutcome> {
        let mut agent = self.agents.remove(&agent_id)?;
        let mut ctx = DecisionContext {
            clock: &self.clock,
            buildings: &mut self.buildings,
            grid: &self.grid,
            movement: &mut self.movement,
            others: &self.agents,
            events: &mut self.events,
            narrative: requests,
            config: &self.config.decision,
        };
        let outcome = self.policy.decide(&mut agent, &mut ctx);
        debug!(agent_id = %agent_id, outcome = ?outcome, "Decision made");
        self.agents.insert(agent_id, agent);
        Some(outcome)
    }

    /// Hand queued generation requests to the narrative bridge.
    fn dispatch(&mut self, requests: Vec<NarrativeRequest>) {
        for request in requests {
            match request {
                NarrativeRequest::Dialogue { speaker, listener } => {
                    if let (Some(a), Some(b)) = (self.agents.get(&speaker), self.agents.get(&listener)) {
                        self.narrative.request_dialogue(a, b);
                    }
                }
                NarrativeRequest::Reaction { agent, event } => {
                    if let (Some(a), Some(e)) = (self.agents.get(&agent), self.events.get(event)) {
                        self.narrative.request_reaction(a, e);
                    }
                }
            }
        }
    }

    /// Phase (e): maybe ask the generator for a new event.
    fn phase_event_generation(&mut self, tick: u64) {
        let config = &self.config.events;
        if config.interval_ticks == 0 || !tick.is_multiple_of(config.interval_ticks) {
            return;
        }
        if self.events.is_full() || self.agents.is_empty() {
            return;
        }
        let roll: u8 = self.rng.random_range(0..100);
        if roll >= config.probability_percent {
            debug!(tick, roll, "No event this time");
            return;
        }
        let agents: Vec<Agent> = self.agents.values().cloned().collect();
        self.narrative.request_event(&agents, &self.clock);
        debug!(tick, "Event generation requested");
    }

    /// Phase (f): apply due impacts and request resolutions for ended
    /// events. Returns how many ended.
    fn phase_event_impacts(&mut self) -> usize {
        let ended = self
            .events
            .apply_impacts(self.clock.total_minutes(), &mut self.agents);
        let count = ended.len();
        for event in ended {
            let involved: Vec<Agent> = event
                .involved
                .iter()
                .filter_map(|id| self.agents.get(id))
                .cloned()
                .collect();
            self.narrative.request_resolution(event, &involved);
        }
        count
    }

    /// Fold finished generation calls into the world. Returns how many
    /// events were registered.
    fn apply_narrative(&mut self, outcomes: Vec<NarrativeOutcome>) -> usize {
        let mut registered = 0_usize;
        for outcome in outcomes {
            match outcome {
                NarrativeOutcome::Dialogue { speaker, listener, text } => {
                    for id in [speaker, listener] {
                        if let Some(agent) = self.agents.get_mut(&id) {
                            agent.record(format!("Conversation:\n{text}"));
                        }
                    }
                }
                NarrativeOutcome::Reaction { agent, event_type, text } => {
                    if let Some(agent) = self.agents.get_mut(&agent) {
                        debug!(agent_id = %agent.id, event_type = %event_type, "Reaction recorded");
                        agent.record(text);
                    }
                }
                NarrativeOutcome::Event { payload: Some(raw) } => {
                    let agents = &self.agents;
                    match parse_event_payload(&raw, self.clock.total_minutes(), |id| agents.contains_key(&id)) {
                        Ok(event) => {
                            if self.events.register(event) {
                                registered = registered.saturating_add(1);
                            }
                        }
                        Err(e) => warn!(error = %e, "Discarding generated event"),
                    }
                }
                NarrativeOutcome::Event { payload: None } => debug!("Generator produced no event"),
                NarrativeOutcome::Resolution { event, text } => {
                    info!(event_id = %event.id, event_type = %event.event_type, "Event resolved");
                    for id in &event.involved {
                        if let Some(agent) = self.agents.get_mut(id) {
                            agent.record(format!("The {} is over. {text}", event.event_type));
                        }
                    }
                }
            }
        }
        registered
    }

    /// Wait for every generation call in flight and apply the results.
    /// Returns how many events were registered.
    pub async fn settle_narrative(&mut self) -> usize {
        let finished = self.narrative.settle().await;
        self.apply_narrative(finished)
    }

    /// Save every agent and building. Failures are logged and skipped.
    fn persist(&self) {
        for agent in self.agents.values() {
            if let Err(e) = self.persistence.save_agent(agent) {
                warn!(agent_id = %agent.id, error = %e, "Failed to save agent");
            }
        }
        for building in self.buildings.get_buildings() {
            if let Err(e) = self.persistence.save_building(building) {
                warn!(building_id = %building.id, error = %e, "Failed to save building");
            }
        }
        debug!(tick = self.tick, agents = self.agents.len(), "State persisted");
    }

    /// Drop `agent_id`'s health to an emergency level and let the policy
    /// react at once.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::UnknownAgent`] for an unknown id.
    pub fn simulate_health_emergency(&mut self, agent_id: AgentId) -> Result<DecisionOutcome, SimulationError> {
        let agent = self
            .agents
            .get_mut(&agent_id)
            .ok_or(SimulationError::UnknownAgent(agent_id))?;
        agent.health = Level::new(EMERGENCY_HEALTH);
        info!(agent_id = %agent_id, agent = %agent.name, "Health emergency simulated");
        agent.record(format!("{} suddenly feels very unwell.", agent.name));
        self.decide_now(agent_id)
    }

    /// Drop `agent_id`'s hunger to near zero and let the policy react at
    /// once.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::UnknownAgent`] for an unknown id.
    pub fn simulate_hunger(&mut self, agent_id: AgentId) -> Result<DecisionOutcome, SimulationError> {
        let agent = self
            .agents
            .get_mut(&agent_id)
            .ok_or(SimulationError::UnknownAgent(agent_id))?;
        agent.needs.set(Need::Hunger, STARVING_HUNGER);
        info!(agent_id = %agent_id, agent = %agent.name, "Hunger simulated");
        agent.record(format!("{} is suddenly starving.", agent.name));
        self.decide_now(agent_id)
    }

    /// Interrupt any errand and decide for one agent outside the tick.
    fn decide_now(&mut self, agent_id: AgentId) -> Result<DecisionOutcome, SimulationError> {
        if let Some(agent) = self.agents.get_mut(&agent_id) {
            let _ = self.movement.cancel(agent);
        }
        let mut requests = Vec::new();
        let outcome = self
            .decide_for(agent_id, &mut requests)
            .ok_or(SimulationError::UnknownAgent(agent_id))?;
        self.dispatch(requests);
        let _ = self.process_arrivals();
        Ok(outcome)
    }

    /// Return to the configured start: clock, RNG, the configured buildings
    /// and decor (empty, with their original ids), a fresh grid, no
    /// movements or events, and agents reloaded from persistence (or the
    /// current ones if nothing was saved), all standing outside.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError`] if the clock or persistence fails; the
    /// simulation may then be partially reset.
    pub async fn reset(&mut self) -> Result<(), SimulationError> {
        self.narrative.shutdown().await;
        self.tick = 0;
        self.clock = WorldClock::new(&self.config.world)?;
        self.rng = StdRng::seed_from_u64(self.config.world.seed);
        self.movement.clear();
        self.events.clear();
        self.buildings = self.configured_buildings.clone();
        self.buildings.clear_occupants();
        self.decor = self.configured_decor.clone();
        self.grid.rebuild(&self.buildings, &self.decor);

        let snapshot = self.persistence.load_all()?;
        let agents: Vec<Agent> = if snapshot.agents.is_empty() {
            core::mem::take(&mut self.agents).into_values().collect()
        } else {
            snapshot.agents
        };
        self.agents = agents
            .into_iter()
            .map(|mut agent| {
                agent.whereabouts = Whereabouts::Outside {
                    position: agent.position(),
                };
                agent.status.destination = None;
                agent.status.target_building = None;
                (agent.id, agent)
            })
            .collect();
        info!(agents = self.agents.len(), clock = %self.clock, "Simulation reset");
        Ok(())
    }

    /// Text map with every agent drawn as the first letter of its name.
    pub fn render_ascii(&self) -> String {
        let marks: Vec<_> = self
            .agents
            .values()
            .map(|a| (a.position(), a.name.chars().next().unwrap_or('@')))
            .collect();
        self.grid.render_ascii(&marks)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeSet;

    use townsfolk_types::{ActiveEvent, BuildingType, Footprint, Needs, Personality, Position, Profession, Service};
    use townsfolk_world::{BuildingSpec, GridConfig};

    use super::*;
    use crate::narrative::{FALLBACK_RESOLUTION, NarrativeError, NarrativeFuture, NullNarrator};
    use crate::persistence::InMemoryPersistence;

    fn make_spec(
        name: &str,
        building_type: BuildingType,
        position: Position,
        capacity: u32,
        services: &[Service],
    ) -> BuildingSpec {
        BuildingSpec {
            name: String::from(name),
            building_type,
            position,
            footprint: None::<Footprint>,
            capacity,
            opening_hour: 0,
            closing_hour: 24,
            services: services.iter().copied().collect::<BTreeSet<_>>(),
        }
    }

    fn make_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.world.start_hour = 12;
        config.grid = GridConfig {
            width: 60,
            height: 60,
            offset_x: 30,
            offset_y: 30,
            ..GridConfig::default()
        };
        config.events.interval_ticks = 0;
        config.town.buildings = vec![
            make_spec(
                "Tavern",
                BuildingType::Tavern,
                Position::new(10.0, 10.0),
                20,
                &[Service::Meal, Service::Drink, Service::Rest],
            ),
            make_spec("Temple", BuildingType::Temple, Position::new(-5.0, -10.0), 30, &[Service::Healing]),
        ];
        config
    }

    fn make_simulation(config: SimulationConfig) -> (Simulation, Arc<InMemoryPersistence>) {
        let store = Arc::new(InMemoryPersistence::new());
        let sim = Simulation::new(config, Arc::new(NullNarrator), store.clone()).unwrap();
        (sim, store)
    }

    fn make_agent(name: &str, position: Position) -> Agent {
        Agent::new(
            name,
            41,
            Profession::Innkeeper,
            Personality::Jovial,
            Needs::uniform(70.0),
            position,
        )
    }

    fn building_named(sim: &Simulation, name: &str) -> BuildingId {
        sim.buildings()
            .get_buildings()
            .find(|b| b.name == name)
            .map(|b| b.id)
            .unwrap()
    }

    #[test]
    fn tick_advances_clock() {
        let (mut sim, _) = make_simulation(make_config());
        let summary = sim.run_tick().unwrap();
        assert_eq!(summary.tick, 1);
        assert_eq!((sim.clock().hour(), sim.clock().minute()), (12, 5));
        assert_eq!(sim.clock().total_minutes(), 5);
        assert_eq!(sim.tick(), 1);
    }

    #[test]
    fn tick_decays_needs() {
        let (mut sim, _) = make_simulation(make_config());
        let id = sim.add_agent(make_agent("Ada", Position::default()));
        let _ = sim.run_tick().unwrap();
        let agent = sim.agent(id).unwrap();
        assert!(agent.needs.hunger.value() < 70.0);
        assert!(agent.needs.thirst.value() < agent.needs.hunger.value());
    }

    #[test]
    fn hungry_agent_walks_to_tavern_and_eats() {
        let (mut sim, _) = make_simulation(make_config());
        let tavern = building_named(&sim, "Tavern");
        let mut agent = make_agent("Ada", Position::default());
        agent.needs.set(Need::Hunger, 10.0);
        let id = sim.add_agent(agent);

        let first = sim.run_tick().unwrap();
        assert_eq!(first.movements_started, 1);
        assert_eq!(first.decisions.get(&id), Some(&DecisionOutcome::Moving));
        assert!(sim.movement().is_moving(id));

        let mut entered = false;
        for _ in 0..30 {
            let summary = sim.run_tick().unwrap();
            if summary.entries > 0 {
                entered = true;
                break;
            }
        }
        assert!(entered);
        let agent = sim.agent(id).unwrap();
        assert_eq!(agent.building_id(), Some(tavern));
        assert!(agent.needs.hunger.value() > 30.0);
        assert!(sim.buildings().get(tavern).unwrap().contains(id));
    }

    #[test]
    fn swapped_policy_decides_instead() {
        let (sim, _) = make_simulation(make_config());
        let mut sim = sim.with_policy(Box::new(crate::decision::IdlePolicy));
        assert_eq!(sim.policy_name(), "idle");
        let mut agent = make_agent("Ada", Position::default());
        agent.needs.set(Need::Hunger, 10.0);
        let id = sim.add_agent(agent);

        let summary = sim.run_tick().unwrap();
        assert_eq!(summary.movements_started, 0);
        assert_eq!(summary.decisions.get(&id), Some(&DecisionOutcome::Idle));
        assert!(!sim.movement().is_moving(id));
    }

    #[test]
    fn full_building_turns_agent_away() {
        let mut config = make_config();
        if let Some(tavern) = config.town.buildings.first_mut() {
            tavern.capacity = 1;
        }
        let (mut sim, _) = make_simulation(config);
        let tavern = building_named(&sim, "Tavern");

        let mut regular = make_agent("Bram", Position::new(9.0, 9.0));
        regular.whereabouts = Whereabouts::Inside {
            building_id: tavern,
            position: Position::new(9.0, 9.0),
        };
        let _ = sim.add_agent(regular);

        let mut hungry = make_agent("Ada", Position::default());
        hungry.needs.set(Need::Hunger, 10.0);
        let id = sim.add_agent(hungry);

        let mut failed = 0;
        for _ in 0..30 {
            failed += sim.run_tick().unwrap().failed_entries;
            if failed > 0 {
                break;
            }
        }
        assert!(failed > 0);
        let agent = sim.agent(id).unwrap();
        assert!(agent.is_outside());
        assert_eq!(sim.buildings().get(tavern).unwrap().occupants().len(), 1);
    }

    #[test]
    fn health_emergency_sends_agent_to_healer() {
        let (mut sim, _) = make_simulation(make_config());
        let temple = building_named(&sim, "Temple");
        let id = sim.add_agent(make_agent("Ada", Position::default()));

        let outcome = sim.simulate_health_emergency(id).unwrap();
        assert_eq!(outcome, DecisionOutcome::Moving);
        let agent = sim.agent(id).unwrap();
        assert!((agent.health.value() - 10.0).abs() < 1e-9);
        assert_eq!(agent.status.target_building, Some(temple));
    }

    #[test]
    fn simulated_hunger_interrupts_errand() {
        let (mut sim, _) = make_simulation(make_config());
        let tavern = building_named(&sim, "Tavern");
        let id = sim.add_agent(make_agent("Ada", Position::default()));
        let _ = sim.simulate_health_emergency(id).unwrap();

        let outcome = sim.simulate_hunger(id).unwrap();
        assert_eq!(outcome, DecisionOutcome::Moving);
        assert_eq!(sim.agent(id).unwrap().status.target_building, Some(tavern));
        assert!(
            sim.agent(id)
                .unwrap()
                .history
                .iter()
                .any(|h| h.description.contains("more pressing"))
        );
    }

    #[test]
    fn unknown_agent_is_reported() {
        let (mut sim, _) = make_simulation(make_config());
        let err = sim.simulate_hunger(AgentId::new()).unwrap_err();
        assert!(matches!(err, SimulationError::UnknownAgent(_)));
    }

    #[test]
    fn remove_agent_clears_occupancy_and_movement() {
        let (mut sim, _) = make_simulation(make_config());
        let tavern = building_named(&sim, "Tavern");
        let mut inside = make_agent("Bram", Position::new(9.0, 9.0));
        inside.whereabouts = Whereabouts::Inside {
            building_id: tavern,
            position: Position::new(9.0, 9.0),
        };
        let inside = sim.add_agent(inside);
        let walker = sim.add_agent(make_agent("Ada", Position::default()));
        let _ = sim.simulate_hunger(walker).unwrap();

        assert!(sim.remove_agent(inside).is_some());
        assert!(sim.buildings().get(tavern).unwrap().occupants().is_empty());
        assert!(sim.remove_agent(walker).is_some());
        assert!(sim.movement().is_empty());
        assert_eq!(sim.agent_count(), 0);
    }

    #[test]
    fn state_is_persisted() {
        let (mut sim, store) = make_simulation(make_config());
        let _ = sim.add_agent(make_agent("Ada", Position::default()));
        let _ = sim.add_agent(make_agent("Bram", Position::new(2.0, 2.0)));
        let _ = sim.run_tick().unwrap();
        assert_eq!(store.agent_count(), 2);
        assert_eq!(store.building_count(), 2);
    }

    #[test]
    fn adding_building_blocks_grid() {
        let (mut sim, _) = make_simulation(make_config());
        let before = sim.grid().blocked_count();
        let _ = sim.add_building(
            Building::new("Hut", BuildingType::Residence, Position::new(-20.0, 20.0), 2).with_footprint(2, 2),
        );
        assert_eq!(sim.grid().blocked_count(), before + 4);
        assert!(!sim.grid().is_walkable(Position::new(-20.0, 20.0)));
    }

    #[test]
    fn ascii_map_marks_agents() {
        let (mut sim, _) = make_simulation(make_config());
        let _ = sim.add_agent(make_agent("Ada", Position::default()));
        let map = sim.render_ascii();
        assert!(map.contains('A'));
        assert!(map.contains('#'));
        assert_eq!(map.lines().count(), 60);
    }

    #[tokio::test]
    async fn reset_restores_start_and_reloads_agents() {
        let (mut sim, _) = make_simulation(make_config());
        let id = sim.add_agent(make_agent("Ada", Position::default()));
        let _ = sim.simulate_hunger(id).unwrap();
        for _ in 0..3 {
            let _ = sim.run_tick().unwrap();
        }

        sim.reset().await.unwrap();
        assert_eq!(sim.tick(), 0);
        assert_eq!((sim.clock().hour(), sim.clock().minute()), (12, 0));
        assert!(sim.movement().is_empty());
        let agent = sim.agent(id).unwrap();
        assert!(agent.is_outside());
        assert!(agent.status.destination.is_none());
        assert!(sim.buildings().get_buildings().all(|b| b.occupants().is_empty()));
    }

    #[tokio::test]
    async fn removed_agent_stays_gone_after_reset() {
        let (mut sim, store) = make_simulation(make_config());
        let ada = sim.add_agent(make_agent("Ada", Position::default()));
        let bram = sim.add_agent(make_agent("Bram", Position::new(2.0, 2.0)));
        let _ = sim.run_tick().unwrap();
        assert_eq!(store.agent_count(), 2);

        assert!(sim.remove_agent(bram).is_some());
        assert_eq!(store.agent_count(), 1);
        let _ = sim.run_tick().unwrap();

        sim.reset().await.unwrap();
        assert_eq!(sim.agent_count(), 1);
        assert!(sim.agent(ada).is_some());
        assert!(sim.agent(bram).is_none());
    }

    #[tokio::test]
    async fn reset_drops_buildings_added_at_runtime() {
        let (mut sim, _) = make_simulation(make_config());
        let tavern = building_named(&sim, "Tavern");
        let blocked_before = sim.grid().blocked_count();
        let hut = sim.add_building(
            Building::new("Hut", BuildingType::Residence, Position::new(-20.0, 20.0), 2).with_footprint(2, 2),
        );
        let hut_cells = sim.grid().footprint_cells(sim.buildings().get(hut).unwrap());
        assert!(hut_cells.iter().all(|c| !sim.grid().is_walkable_cell(*c)));

        sim.reset().await.unwrap();
        assert_eq!(sim.buildings().len(), 2);
        assert!(sim.buildings().get(hut).is_none());
        assert!(sim.buildings().get(tavern).is_some());
        assert_eq!(sim.grid().blocked_count(), blocked_before);
        assert!(hut_cells.iter().all(|c| sim.grid().is_walkable_cell(*c)));
    }

    /// Produces one festival involving the first agent, then nothing.
    struct FestivalNarrator;

    impl NarrativeGenerator for FestivalNarrator {
        fn generate_dialogue(&self, _speaker: &Agent, _listener: &Agent) -> NarrativeFuture<String> {
            Box::pin(async { Err(NarrativeError::Unavailable) })
        }

        fn generate_event(&self, agents: &[Agent], _clock: &WorldClock) -> NarrativeFuture<Option<String>> {
            let payload = agents.first().map(|a| {
                format!(
                    r#"{{"type": "festival", "description": "Music in the square.", "involved": ["{id}"], "duration": 10, "impacts": {{"{id}": {{"hunger": -20}}}}}}"#,
                    id = a.id
                )
            });
            Box::pin(async move { Ok(payload) })
        }

        fn generate_event_resolution(&self, _event: &ActiveEvent, _agents: &[Agent]) -> NarrativeFuture<String> {
            Box::pin(async {
                Err(NarrativeError::Generation {
                    message: String::from("offline"),
                })
            })
        }

        fn generate_reaction(&self, _agent: &Agent, _event: &ActiveEvent) -> NarrativeFuture<String> {
            Box::pin(async { Err(NarrativeError::Unavailable) })
        }
    }

    #[tokio::test]
    async fn generated_event_runs_its_course() {
        let mut config = make_config();
        config.events.interval_ticks = 1;
        config.events.probability_percent = 100;
        config.events.max_active = 1;
        let store = Arc::new(InMemoryPersistence::new());
        let mut sim = Simulation::new(config, Arc::new(FestivalNarrator), store).unwrap();
        let id = sim.add_agent(make_agent("Ada", Position::default()));

        let _ = sim.run_tick().unwrap();
        assert_eq!(sim.settle_narrative().await, 1);
        assert_eq!(sim.events().len(), 1);

        let _ = sim.run_tick().unwrap();
        let third = sim.run_tick().unwrap();
        assert_eq!(third.events_ended, 1);
        assert!(sim.events().is_empty());

        let hunger = sim.agent(id).unwrap().needs.hunger.value();
        assert!(hunger < 50.0 && hunger > 45.0, "hunger was {hunger}");

        let _ = sim.settle_narrative().await;
        let history = &sim.agent(id).unwrap().history;
        assert!(history.iter().any(|h| h.description.contains("caught up in the festival")));
        assert!(history.iter().any(|h| h.description.contains(FALLBACK_RESOLUTION)));
    }
}

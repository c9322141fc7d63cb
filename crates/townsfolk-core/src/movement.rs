//! Movement tracker: per-agent path following.
//!
//! [`MovementTracker::start_movement`] plans a path on the
//! [`PathGrid`] and stores a [`MovementRecord`]. Once per tick
//! [`MovementTracker::advance_all`] moves every traveller forward and
//! queues an [`Arrival`] for each one whose cursor was already on the last
//! cell. The tick drains the queue with [`MovementTracker::drain_arrivals`]
//! and hands each arrival to [`handle_arrival`], which decides whether the
//! agent gets into its target building.
//!
//! A path of `L` cells (start cell included) at one cell per tick takes
//! exactly `L` ticks: `L - 1` steps plus the arrival tick.

use std::collections::{BTreeMap, VecDeque};

use townsfolk_agents::{EntryEffect, satisfy_on_entry};
use townsfolk_types::{Agent, AgentId, BuildingId, Need, Position, Whereabouts};
use townsfolk_world::{BuildingRegistry, PathGrid, WorldError};
use tracing::{debug, info, warn};

use crate::config::MovementConfig;

/// Errors from starting a movement.
#[derive(Debug, thiserror::Error)]
pub enum MovementError {
    /// No path to the destination.
    #[error("agent {agent_id} cannot reach {destination}: {source}")]
    Unreachable {
        /// The agent.
        agent_id: AgentId,
        /// Requested destination.
        destination: Position,
        /// The pathfinding failure.
        source: WorldError,
    },
}

/// A need boost delivered when the agent arrives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeedBump {
    /// Need to raise.
    pub need: Need,
    /// Amount to add.
    pub amount: f64,
}

/// Where an agent wants to go and what should happen when it gets there.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MovementRequest {
    /// World position to walk to.
    pub destination: Position,
    /// Building to enter on arrival.
    pub target_building: Option<BuildingId>,
    /// Boost applied on a successful arrival.
    pub on_arrival: Option<NeedBump>,
}

impl MovementRequest {
    /// Walk to `destination` without entering anything.
    pub const fn to(destination: Position) -> Self {
        Self {
            destination,
            target_building: None,
            on_arrival: None,
        }
    }

    /// Enter `building` on arrival.
    pub const fn entering(mut self, building: BuildingId) -> Self {
        self.target_building = Some(building);
        self
    }

    /// Apply `bump` on a successful arrival.
    pub const fn with_bump(mut self, bump: NeedBump) -> Self {
        self.on_arrival = Some(bump);
        self
    }
}

/// Ephemeral path-following state of one travelling agent.
#[derive(Debug, Clone, PartialEq)]
pub struct MovementRecord {
    /// World positions of each path cell, start cell first.
    pub path: Vec<Position>,
    /// Index of the cell the agent currently stands on.
    pub cursor: usize,
    /// Exact destination the agent snaps to on arrival.
    pub destination: Position,
    /// Building to enter on arrival.
    pub target_building: Option<BuildingId>,
    /// Boost applied on a successful arrival.
    pub on_arrival: Option<NeedBump>,
}

impl MovementRecord {
    fn last_index(&self) -> usize {
        self.path.len().saturating_sub(1)
    }
}

/// Emitted when an agent reaches the end of its path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrival {
    /// The agent.
    pub agent_id: AgentId,
    /// Building the agent meant to enter.
    pub target_building: Option<BuildingId>,
    /// Where the agent stands.
    pub position: Position,
    /// Boost to apply if the arrival succeeds.
    pub bump: Option<NeedBump>,
}

/// How [`MovementTracker::start_movement`] resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovementStart {
    /// The agent was already within tolerance; an arrival is queued if a
    /// building was targeted.
    AlreadyThere,
    /// A path was planned.
    Started {
        /// Path length in cells, start cell included.
        cells: usize,
    },
}

/// Tracks every in-flight movement.
#[derive(Debug, Clone)]
pub struct MovementTracker {
    records: BTreeMap<AgentId, MovementRecord>,
    outbox: VecDeque<Arrival>,
    cells_per_tick: usize,
    tolerance: f64,
}

impl MovementTracker {
    /// Create an empty tracker.
    pub fn new(config: &MovementConfig) -> Self {
        Self {
            records: BTreeMap::new(),
            outbox: VecDeque::new(),
            cells_per_tick: config.cells_per_tick.max(1),
            tolerance: config.arrival_tolerance,
        }
    }

    /// Whether `agent_id` is travelling.
    pub fn is_moving(&self, agent_id: AgentId) -> bool {
        self.records.contains_key(&agent_id)
    }

    /// The movement record of `agent_id`.
    pub fn record(&self, agent_id: AgentId) -> Option<&MovementRecord> {
        self.records.get(&agent_id)
    }

    /// Number of travelling agents.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nobody is travelling.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Plan a path for `agent` and start following it.
    ///
    /// An agent already within the arrival tolerance needs no path; if a
    /// building was targeted an [`Arrival`] is queued right away. An agent
    /// that sets off leaves the building it was in.
    ///
    /// # Errors
    ///
    /// Returns [`MovementError::Unreachable`] when pathfinding fails; the
    /// agent is left untouched.
    pub fn start_movement(
        &mut self,
        agent: &mut Agent,
        request: MovementRequest,
        grid: &PathGrid,
        buildings: &mut BuildingRegistry,
    ) -> Result<MovementStart, MovementError> {
        let from = agent.position();
        if from.distance_to(request.destination) <= self.tolerance {
            if request.target_building.is_some() || request.on_arrival.is_some() {
                self.outbox.push_back(Arrival {
                    agent_id: agent.id,
                    target_building: request.target_building,
                    position: from,
                    bump: request.on_arrival,
                });
            }
            return Ok(MovementStart::AlreadyThere);
        }

        let path = grid
            .find_path(from, request.destination)
            .map_err(|source| MovementError::Unreachable {
                agent_id: agent.id,
                destination: request.destination,
                source,
            })?;

        leave_building(agent, buildings);
        agent.status.destination = Some(request.destination);
        agent.status.target_building = request.target_building;

        let label = request
            .target_building
            .and_then(|id| buildings.get(id))
            .map_or_else(|| request.destination.to_string(), |b| b.name.clone());
        info!(
            agent_id = %agent.id,
            agent = %agent.name,
            toward = %label,
            cells = path.len(),
            "Movement started"
        );
        agent.record(format!("{} began moving toward {label}.", agent.name));

        let cells = path.len();
        self.records.insert(
            agent.id,
            MovementRecord {
                path,
                cursor: 0,
                destination: request.destination,
                target_building: request.target_building,
                on_arrival: request.on_arrival,
            },
        );
        Ok(MovementStart::Started { cells })
    }

    /// Move every traveller one tick forward.
    ///
    /// Travellers whose cursor is on the final cell snap to their exact
    /// destination, lose their travel metadata, and are queued as
    /// arrivals. Records of agents no longer in `agents` are dropped.
    pub fn advance_all(&mut self, agents: &mut BTreeMap<AgentId, Agent>) {
        let mut finished = Vec::new();
        for (agent_id, record) in &mut self.records {
            let Some(agent) = agents.get_mut(agent_id) else {
                finished.push(*agent_id);
                continue;
            };
            let last = record.last_index();
            if record.cursor >= last {
                agent.set_position(record.destination);
                agent.status.destination = None;
                agent.status.target_building = None;
                self.outbox.push_back(Arrival {
                    agent_id: *agent_id,
                    target_building: record.target_building,
                    position: record.destination,
                    bump: record.on_arrival,
                });
                debug!(agent_id = %agent_id, position = %record.destination, "Agent arrived");
                finished.push(*agent_id);
                continue;
            }
            record.cursor = record.cursor.saturating_add(self.cells_per_tick).min(last);
            if let Some(step) = record.path.get(record.cursor) {
                agent.set_position(*step);
            }
        }
        for agent_id in finished {
            self.records.remove(&agent_id);
        }
    }

    /// Take every queued arrival, oldest first.
    pub fn drain_arrivals(&mut self) -> Vec<Arrival> {
        self.outbox.drain(..).collect()
    }

    /// Abort `agent`'s movement where it stands. Returns `false` if it was
    /// not moving.
    pub fn cancel(&mut self, agent: &mut Agent) -> bool {
        if self.records.remove(&agent.id).is_none() {
            return false;
        }
        agent.status.destination = None;
        agent.status.target_building = None;
        info!(agent_id = %agent.id, agent = %agent.name, position = %agent.position(), "Movement interrupted");
        agent.record(format!("{} stopped to attend to something more pressing.", agent.name));
        true
    }

    /// Drop all state for `agent_id` without touching the agent.
    pub fn forget(&mut self, agent_id: AgentId) {
        self.records.remove(&agent_id);
        self.outbox.retain(|a| a.agent_id != agent_id);
    }

    /// Drop every record and queued arrival.
    pub fn clear(&mut self) {
        self.records.clear();
        self.outbox.clear();
    }
}

/// Step `agent` out of whatever building it is in.
pub fn leave_building(agent: &mut Agent, buildings: &mut BuildingRegistry) {
    if let Some(building_id) = agent.building_id() {
        if let Err(e) = buildings.remove_occupant(building_id, agent.id) {
            debug!(agent_id = %agent.id, error = %e, "Occupancy already cleared");
        }
        agent.whereabouts = Whereabouts::Outside {
            position: agent.position(),
        };
    }
}

/// Result of processing one [`Arrival`].
#[derive(Debug, Clone, PartialEq)]
pub enum ArrivalOutcome {
    /// The agent went in and the entry effects applied.
    Entered {
        /// The building entered.
        building: BuildingId,
        /// Needs and health raised on entry.
        effect: EntryEffect,
    },
    /// The target was closed at this hour.
    Closed(BuildingId),
    /// The target had no spare capacity.
    Full(BuildingId),
    /// The target no longer exists.
    Missing(BuildingId),
    /// No building was targeted; the agent stays outside.
    Outside,
}

impl ArrivalOutcome {
    /// Whether a targeted entry failed.
    pub const fn is_failed_entry(&self) -> bool {
        matches!(self, Self::Closed(_) | Self::Full(_) | Self::Missing(_))
    }
}

/// Try to bring an arrived agent into its target building.
///
/// Entry requires the building to be open at `hour` and to have room. On
/// success the agent is registered as an occupant, its whereabouts point at
/// the building, and the building's entry effects plus any arrival bump
/// apply. On failure the agent stays outside at its arrival position with
/// needs untouched.
pub fn handle_arrival(
    agent: &mut Agent,
    arrival: &Arrival,
    buildings: &mut BuildingRegistry,
    hour: u8,
) -> ArrivalOutcome {
    let Some(building_id) = arrival.target_building else {
        agent.whereabouts = Whereabouts::Outside {
            position: arrival.position,
        };
        if let Some(bump) = arrival.bump {
            agent.needs.adjust(bump.need, bump.amount);
        }
        return ArrivalOutcome::Outside;
    };

    if agent.building_id() == Some(building_id) {
        if let Some(bump) = arrival.bump {
            agent.needs.adjust(bump.need, bump.amount);
        }
        return ArrivalOutcome::Entered {
            building: building_id,
            effect: EntryEffect::default(),
        };
    }

    let refusal = match buildings.get(building_id) {
        None => Some(ArrivalOutcome::Missing(building_id)),
        Some(b) if !b.is_open(hour) => Some(ArrivalOutcome::Closed(building_id)),
        Some(b) if !b.has_capacity() => Some(ArrivalOutcome::Full(building_id)),
        Some(_) => None,
    };
    if let Some(outcome) = refusal {
        leave_building(agent, buildings);
        agent.whereabouts = Whereabouts::Outside {
            position: arrival.position,
        };
        warn!(
            agent_id = %agent.id,
            agent = %agent.name,
            building_id = %building_id,
            outcome = ?outcome,
            "Failed entry"
        );
        agent.record(format!("{} could not get in and waits outside.", agent.name));
        return outcome;
    }

    leave_building(agent, buildings);
    if let Err(e) = buildings.add_occupant(building_id, agent.id) {
        warn!(agent_id = %agent.id, building_id = %building_id, error = %e, "Failed entry");
        agent.whereabouts = Whereabouts::Outside {
            position: arrival.position,
        };
        return ArrivalOutcome::Full(building_id);
    }
    agent.whereabouts = Whereabouts::Inside {
        building_id,
        position: arrival.position,
    };

    let Some(building) = buildings.get(building_id) else {
        return ArrivalOutcome::Missing(building_id);
    };
    let effect = satisfy_on_entry(agent, building);
    if let Some(bump) = arrival.bump {
        agent.needs.adjust(bump.need, bump.amount);
    }
    info!(agent_id = %agent.id, agent = %agent.name, building = %building.name, "Entered building");
    agent.record(format!("{} entered {}.", agent.name, building.name));

    ArrivalOutcome::Entered {
        building: building_id,
        effect,
    }
}

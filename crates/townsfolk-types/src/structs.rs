//! Core entity structs for the Townsfolk simulation.
//!
//! Agents and buildings live in id-keyed arenas owned by the simulation;
//! every cross-reference here (occupants, home, target building, event
//! participants) is an id, never a pointer.
//!
//! Every scalar that must stay in `[0, 100]` is a [`Level`], which clamps
//! on construction and on every adjustment, so no code path can store an
//! out-of-range need, health or happiness value.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{Activity, BuildingType, EventType, Need, Personality, Profession, Service};
use crate::ids::{AgentId, BuildingId, DecorId, EventId};

// ---------------------------------------------------------------------------
// Level
// ---------------------------------------------------------------------------

/// Lower bound of every [`Level`].
pub const LEVEL_MIN: f64 = 0.0;

/// Upper bound of every [`Level`].
pub const LEVEL_MAX: f64 = 100.0;

/// A scalar clamped to `[0, 100]`.
///
/// `NaN` inputs collapse to 0.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Level(f64);

impl Level {
    /// A fully satisfied level.
    pub const FULL: Self = Self(LEVEL_MAX);

    /// An empty level.
    pub const EMPTY: Self = Self(LEVEL_MIN);

    /// Create a level, clamping `value` into range.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::EMPTY;
        }
        Self(value.clamp(LEVEL_MIN, LEVEL_MAX))
    }

    /// Return the raw value.
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Return a new level shifted by `delta` and clamped.
    pub fn adjusted(self, delta: f64) -> Self {
        Self::new(self.0 + delta)
    }
}

impl Default for Level {
    fn default() -> Self {
        Self::FULL
    }
}

impl From<f64> for Level {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Level> for f64 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl core::fmt::Display for Level {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// A point in continuous world coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// East-west coordinate.
    pub x: f64,
    /// North-south coordinate.
    pub y: f64,
}

impl Position {
    /// Create a position.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Explicit rectangular size of a building, in grid cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    /// Extent along x.
    pub width: u32,
    /// Extent along y.
    pub height: u32,
}

// ---------------------------------------------------------------------------
// Agent
// ---------------------------------------------------------------------------

/// The six-entry needs vector of an agent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Needs {
    /// Satiety.
    pub hunger: Level,
    /// Hydration.
    pub thirst: Level,
    /// Restedness.
    pub fatigue: Level,
    /// Social contact.
    pub social: Level,
    /// Entertainment.
    pub diversion: Level,
    /// Physical energy.
    pub energy: Level,
}

impl Needs {
    /// Every need at the same value.
    pub fn uniform(value: f64) -> Self {
        let level = Level::new(value);
        Self {
            hunger: level,
            thirst: level,
            fatigue: level,
            social: level,
            diversion: level,
            energy: level,
        }
    }

    /// Current level of one need.
    pub const fn get(&self, need: Need) -> Level {
        match need {
            Need::Hunger => self.hunger,
            Need::Thirst => self.thirst,
            Need::Fatigue => self.fatigue,
            Need::Social => self.social,
            Need::Diversion => self.diversion,
            Need::Energy => self.energy,
        }
    }

    /// Mutable slot for one need.
    const fn slot_mut(&mut self, need: Need) -> &mut Level {
        match need {
            Need::Hunger => &mut self.hunger,
            Need::Thirst => &mut self.thirst,
            Need::Fatigue => &mut self.fatigue,
            Need::Social => &mut self.social,
            Need::Diversion => &mut self.diversion,
            Need::Energy => &mut self.energy,
        }
    }

    /// Overwrite one need (clamped).
    pub fn set(&mut self, need: Need, value: f64) {
        *self.slot_mut(need) = Level::new(value);
    }

    /// Shift one need by `delta` (clamped) and return the new level.
    pub fn adjust(&mut self, need: Need, delta: f64) -> Level {
        let slot = self.slot_mut(need);
        *slot = slot.adjusted(delta);
        *slot
    }

    /// Iterate over `(need, level)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (Need, Level)> + '_ {
        Need::ALL.into_iter().map(|need| (need, self.get(need)))
    }
}

/// Where an agent is: inside exactly one building, or outside.
///
/// Being an enum makes "inside a building and outside at the same time"
/// unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Whereabouts {
    /// Inside a building, standing at `position`.
    Inside {
        /// The building the agent occupies.
        building_id: BuildingId,
        /// The agent's world position.
        position: Position,
    },
    /// In the open.
    Outside {
        /// The agent's world position.
        position: Position,
    },
}

impl Whereabouts {
    /// The agent's world position.
    pub const fn position(&self) -> Position {
        match self {
            Self::Inside { position, .. } | Self::Outside { position } => *position,
        }
    }

    /// The occupied building, if inside one.
    pub const fn building_id(&self) -> Option<BuildingId> {
        match self {
            Self::Inside { building_id, .. } => Some(*building_id),
            Self::Outside { .. } => None,
        }
    }

    /// Whether the agent is outdoors.
    pub const fn is_outside(&self) -> bool {
        matches!(self, Self::Outside { .. })
    }
}

/// What an agent is doing right now and where it is headed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStatus {
    /// Current activity.
    pub activity: Activity,
    /// Destination of an in-progress movement.
    pub destination: Option<Position>,
    /// Building the agent intends to enter on arrival.
    pub target_building: Option<BuildingId>,
}

/// One entry of an agent's append-only history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Wall-clock time the entry was written.
    pub recorded_at: DateTime<Utc>,
    /// Snapshot of the agent's status at that time.
    pub status: AgentStatus,
    /// Human-readable description.
    pub description: String,
}

/// A simulated inhabitant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    /// Unique identifier.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: u32,
    /// Trade.
    pub profession: Profession,
    /// Personality tag.
    pub personality: Personality,
    /// Short biography.
    pub background: String,
    /// Needs vector.
    pub needs: Needs,
    /// Health.
    pub health: Level,
    /// Happiness, derived from needs and health each tick.
    pub happiness: Level,
    /// Current location.
    pub whereabouts: Whereabouts,
    /// Current activity and travel intent.
    pub status: AgentStatus,
    /// Append-only log.
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    /// Hour of day to scheduled activity.
    #[serde(default)]
    pub schedule: BTreeMap<u8, Activity>,
    /// The agent's own residence.
    #[serde(default)]
    pub home: Option<BuildingId>,
}

impl Agent {
    /// Create an agent standing outside at `position`, resting, in full
    /// health.
    pub fn new(
        name: impl Into<String>,
        age: u32,
        profession: Profession,
        personality: Personality,
        needs: Needs,
        position: Position,
    ) -> Self {
        let name = name.into();
        let background =
            format!("{name} is a {age}-year-old {profession} with a {personality} personality.");
        Self {
            id: AgentId::new(),
            name,
            age,
            profession,
            personality,
            background,
            needs,
            health: Level::FULL,
            happiness: Level::FULL,
            whereabouts: Whereabouts::Outside { position },
            status: AgentStatus::default(),
            history: Vec::new(),
            schedule: BTreeMap::new(),
            home: None,
        }
    }

    /// Current world position.
    pub const fn position(&self) -> Position {
        self.whereabouts.position()
    }

    /// Building the agent is inside, if any.
    pub const fn building_id(&self) -> Option<BuildingId> {
        self.whereabouts.building_id()
    }

    /// Whether the agent is outdoors.
    pub const fn is_outside(&self) -> bool {
        self.whereabouts.is_outside()
    }

    /// Move the agent without changing whether it is inside or outside.
    pub const fn set_position(&mut self, position: Position) {
        self.whereabouts = match self.whereabouts {
            Whereabouts::Inside { building_id, .. } => Whereabouts::Inside {
                building_id,
                position,
            },
            Whereabouts::Outside { .. } => Whereabouts::Outside { position },
        };
    }

    /// Append a history entry stamped with the current status.
    pub fn record(&mut self, description: impl Into<String>) {
        self.history.push(HistoryEntry {
            recorded_at: Utc::now(),
            status: self.status,
            description: description.into(),
        });
    }

    /// The most recent history entry.
    pub fn last_entry(&self) -> Option<&HistoryEntry> {
        self.history.last()
    }
}

// ---------------------------------------------------------------------------
// Building
// ---------------------------------------------------------------------------

/// A building in the town.
///
/// Occupants are private: the only way in is [`Building::admit`], which
/// refuses once `capacity` is reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Building {
    /// Unique identifier.
    pub id: BuildingId,
    /// Display name.
    pub name: String,
    /// Kind of building.
    pub building_type: BuildingType,
    /// World position of the footprint's origin corner.
    pub position: Position,
    /// Explicit footprint; a configured default applies when absent.
    #[serde(default)]
    pub footprint: Option<Footprint>,
    /// Maximum simultaneous occupants.
    pub capacity: u32,
    /// Current occupants.
    #[serde(default)]
    occupants: Vec<AgentId>,
    /// Opening hour, `0..=24`.
    pub opening_hour: u8,
    /// Closing hour, `0..=24`. Smaller than `opening_hour` for places
    /// open past midnight.
    pub closing_hour: u8,
    /// Services offered.
    #[serde(default)]
    pub services: BTreeSet<Service>,
}

impl Building {
    /// Create an always-open building with no services.
    pub fn new(
        name: impl Into<String>,
        building_type: BuildingType,
        position: Position,
        capacity: u32,
    ) -> Self {
        Self {
            id: BuildingId::new(),
            name: name.into(),
            building_type,
            position,
            footprint: None,
            capacity,
            occupants: Vec::new(),
            opening_hour: 0,
            closing_hour: 24,
            services: BTreeSet::new(),
        }
    }

    /// Set opening hours.
    #[must_use]
    pub const fn with_hours(mut self, opening_hour: u8, closing_hour: u8) -> Self {
        self.opening_hour = opening_hour;
        self.closing_hour = closing_hour;
        self
    }

    /// Set offered services.
    #[must_use]
    pub fn with_services(mut self, services: impl IntoIterator<Item = Service>) -> Self {
        self.services = services.into_iter().collect();
        self
    }

    /// Set an explicit footprint.
    #[must_use]
    pub const fn with_footprint(mut self, width: u32, height: u32) -> Self {
        self.footprint = Some(Footprint { width, height });
        self
    }

    /// Whether the building is open at `hour`.
    ///
    /// `0..24` means always open. A closing hour below the opening hour
    /// wraps past midnight.
    pub const fn is_open(&self, hour: u8) -> bool {
        let (open, close) = (self.opening_hour, self.closing_hour);
        if open == 0 && close >= 24 {
            return true;
        }
        if open < close {
            hour >= open && hour < close
        } else {
            hour >= open || hour < close
        }
    }

    /// Whether the building offers `service`.
    pub fn offers(&self, service: Service) -> bool {
        self.services.contains(&service)
    }

    /// Current occupants.
    pub fn occupants(&self) -> &[AgentId] {
        &self.occupants
    }

    /// Whether another occupant fits.
    pub fn has_capacity(&self) -> bool {
        u32::try_from(self.occupants.len()).is_ok_and(|n| n < self.capacity)
    }

    /// Whether `agent_id` is inside.
    pub fn contains(&self, agent_id: AgentId) -> bool {
        self.occupants.contains(&agent_id)
    }

    /// Add an occupant. Returns `false` (and changes nothing) when full.
    /// Admitting an agent already inside is a no-op success.
    pub fn admit(&mut self, agent_id: AgentId) -> bool {
        if self.contains(agent_id) {
            return true;
        }
        if !self.has_capacity() {
            return false;
        }
        self.occupants.push(agent_id);
        true
    }

    /// Remove an occupant. Returns whether it was present.
    pub fn release(&mut self, agent_id: AgentId) -> bool {
        let before = self.occupants.len();
        self.occupants.retain(|id| *id != agent_id);
        self.occupants.len() != before
    }

    /// Remove every occupant.
    pub fn clear_occupants(&mut self) {
        self.occupants.clear();
    }
}

// ---------------------------------------------------------------------------
// Decor
// ---------------------------------------------------------------------------

/// A decorative element (tree, fountain, wall) that may block movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecorElement {
    /// Unique identifier.
    #[serde(default)]
    pub id: DecorId,
    /// Display name.
    pub name: String,
    /// Center.
    pub position: Position,
    /// Radius in world units.
    pub radius: f64,
    /// Whether agents must walk around it.
    #[serde(default)]
    pub blocking: bool,
}

// ---------------------------------------------------------------------------
// Narrative events
// ---------------------------------------------------------------------------

/// A time-bounded narrative occurrence with scheduled need impacts.
///
/// Impacts are spread over the event's duration: after `m` of `d`
/// in-world minutes, `m / d` of each delta has been applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEvent {
    /// Unique identifier.
    pub id: EventId,
    /// Kind of event.
    pub event_type: EventType,
    /// Narrative description.
    pub description: String,
    /// Agents taking part.
    pub involved: Vec<AgentId>,
    /// In-world minute (clock total) the event started.
    pub started_at: u64,
    /// Length in in-world minutes.
    pub duration_minutes: u64,
    /// Total need delta per involved agent over the whole event.
    pub impacts: BTreeMap<AgentId, BTreeMap<Need, f64>>,
    /// In-world minutes of impact already applied.
    #[serde(default)]
    pub applied_minutes: u64,
    /// Whether the event is still running.
    pub active: bool,
    /// Agents that already reacted.
    #[serde(default)]
    pub reacted: BTreeSet<AgentId>,
}

impl ActiveEvent {
    /// In-world minutes since the start at world minute `now`, capped at
    /// the duration.
    pub fn elapsed(&self, now: u64) -> u64 {
        now.saturating_sub(self.started_at).min(self.duration_minutes)
    }

    /// Whether the event has run its full course at `now`.
    pub fn is_over(&self, now: u64) -> bool {
        now.saturating_sub(self.started_at) >= self.duration_minutes
    }

    /// Whether `agent_id` takes part.
    pub fn involves(&self, agent_id: AgentId) -> bool {
        self.involved.contains(&agent_id)
    }
}

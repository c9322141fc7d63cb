//! The building registry: an id-keyed arena of every building in town.
//!
//! Agents reference buildings by [`BuildingId`] and buildings reference
//! their occupants by [`AgentId`]; neither owns the other. Occupancy only
//! changes through [`BuildingRegistry::add_occupant`] and
//! [`BuildingRegistry::remove_occupant`], which keep
//! `occupants.len() <= capacity` at all times.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use townsfolk_types::{AgentId, Building, BuildingId, BuildingType, Footprint, Position, Service};
use tracing::debug;

use crate::error::WorldError;

/// A building as described in configuration, before it gets an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingSpec {
    /// Display name.
    pub name: String,
    /// Kind of building.
    pub building_type: BuildingType,
    /// World position of the footprint origin.
    pub position: Position,
    /// Explicit footprint in cells.
    #[serde(default)]
    pub footprint: Option<Footprint>,
    /// Maximum occupants.
    pub capacity: u32,
    /// Opening hour.
    #[serde(default)]
    pub opening_hour: u8,
    /// Closing hour.
    #[serde(default = "default_closing_hour")]
    pub closing_hour: u8,
    /// Offered services.
    #[serde(default)]
    pub services: BTreeSet<Service>,
}

impl BuildingSpec {
    /// Materialize this entry as a fresh, empty building.
    pub fn to_building(&self) -> Building {
        let mut building = Building::new(
            self.name.clone(),
            self.building_type,
            self.position,
            self.capacity,
        )
        .with_hours(self.opening_hour, self.closing_hour)
        .with_services(self.services.iter().copied());
        building.footprint = self.footprint;
        building
    }
}

const fn default_closing_hour() -> u8 {
    24
}

/// Id-keyed store of buildings.
#[derive(Debug, Clone, Default)]
pub struct BuildingRegistry {
    buildings: BTreeMap<BuildingId, Building>,
}

impl BuildingRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry from already-built buildings.
    pub fn from_buildings(buildings: impl IntoIterator<Item = Building>) -> Self {
        Self {
            buildings: buildings.into_iter().map(|b| (b.id, b)).collect(),
        }
    }

    /// Create a registry from configuration specs.
    pub fn from_specs(specs: &[BuildingSpec]) -> Self {
        Self::from_buildings(specs.iter().map(BuildingSpec::to_building))
    }

    /// Insert or replace a building, returning its id.
    pub fn insert(&mut self, building: Building) -> BuildingId {
        let id = building.id;
        self.buildings.insert(id, building);
        id
    }

    /// Remove a building.
    pub fn remove(&mut self, id: BuildingId) -> Option<Building> {
        self.buildings.remove(&id)
    }

    /// Look up a building.
    pub fn get(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(&id)
    }

    /// Number of buildings.
    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    /// All buildings, in id order.
    pub fn get_buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    /// Buildings offering `service`, open or not.
    pub fn get_by_service(&self, service: Service) -> Vec<&Building> {
        self.buildings.values().filter(|b| b.offers(service)).collect()
    }

    /// Buildings of one type.
    pub fn get_by_type(&self, building_type: BuildingType) -> Vec<&Building> {
        self.buildings
            .values()
            .filter(|b| b.building_type == building_type)
            .collect()
    }

    /// Buildings offering `service` that are open at `hour`.
    pub fn open_offering(&self, service: Service, hour: u8) -> Vec<&Building> {
        self.buildings
            .values()
            .filter(|b| b.offers(service) && b.is_open(hour))
            .collect()
    }

    /// Buildings matching `predicate`, nearest to `from` first.
    pub fn by_distance<F>(&self, from: Position, predicate: F) -> Vec<&Building>
    where
        F: Fn(&Building) -> bool,
    {
        let mut matching: Vec<&Building> =
            self.buildings.values().filter(|b| predicate(b)).collect();
        matching.sort_by(|a, b| {
            from.distance_to(a.position)
                .total_cmp(&from.distance_to(b.position))
        });
        matching
    }

    /// The nearest building offering `service` that is open at `hour`.
    pub fn nearest_open_offering(&self, service: Service, from: Position, hour: u8) -> Option<&Building> {
        self.by_distance(from, |b| b.offers(service) && b.is_open(hour))
            .into_iter()
            .next()
    }

    /// Register `agent_id` inside `building_id`.
    ///
    /// Adding an agent that is already inside succeeds without change.
    ///
    /// # Errors
    ///
    /// [`WorldError::BuildingNotFound`] for an unknown building,
    /// [`WorldError::BuildingAtCapacity`] when it is full.
    pub fn add_occupant(&mut self, building_id: BuildingId, agent_id: AgentId) -> Result<(), WorldError> {
        let building = self
            .buildings
            .get_mut(&building_id)
            .ok_or(WorldError::BuildingNotFound(building_id))?;
        if !building.admit(agent_id) {
            return Err(WorldError::BuildingAtCapacity {
                building: building_id,
                capacity: building.capacity,
            });
        }
        debug!(
            building = %building.name,
            agent_id = %agent_id,
            occupants = building.occupants().len(),
            "Occupant added"
        );
        Ok(())
    }

    /// Remove `agent_id` from `building_id`.
    ///
    /// # Errors
    ///
    /// [`WorldError::BuildingNotFound`] for an unknown building,
    /// [`WorldError::AgentNotInBuilding`] if the agent was not inside.
    pub fn remove_occupant(&mut self, building_id: BuildingId, agent_id: AgentId) -> Result<(), WorldError> {
        let building = self
            .buildings
            .get_mut(&building_id)
            .ok_or(WorldError::BuildingNotFound(building_id))?;
        if !building.release(agent_id) {
            return Err(WorldError::AgentNotInBuilding {
                agent: agent_id,
                building: building_id,
            });
        }
        Ok(())
    }

    /// Remove `agent_id` from every building it appears in.
    pub fn evict_everywhere(&mut self, agent_id: AgentId) {
        for building in self.buildings.values_mut() {
            let _ = building.release(agent_id);
        }
    }

    /// Empty every building.
    pub fn clear_occupants(&mut self) {
        for building in self.buildings.values_mut() {
            building.clear_occupants();
        }
    }
}

//! Persistence contract.
//!
//! The simulation saves agents and buildings periodically, deletes agents
//! it removes, and reloads agents on reset. Saves are fire-and-forget: a
//! failed save is logged and the tick carries on.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use townsfolk_types::{Agent, AgentId, Building, BuildingId};

/// Errors from a persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// The backend rejected or failed the operation.
    #[error("persistence backend error: {message}")]
    Backend {
        /// Backend error description.
        message: String,
    },
}

/// Everything a backend holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    /// Saved agents.
    pub agents: Vec<Agent>,
    /// Saved buildings.
    pub buildings: Vec<Building>,
}

/// Storage for agents and buildings.
pub trait Persistence: Send + Sync {
    /// Store the current state of one agent.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the backend fails.
    fn save_agent(&self, agent: &Agent) -> Result<(), PersistenceError>;

    /// Store the current state of one building.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the backend fails.
    fn save_building(&self, building: &Building) -> Result<(), PersistenceError>;

    /// Forget a stored agent. Deleting an agent that was never saved is not
    /// an error.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the backend fails.
    fn delete_agent(&self, agent_id: AgentId) -> Result<(), PersistenceError>;

    /// Load everything stored.
    ///
    /// # Errors
    ///
    /// Returns [`PersistenceError`] if the backend fails.
    fn load_all(&self) -> Result<Snapshot, PersistenceError>;
}

/// Process-local storage, used by the engine and tests.
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    agents: Mutex<BTreeMap<AgentId, Agent>>,
    buildings: Mutex<BTreeMap<BuildingId, Building>>,
}

impl InMemoryPersistence {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored agents.
    pub fn agent_count(&self) -> usize {
        self.agents.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Number of stored buildings.
    pub fn building_count(&self) -> usize {
        self.buildings.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Persistence for InMemoryPersistence {
    fn save_agent(&self, agent: &Agent) -> Result<(), PersistenceError> {
        self.agents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(agent.id, agent.clone());
        Ok(())
    }

    fn save_building(&self, building: &Building) -> Result<(), PersistenceError> {
        self.buildings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(building.id, building.clone());
        Ok(())
    }

    fn delete_agent(&self, agent_id: AgentId) -> Result<(), PersistenceError> {
        let _ = self
            .agents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&agent_id);
        Ok(())
    }

    fn load_all(&self) -> Result<Snapshot, PersistenceError> {
        let agents = self
            .agents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        let buildings = self
            .buildings
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        Ok(Snapshot { agents, buildings })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use townsfolk_types::{BuildingType, Needs, Personality, Position, Profession};

    use super::*;

    fn make_agent(name: &str) -> Agent {
        Agent::new(
            name,
            52,
            Profession::Priest,
            Personality::Wise,
            Needs::uniform(80.0),
            Position::default(),
        )
    }

    #[test]
    fn saves_overwrite_by_id() {
        let store = InMemoryPersistence::new();
        let mut agent = make_agent("Odo");
        store.save_agent(&agent).unwrap();
        agent.needs.hunger = townsfolk_types::Level::new(12.0);
        store.save_agent(&agent).unwrap();
        store.save_agent(&make_agent("Pia")).unwrap();

        let snapshot = store.load_all().unwrap();
        assert_eq!(snapshot.agents.len(), 2);
        let saved = snapshot.agents.iter().find(|a| a.id == agent.id).unwrap();
        assert_eq!(saved.needs.hunger, agent.needs.hunger);
    }

    #[test]
    fn buildings_are_stored() {
        let store = InMemoryPersistence::new();
        let temple = Building::new("Temple", BuildingType::Temple, Position::new(-5.0, -10.0), 30);
        store.save_building(&temple).unwrap();
        assert_eq!(store.building_count(), 1);
        assert_eq!(store.load_all().unwrap().buildings, vec![temple]);
    }

    #[test]
    fn delete_removes_agent() {
        let store = InMemoryPersistence::new();
        let agent = make_agent("Odo");
        store.save_agent(&agent).unwrap();
        store.delete_agent(agent.id).unwrap();
        assert_eq!(store.agent_count(), 0);
        store.delete_agent(agent.id).unwrap();
    }
}

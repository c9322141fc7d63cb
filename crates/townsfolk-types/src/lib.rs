//! Shared type definitions for the Townsfolk NPC simulation.
//!
//! This crate is the single source of truth for the data model shared by
//! the needs model, the world (grid and registries), and the simulation
//! core.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for all entity identifiers
//! - [`enums`] -- Needs, activities, building types, services, weather,
//!   personalities, professions, event types
//! - [`structs`] -- Agents, buildings, decor, narrative events, and the
//!   clamped [`Level`] scalar

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Activity, BuildingType, EventType, Need, Personality, Profession, Service, Weather};
pub use ids::{AgentId, BuildingId, DecorId, EventId};
pub use structs::{
    ActiveEvent, Agent, AgentStatus, Building, DecorElement, Footprint, HistoryEntry, LEVEL_MAX,
    LEVEL_MIN, Level, Needs, Position, Whereabouts,
};

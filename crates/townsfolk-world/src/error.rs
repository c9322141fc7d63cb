//! Error types for the `townsfolk-world` crate.
//!
//! All fallible operations in this crate return [`WorldError`].

use townsfolk_types::{AgentId, BuildingId};

/// Errors from the grid and the registries.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// A building was not found in the registry.
    #[error("building not found: {0}")]
    BuildingNotFound(BuildingId),

    /// The building has reached its maximum occupant capacity.
    #[error("building {building} is at capacity ({capacity})")]
    BuildingAtCapacity {
        /// The full building.
        building: BuildingId,
        /// Maximum capacity.
        capacity: u32,
    },

    /// The agent is not among the building's occupants.
    #[error("agent {agent} is not inside building {building}")]
    AgentNotInBuilding {
        /// The agent.
        agent: AgentId,
        /// The building.
        building: BuildingId,
    },

    /// A path endpoint lies outside the grid.
    #[error("cell ({x}, {y}) is outside the grid")]
    OutOfBounds {
        /// Grid column.
        x: i32,
        /// Grid row.
        y: i32,
    },

    /// The goal cell is blocked by a building or decor.
    #[error("goal cell ({x}, {y}) is blocked")]
    GoalBlocked {
        /// Grid column.
        x: i32,
        /// Grid row.
        y: i32,
    },

    /// The search exhausted every reachable cell without finding the goal.
    #[error("no path from ({from_x}, {from_y}) to ({to_x}, {to_y})")]
    NoPath {
        /// Start column.
        from_x: i32,
        /// Start row.
        from_y: i32,
        /// Goal column.
        to_x: i32,
        /// Goal row.
        to_y: i32,
    },

    /// Grid dimensions or scale are unusable.
    #[error("invalid grid configuration: {reason}")]
    InvalidGrid {
        /// Explanation of what is wrong.
        reason: String,
    },
}

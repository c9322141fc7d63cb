//! Physical layer of the Townsfolk simulation.
//!
//! This crate owns everything agents walk through and into: the building
//! and decor registries, the walkability grid with its A* search, and
//! weather rolls.
//!
//! # Modules
//!
//! - [`buildings`] -- [`BuildingRegistry`], the id-keyed arena of buildings
//!   and the only place occupancy changes.
//! - [`decor`] -- [`DecorRegistry`] for fountains, trees, and other
//!   obstacles.
//! - [`environment`] -- Weather rolls for each new day.
//! - [`error`] -- Error types for registry and grid operations.
//! - [`grid`] -- [`PathGrid`]: world-to-cell projection, obstacle
//!   rasterization, and 8-directional shortest paths.

pub mod buildings;
pub mod decor;
pub mod environment;
pub mod error;
pub mod grid;

pub use buildings::{BuildingRegistry, BuildingSpec};
pub use decor::DecorRegistry;
pub use environment::roll_weather;
pub use error::WorldError;
pub use grid::{Cell, GridConfig, PathGrid};

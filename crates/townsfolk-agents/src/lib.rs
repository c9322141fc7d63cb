//! Needs model for Townsfolk agents.
//!
//! This crate holds the pure arithmetic that moves an agent's needs,
//! health and happiness. It never touches the world, the clock or I/O;
//! the simulation core calls into it once per tick.
//!
//! # Modules
//!
//! - [`config`] -- Decay rates, emergency floors and weather multipliers ([`NeedsConfig`])
//! - [`describe`] -- Activity description lines for history entries
//! - [`error`] -- Error types ([`AgentError`])
//! - [`needs`] -- Decay, activity replenishment, building-entry satisfaction, happiness

pub mod config;
pub mod describe;
pub mod error;
pub mod needs;

// Re-export primary types at crate root for convenience.
pub use config::NeedsConfig;
pub use describe::describe_activity;
pub use error::AgentError;
pub use needs::{
    DecayOutcome, EntryEffect, activity_gains, decay, entry_effect, happiness, random_needs,
    replenish_by_activity, satisfy_on_entry,
};

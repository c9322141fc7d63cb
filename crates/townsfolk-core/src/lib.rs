//! World clock, decisions, movement, and the tick scheduler for the
//! Townsfolk simulation.
//!
//! # Modules
//!
//! - [`clock`] -- In-world day, time and weather.
//! - [`config`] -- Configuration loading from `townsfolk-config.yaml` into
//!   strongly-typed structs.
//! - [`movement`] -- Per-agent path following and the arrival queue.
//! - [`decision`] -- The [`DecisionPolicy`] seam shared by both urgency
//!   policies.
//! - [`resolver`] -- [`LowestNeedPolicy`], the default policy.
//! - [`behavior`] -- Behavior tree nodes and [`BehaviorTreePolicy`].
//! - [`events`] -- Narrative event payload parsing and the active event
//!   book.
//! - [`narrative`] -- The external text generator contract and the bridge
//!   that runs its calls off the tick path.
//! - [`persistence`] -- Storage contract for agents and buildings.
//! - [`tick`] -- [`Simulation`] and its per-tick phases.
//! - [`operator`] -- Shared scheduler control flags.
//! - [`scheduler`] -- Wall-clock [`Scheduler`] with start, pause and reset.
//!
//! [`DecisionPolicy`]: decision::DecisionPolicy
//! [`LowestNeedPolicy`]: resolver::LowestNeedPolicy
//! [`BehaviorTreePolicy`]: behavior::BehaviorTreePolicy
//! [`Simulation`]: tick::Simulation
//! [`Scheduler`]: scheduler::Scheduler

pub mod behavior;
pub mod clock;
pub mod config;
pub mod decision;
pub mod events;
pub mod movement;
pub mod narrative;
pub mod operator;
pub mod persistence;
pub mod resolver;
pub mod scheduler;
pub mod tick;

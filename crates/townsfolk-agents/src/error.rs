//! Error types for the townsfolk-agents crate.
//!
//! Need arithmetic itself cannot fail (every mutation clamps), so the only
//! failures here come from invalid tuning parameters.

/// Errors that can occur in the needs model.
#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    /// A configured rate or multiplier is negative or not finite.
    #[error("invalid needs parameter {name}: {value}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// The rejected value.
        value: f64,
    },
}

//! Weather rolls for the Townsfolk simulation.
//!
//! Weather changes once per in-world day. Each kind is equally likely;
//! the caller owns the RNG so that a seeded generator gives reproducible
//! runs.

use rand::Rng;
use townsfolk_types::Weather;

/// Pick the weather for a new day uniformly from [`Weather::ALL`].
pub fn roll_weather<R: Rng + ?Sized>(rng: &mut R) -> Weather {
    let index = rng.random_range(0..Weather::ALL.len());
    Weather::ALL.get(index).copied().unwrap_or_default()
}

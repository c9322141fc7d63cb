//! Agent spawner for seeding the town.
//!
//! The first agents are the town's founders (mayor, innkeeper, smith,
//! librarian, guard); any further seats are filled with random names,
//! professions and personalities. Every agent gets randomized starting
//! needs, a working-hours schedule, and a home drawn round-robin from the
//! town's residences. Agents with a home start inside it.

use std::collections::BTreeSet;

use rand::Rng;
use townsfolk_agents::random_needs;
use townsfolk_types::{Activity, Agent, BuildingType, Personality, Position, Profession, Whereabouts};
use townsfolk_world::{BuildingRegistry, PathGrid};
use tracing::{debug, info};

use crate::error::EngineError;

/// First hour of the working day in seeded schedules.
const WORK_STARTS: u8 = 9;

/// Hour the working day ends in seeded schedules.
const WORK_ENDS: u8 = 17;

/// The town's founders, spawned first.
const FOUNDERS: &[(&str, u32, Profession, Personality)] = &[
    ("Edmund Castell", 58, Profession::Mayor, Personality::Strict),
    ("Marielle Brook", 42, Profession::Innkeeper, Personality::Jovial),
    ("Gunther Ironhand", 39, Profession::Blacksmith, Personality::Grumpy),
    ("Elisabeth Quill", 65, Profession::Librarian, Personality::Wise),
    ("Roland Vigil", 32, Profession::Guard, Personality::Helpful),
];

/// Names for agents beyond the founders, picked without replacement.
const NAME_POOL: &[&str] = &[
    "Alder", "Bertram", "Cecily", "Dunstan", "Edith", "Fenwick", "Gisela", "Hob",
    "Isolde", "Jasper", "Kenrick", "Linnet", "Mabel", "Nestor", "Odo", "Perrin",
    "Quenby", "Rowena", "Sibyl", "Tobin", "Ulric", "Verity", "Wystan", "Yvaine",
];

/// Create `count` agents for `buildings`.
///
/// # Errors
///
/// Returns [`EngineError::Spawner`] if `count` exceeds the founders plus
/// the name pool.
pub fn spawn_seed_agents<R: Rng + ?Sized>(
    count: u32,
    buildings: &BuildingRegistry,
    grid: &PathGrid,
    rng: &mut R,
) -> Result<Vec<Agent>, EngineError> {
    let count = usize::try_from(count).unwrap_or(usize::MAX);
    let capacity = FOUNDERS.len().saturating_add(NAME_POOL.len());
    if count > capacity {
        return Err(EngineError::Spawner {
            message: format!("requested {count} agents but only {capacity} names are available"),
        });
    }

    let homes = buildings.get_by_type(BuildingType::Residence);
    let mut used_names = BTreeSet::new();
    let mut agents = Vec::with_capacity(count);

    for seat in 0..count {
        let mut agent = if let Some((name, age, profession, personality)) = FOUNDERS.get(seat) {
            Agent::new(*name, *age, *profession, *personality, random_needs(rng), Position::default())
        } else {
            let name = pick_unused_name(rng, &used_names)?;
            let age = rng.random_range(18..70);
            let profession = pick(rng, &Profession::ALL).unwrap_or(Profession::Farmer);
            let personality = pick(rng, &Personality::ALL).unwrap_or(Personality::Friendly);
            Agent::new(name, age, profession, personality, random_needs(rng), Position::default())
        };
        used_names.insert(agent.name.clone());

        for hour in WORK_STARTS..WORK_ENDS {
            agent.schedule.insert(hour, Activity::Work);
        }

        if !homes.is_empty()
            && let Some(home) = homes.get(seat % homes.len())
        {
            agent.home = Some(home.id);
            if let Some(door) = grid.free_cell_near_building(home, home.position) {
                agent.whereabouts = Whereabouts::Inside {
                    building_id: home.id,
                    position: door,
                };
            }
        }

        debug!(agent = %agent.name, profession = %agent.profession, home = ?agent.home, "Agent seeded");
        agents.push(agent);
    }

    info!(count = agents.len(), homes = homes.len(), "Seed agents spawned");
    Ok(agents)
}

/// Pick a random unused name from the name pool.
fn pick_unused_name<R: Rng + ?Sized>(rng: &mut R, used: &BTreeSet<String>) -> Result<String, EngineError> {
    let available: Vec<&str> = NAME_POOL.iter().copied().filter(|n| !used.contains(*n)).collect();
    pick(rng, &available)
        .map(String::from)
        .ok_or_else(|| EngineError::Spawner {
            message: String::from("name pool exhausted"),
        })
}

fn pick<R: Rng + ?Sized, T: Copy>(rng: &mut R, items: &[T]) -> Option<T> {
    if items.is_empty() {
        return None;
    }
    items.get(rng.random_range(0..items.len())).copied()
}

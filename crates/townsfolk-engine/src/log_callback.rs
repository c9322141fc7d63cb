//! Tick callback that reports the town through `tracing`.
//!
//! Every tick gets a one-line summary at debug level. Once per in-world
//! hour the callback also logs each agent's state at info level, and the
//! ASCII map at trace level.

use townsfolk_core::scheduler::TickCallback;
use townsfolk_core::tick::{Simulation, TickSummary};
use tracing::{debug, enabled, info, trace, Level};

/// Logs tick summaries and an hourly roster.
#[derive(Debug, Default)]
pub struct LogCallback {
    last_hour: Option<u8>,
}

impl LogCallback {
    /// Create a callback that reports at the next tick.
    pub const fn new() -> Self {
        Self { last_hour: None }
    }

    /// Whether this tick starts a new in-world hour.
    fn hour_turned(&mut self, hour: u8) -> bool {
        let turned = self.last_hour != Some(hour);
        self.last_hour = Some(hour);
        turned
    }
}

impl TickCallback for LogCallback {
    fn on_tick(&mut self, summary: &TickSummary, simulation: &Simulation) {
        debug!(
            tick = summary.tick,
            clock = %summary.clock,
            arrivals = summary.arrivals,
            entries = summary.entries,
            failed_entries = summary.failed_entries,
            movements_started = summary.movements_started,
            events_registered = summary.events_registered,
            events_ended = summary.events_ended,
            "Tick summary"
        );

        if !self.hour_turned(summary.clock.hour()) {
            return;
        }

        for agent in simulation.agents() {
            let place = agent
                .building_id()
                .and_then(|id| simulation.buildings().get(id))
                .map_or_else(|| String::from("outside"), |b| b.name.clone());
            info!(
                tick = summary.tick,
                agent = %agent.name,
                activity = %agent.status.activity,
                place = %place,
                health = %agent.health,
                happiness = %agent.happiness,
                hunger = %agent.needs.hunger,
                thirst = %agent.needs.thirst,
                fatigue = %agent.needs.fatigue,
                moving = simulation.movement().is_moving(agent.id),
                "Agent status"
            );
        }
        info!(
            clock = %summary.clock,
            active_events = simulation.events().len(),
            "Hourly report"
        );

        if enabled!(Level::TRACE) {
            trace!(map = %simulation.render_ascii(), "Town map");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_once_per_hour() {
        let mut callback = LogCallback::new();
        assert!(callback.hour_turned(8));
        assert!(!callback.hour_turned(8));
        assert!(callback.hour_turned(9));
    }
}

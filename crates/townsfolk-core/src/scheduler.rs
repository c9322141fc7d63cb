//! Wall-clock scheduler around the [`Simulation`].
//!
//! The scheduler starts paused. [`Scheduler::start`] marks it running,
//! optionally runs one tick straight away, and spawns a loop task that runs
//! a tick every interval. [`Scheduler::pause`] stops future ticks and waits
//! for a tick already in progress to finish; nothing is rolled back.
//!
//! The simulation sits behind a [`tokio::sync::Mutex`] so ticks never
//! overlap, and anything else that touches it (operator hooks, status
//! queries) is serialized with the tick loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::operator::{SchedulerControl, SchedulerStatus};
use crate::tick::{Simulation, SimulationError, TickSummary};

/// Errors raised by the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// A tick or reset failed.
    #[error("simulation error: {source}")]
    Simulation {
        /// The underlying simulation error.
        #[from]
        source: SimulationError,
    },
}

/// Callback invoked after each tick completes.
pub trait TickCallback: Send {
    /// Called with the finished tick and the simulation it ran on.
    fn on_tick(&mut self, summary: &TickSummary, simulation: &Simulation);
}

/// A tick callback that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _simulation: &Simulation) {}
}

/// Drives a [`Simulation`] on a fixed wall-clock interval.
pub struct Scheduler {
    simulation: Arc<Mutex<Simulation>>,
    control: Arc<SchedulerControl>,
    callback: Arc<Mutex<Box<dyn TickCallback>>>,
    run_first_tick_immediately: bool,
    handle: Option<JoinHandle<()>>,
}

impl core::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Scheduler")
            .field("control", &self.control)
            .field("run_first_tick_immediately", &self.run_first_tick_immediately)
            .field("looping", &self.handle.is_some())
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Wrap `simulation`, taking the interval and first-tick behavior from
    /// its world configuration.
    pub fn new(simulation: Simulation, callback: Box<dyn TickCallback>) -> Self {
        let world = &simulation.config().world;
        let control = Arc::new(SchedulerControl::new(world.tick_interval_ms));
        let run_first_tick_immediately = world.run_first_tick_immediately;
        Self {
            simulation: Arc::new(Mutex::new(simulation)),
            control,
            callback: Arc::new(Mutex::new(callback)),
            run_first_tick_immediately,
            handle: None,
        }
    }

    /// Shared handle to the simulation.
    pub fn simulation(&self) -> Arc<Mutex<Simulation>> {
        Arc::clone(&self.simulation)
    }

    /// Shared control state.
    pub fn control(&self) -> Arc<SchedulerControl> {
        Arc::clone(&self.control)
    }

    /// Whether periodic ticks are scheduled.
    pub fn is_running(&self) -> bool {
        self.control.is_running()
    }

    /// Current status.
    pub async fn status(&self) -> SchedulerStatus {
        self.control.status().await
    }

    /// Start ticking. Returns `Ok(false)` without doing anything if already
    /// running.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] if the immediate first tick fails; the
    /// scheduler is left paused.
    pub async fn start(&mut self) -> Result<bool, SchedulerError> {
        if !self.control.begin() {
            return Ok(false);
        }
        // A loop from an earlier run may still be winding down.
        if let Some(stale) = self.handle.take()
            && let Err(e) = stale.await
        {
            warn!(error = %e, "Previous scheduler loop ended abnormally");
        }
        info!(tick_interval_ms = self.control.tick_interval_ms(), "Scheduler started");

        if self.run_first_tick_immediately
            && let Err(e) = run_one(&self.simulation, &self.control, &self.callback).await
        {
            let _ = self.control.halt();
            return Err(e.into());
        }

        self.handle = Some(tokio::spawn(run_loop(
            Arc::clone(&self.simulation),
            Arc::clone(&self.control),
            Arc::clone(&self.callback),
        )));
        Ok(true)
    }

    /// Stop scheduling ticks. A tick in progress completes first.
    /// Idempotent.
    pub async fn pause(&mut self) {
        if self.control.halt() {
            info!(ticks_run = self.control.ticks_run(), "Scheduler paused");
        }
        if let Some(handle) = self.handle.take()
            && let Err(e) = handle.await
        {
            warn!(error = %e, "Scheduler loop ended abnormally");
        }
    }

    /// Pause, then return the simulation to its starting state.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError`] if the simulation could not be reset.
    pub async fn reset(&mut self) -> Result<(), SchedulerError> {
        self.pause().await;
        self.simulation.lock().await.reset().await?;
        self.control.reset_counters().await;
        info!("Scheduler reset");
        Ok(())
    }
}

/// Run one tick and hand it to the callback.
async fn run_one(
    simulation: &Mutex<Simulation>,
    control: &SchedulerControl,
    callback: &Mutex<Box<dyn TickCallback>>,
) -> Result<TickSummary, SimulationError> {
    let mut sim = simulation.lock().await;
    let summary = sim.run_tick()?;
    control.record_tick().await;
    callback.lock().await.on_tick(&summary, &sim);
    Ok(summary)
}

/// Tick every interval until the control flag drops.
async fn run_loop(
    simulation: Arc<Mutex<Simulation>>,
    control: Arc<SchedulerControl>,
    callback: Arc<Mutex<Box<dyn TickCallback>>>,
) {
    while control.is_running() {
        let interval = Duration::from_millis(control.tick_interval_ms());
        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            () = control.changed() => continue,
        }
        if !control.is_running() {
            break;
        }
        if let Err(e) = run_one(&simulation, &control, &callback).await {
            error!(error = %e, "Tick failed, stopping scheduler");
            let _ = control.halt();
            break;
        }
    }
}

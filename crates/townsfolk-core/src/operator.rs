//! Shared control state for the scheduler.
//!
//! [`SchedulerControl`] is wrapped in [`Arc`](std::sync::Arc) and shared
//! between the scheduler's loop task and whoever drives it (the engine, an
//! admin surface, tests). Atomic fields keep the loop's checks lock-free.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, Notify};

use crate::config::MIN_TICK_INTERVAL_MS;

/// Control flags read by the scheduler loop.
#[derive(Debug)]
pub struct SchedulerControl {
    /// Whether periodic ticks are scheduled.
    running: AtomicBool,

    /// Wakes the loop when it should re-check its state.
    wake: Notify,

    /// Wall-clock interval between ticks.
    tick_interval_ms: AtomicU64,

    /// Ticks completed since creation or the last reset.
    ticks_run: AtomicU64,

    /// When the last tick completed.
    last_tick_at: Mutex<Option<DateTime<Utc>>>,
}

impl SchedulerControl {
    /// Create stopped control state. Intervals below
    /// [`MIN_TICK_INTERVAL_MS`] are raised to it.
    pub fn new(tick_interval_ms: u64) -> Self {
        Self {
            running: AtomicBool::new(false),
            wake: Notify::new(),
            tick_interval_ms: AtomicU64::new(tick_interval_ms.max(MIN_TICK_INTERVAL_MS)),
            ticks_run: AtomicU64::new(0),
            last_tick_at: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Running flag
    // -----------------------------------------------------------------------

    /// Whether periodic ticks are scheduled.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Mark the scheduler running. Returns `false` if it already was.
    pub fn begin(&self) -> bool {
        !self.running.swap(true, Ordering::AcqRel)
    }

    /// Mark the scheduler stopped and wake the loop so it exits. Returns
    /// `false` if it was already stopped.
    pub fn halt(&self) -> bool {
        let was_running = self.running.swap(false, Ordering::AcqRel);
        if was_running {
            self.wake.notify_one();
        }
        was_running
    }

    /// Wait until something changes the control state.
    pub async fn changed(&self) {
        self.wake.notified().await;
    }

    // -----------------------------------------------------------------------
    // Tick interval
    // -----------------------------------------------------------------------

    /// Current tick interval in milliseconds.
    pub fn tick_interval_ms(&self) -> u64 {
        self.tick_interval_ms.load(Ordering::Acquire)
    }

    /// Set the tick interval. Takes effect from the next scheduled tick.
    ///
    /// Returns the previous interval, or `None` if `ms` is below
    /// [`MIN_TICK_INTERVAL_MS`].
    pub fn set_tick_interval_ms(&self, ms: u64) -> Option<u64> {
        if ms < MIN_TICK_INTERVAL_MS {
            return None;
        }
        let prev = self.tick_interval_ms.swap(ms, Ordering::AcqRel);
        if self.is_running() {
            self.wake.notify_one();
        }
        Some(prev)
    }

    // -----------------------------------------------------------------------
    // Counters
    // -----------------------------------------------------------------------

    /// Note a completed tick.
    pub async fn record_tick(&self) {
        self.ticks_run.fetch_add(1, Ordering::AcqRel);
        *self.last_tick_at.lock().await = Some(Utc::now());
    }

    /// Ticks completed since creation or the last reset.
    pub fn ticks_run(&self) -> u64 {
        self.ticks_run.load(Ordering::Acquire)
    }

    /// Zero the counters.
    pub async fn reset_counters(&self) {
        self.ticks_run.store(0, Ordering::Release);
        *self.last_tick_at.lock().await = None;
    }

    /// Snapshot for display.
    pub async fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            running: self.is_running(),
            tick_interval_ms: self.tick_interval_ms(),
            ticks_run: self.ticks_run(),
            last_tick_at: self.last_tick_at.lock().await.map(|t| t.to_rfc3339()),
        }
    }
}

/// Serializable scheduler status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStatus {
    /// Whether periodic ticks are scheduled.
    pub running: bool,
    /// Current tick interval in milliseconds.
    pub tick_interval_ms: u64,
    /// Ticks completed since creation or the last reset.
    pub ticks_run: u64,
    /// RFC 3339 time of the last completed tick.
    pub last_tick_at: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn starts_stopped() {
        let control = SchedulerControl::new(1000);
        assert!(!control.is_running());
        assert_eq!(control.ticks_run(), 0);
    }

    #[test]
    fn begin_and_halt_report_transitions() {
        let control = SchedulerControl::new(1000);
        assert!(control.begin());
        assert!(!control.begin());
        assert!(control.is_running());
        assert!(control.halt());
        assert!(!control.halt());
        assert!(!control.is_running());
    }

    #[test]
    fn set_tick_interval() {
        let control = SchedulerControl::new(1000);
        assert_eq!(control.set_tick_interval_ms(2000), Some(1000));
        assert_eq!(control.tick_interval_ms(), 2000);
    }

    #[test]
    fn reject_sub_100ms_interval() {
        let control = SchedulerControl::new(1000);
        assert!(control.set_tick_interval_ms(50).is_none());
        assert_eq!(control.tick_interval_ms(), 1000);
    }

    #[test]
    fn initial_interval_is_floored() {
        let control = SchedulerControl::new(10);
        assert_eq!(control.tick_interval_ms(), MIN_TICK_INTERVAL_MS);
    }

    #[tokio::test]
    async fn status_tracks_ticks() {
        let control = SchedulerControl::new(500);
        control.record_tick().await;
        control.record_tick().await;
        let status = control.status().await;
        assert_eq!(status.ticks_run, 2);
        assert!(status.last_tick_at.is_some());
        assert!(!status.running);

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"tick_interval_ms\":500"));

        control.reset_counters().await;
        assert_eq!(control.status().await.ticks_run, 0);
    }
}

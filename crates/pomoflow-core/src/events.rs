use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Phase;

/// Every state change in the clock produces an `Event`.
/// View layers poll [`PomodoroClock::snapshot`] or print the events they
/// trigger; tests assert on them.
///
/// [`PomodoroClock::snapshot`]: crate::clock::PomodoroClock::snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerPaused {
        phase: Phase,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerCompleted {
        phase: Phase,
        at: DateTime<Utc>,
    },
    TimerSkipped {
        from: Phase,
        to: Phase,
        at: DateTime<Utc>,
    },
    DurationEdited {
        phase: Phase,
        total_secs: u64,
        at: DateTime<Utc>,
    },
    WorkCyclesEdited {
        work_cycle_target: u32,
        at: DateTime<Utc>,
    },
    PhaseSwitched {
        from: Phase,
        to: Phase,
        is_work_time: bool,
        cycle_count: u32,
        at: DateTime<Utc>,
    },
    SessionReset {
        work_cycle_target: u32,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        phase: Phase,
        is_work_time: bool,
        running: bool,
        remaining_secs: u64,
        total_secs: u64,
        cycle_count: u32,
        work_cycle_target: u32,
        at: DateTime<Utc>,
    },
}

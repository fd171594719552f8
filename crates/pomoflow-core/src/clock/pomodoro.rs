//! Phase controller: owns the three interval timers and sequences them.
//!
//! The clock delegates control commands to the currently active
//! [`CountdownTimer`] and, acting as each timer's completion listener,
//! advances the active phase when a countdown finishes. It never reaches
//! into a timer's internal fields; serialization of timer state is the
//! timer's own concern.
//!
//! Cycle accounting: `cycle_count` increments once per completed work
//! interval, in the completion handler, before the phase switch. Leaving
//! work with an even count selects the long break, an odd count the short
//! break. `work_cycle_target` is informational; session-length policy
//! (when to stop) belongs to the view layer.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::Utc;
use tracing::debug;

use crate::error::Result;
use crate::events::Event;
use crate::signal::{Receive, Signal};
use crate::timer::{CountdownTimer, TickSource};

use super::phase::Phase;

/// The three interval timers, keyed by [`Phase`].
struct PhaseTimers {
    work: CountdownTimer,
    short_break: CountdownTimer,
    long_break: CountdownTimer,
}

impl PhaseTimers {
    fn with_defaults(ticker: &Arc<dyn TickSource>) -> Self {
        let build = |phase: Phase| {
            CountdownTimer::from_secs(phase.default_minutes() * 60, Arc::clone(ticker))
        };
        Self {
            work: build(Phase::Work),
            short_break: build(Phase::ShortBreak),
            long_break: build(Phase::LongBreak),
        }
    }

    fn get(&self, phase: Phase) -> &CountdownTimer {
        match phase {
            Phase::Work => &self.work,
            Phase::ShortBreak => &self.short_break,
            Phase::LongBreak => &self.long_break,
        }
    }
}

struct ClockState {
    timers: PhaseTimers,
    active: Phase,
    is_work_time: bool,
    cycle_count: u32,
    work_cycle_target: u32,
}

impl ClockState {
    fn active_timer(&self) -> &CountdownTimer {
        self.timers.get(self.active)
    }

    /// Flip between work and break, selecting the break flavour by cycle
    /// parity. Does not touch `cycle_count`.
    fn switch_active(&mut self) -> (Phase, Phase) {
        let from = self.active;
        self.is_work_time = !self.is_work_time;
        self.active = if self.is_work_time {
            Phase::Work
        } else if self.cycle_count % 2 == 0 {
            Phase::LongBreak
        } else {
            Phase::ShortBreak
        };
        (from, self.active)
    }
}

struct ClockInner {
    state: Mutex<ClockState>,
    ticker: Arc<dyn TickSource>,
}

impl ClockInner {
    fn lock(&self) -> MutexGuard<'_, ClockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Receive for ClockInner {
    fn receive(&self, signal: Signal) {
        match signal {
            Signal::Finish => {
                let mut state = self.lock();
                let finished = state.active;
                if finished.is_work() {
                    state.cycle_count += 1;
                }
                let (from, to) = state.switch_active();
                debug!(
                    %from,
                    %to,
                    cycle_count = state.cycle_count,
                    "countdown finished, phase advanced"
                );
            }
        }
    }
}

/// A Pomodoro clock: three named countdown timers, a work-cycle counter and
/// the identity of the active timer.
///
/// Cheap to clone; clones share the same session state.
#[derive(Clone)]
pub struct PomodoroClock {
    inner: Arc<ClockInner>,
}

impl PomodoroClock {
    /// Create a clock with default interval durations (work 25 m, short
    /// break 5 m, long break 15 m), the work timer active.
    pub fn new(work_cycles: u32, ticker: Arc<dyn TickSource>) -> Self {
        let inner = Arc::new(ClockInner {
            state: Mutex::new(ClockState {
                timers: PhaseTimers::with_defaults(&ticker),
                active: Phase::Work,
                is_work_time: true,
                cycle_count: 0,
                work_cycle_target: work_cycles,
            }),
            ticker,
        });
        let clock = Self { inner };
        clock.register_listeners();
        clock
    }

    /// Rebuild all three timers with default durations and return to the
    /// initial state: work active, cycle counter zeroed.
    pub fn reset_pomodoro(&self, work_cycles: u32) -> Event {
        {
            let mut state = self.inner.lock();
            // Stop any running countdown before its timer is replaced, so
            // no orphaned tick task keeps decrementing.
            for phase in Phase::ALL {
                state.timers.get(phase).reset();
            }
            state.timers = PhaseTimers::with_defaults(&self.inner.ticker);
            state.active = Phase::Work;
            state.is_work_time = true;
            state.cycle_count = 0;
            state.work_cycle_target = work_cycles;
        }
        self.register_listeners();
        Event::SessionReset {
            work_cycle_target: work_cycles,
            at: Utc::now(),
        }
    }

    /// Start the active timer. `None` when the start was a benign no-op.
    pub fn start_timer(&self) -> Option<Event> {
        let state = self.inner.lock();
        let phase = state.active;
        if !state.active_timer().start() {
            return None;
        }
        Some(Event::TimerStarted {
            phase,
            remaining_secs: state.active_timer().remaining_secs(),
            at: Utc::now(),
        })
    }

    /// Pause the active timer. `None` when the pause was a benign no-op.
    pub fn pause_timer(&self) -> Option<Event> {
        let state = self.inner.lock();
        let phase = state.active;
        if !state.active_timer().pause() {
            return None;
        }
        Some(Event::TimerPaused {
            phase,
            remaining_secs: state.active_timer().remaining_secs(),
            at: Utc::now(),
        })
    }

    /// Change the duration of the named timer. Only that timer is affected;
    /// its remaining time resets to the new duration immediately.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDuration`] for negative components.
    ///
    /// [`CoreError::InvalidDuration`]: crate::error::CoreError::InvalidDuration
    pub fn edit_timer(&self, phase: Phase, hours: i64, minutes: i64) -> Result<Event> {
        let state = self.inner.lock();
        state.timers.get(phase).set_duration(hours, minutes)?;
        Ok(Event::DurationEdited {
            phase,
            total_secs: state.timers.get(phase).total_secs(),
            at: Utc::now(),
        })
    }

    /// Store a new work-cycle target. Informational only.
    pub fn edit_work_cycles(&self, cycles: u32) -> Event {
        let mut state = self.inner.lock();
        state.work_cycle_target = cycles;
        Event::WorkCyclesEdited {
            work_cycle_target: cycles,
            at: Utc::now(),
        }
    }

    /// Abandon the active interval: reset its timer, discarding progress,
    /// and make `phase` active without starting it.
    pub fn skip_timer(&self, phase: Phase) -> Event {
        let mut state = self.inner.lock();
        let from = state.active;
        state.active_timer().reset();
        state.active = phase;
        state.is_work_time = phase.is_work();
        Event::TimerSkipped {
            from,
            to: phase,
            at: Utc::now(),
        }
    }

    /// Advance to the next interval: work alternates with a break, the
    /// break flavour chosen by cycle parity (even selects the long break).
    pub fn switch_active_timer(&self) -> Event {
        let mut state = self.inner.lock();
        let (from, to) = state.switch_active();
        Event::PhaseSwitched {
            from,
            to,
            is_work_time: state.is_work_time,
            cycle_count: state.cycle_count,
            at: Utc::now(),
        }
    }

    /// Remaining seconds on the active timer.
    pub fn current_time(&self) -> u64 {
        self.inner.lock().active_timer().remaining_secs()
    }

    pub fn current_phase(&self) -> Phase {
        self.inner.lock().active
    }

    pub fn is_work_time(&self) -> bool {
        self.inner.lock().is_work_time
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().active_timer().is_running()
    }

    /// Completed work intervals this session.
    pub fn cycle_count(&self) -> u32 {
        self.inner.lock().cycle_count
    }

    pub fn work_cycle_target(&self) -> u32 {
        self.inner.lock().work_cycle_target
    }

    /// Configured duration of the named timer, in seconds.
    pub fn duration_of(&self, phase: Phase) -> u64 {
        self.inner.lock().timers.get(phase).total_secs()
    }

    /// Build a full state snapshot event for polling view layers.
    pub fn snapshot(&self) -> Event {
        let state = self.inner.lock();
        let timer = state.active_timer();
        Event::StateSnapshot {
            phase: state.active,
            is_work_time: state.is_work_time,
            running: timer.is_running(),
            remaining_secs: timer.remaining_secs(),
            total_secs: timer.total_secs(),
            cycle_count: state.cycle_count,
            work_cycle_target: state.work_cycle_target,
            at: Utc::now(),
        }
    }

    fn register_listeners(&self) {
        let inner: Arc<dyn Receive> = self.inner.clone();
        let listener: Weak<dyn Receive> = Arc::downgrade(&inner);
        let state = self.inner.lock();
        for phase in Phase::ALL {
            state.timers.get(phase).set_listener(Weak::clone(&listener));
        }
    }
}

impl fmt::Debug for PomodoroClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("PomodoroClock")
            .field("active", &state.active)
            .field("is_work_time", &state.is_work_time)
            .field("cycle_count", &state.cycle_count)
            .field("work_cycle_target", &state.work_cycle_target)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::ManualTicker;

    fn manual_clock(work_cycles: u32) -> (PomodoroClock, Arc<ManualTicker>) {
        let ticker = Arc::new(ManualTicker::new());
        let clock = PomodoroClock::new(work_cycles, ticker.clone() as Arc<dyn TickSource>);
        (clock, ticker)
    }

    /// Shrink the active interval to one minute and run it out.
    fn complete_active(clock: &PomodoroClock, ticker: &ManualTicker) {
        let phase = clock.current_phase();
        clock.edit_timer(phase, 0, 1).unwrap();
        assert!(clock.start_timer().is_some());
        ticker.fire_n(60);
    }

    #[test]
    fn new_clock_starts_at_work_with_defaults() {
        let (clock, _) = manual_clock(4);
        assert_eq!(clock.current_phase(), Phase::Work);
        assert!(clock.is_work_time());
        assert_eq!(clock.cycle_count(), 0);
        assert_eq!(clock.work_cycle_target(), 4);
        assert_eq!(clock.current_time(), 25 * 60);
        assert_eq!(clock.duration_of(Phase::ShortBreak), 5 * 60);
        assert_eq!(clock.duration_of(Phase::LongBreak), 15 * 60);
        assert!(!clock.is_running());
    }

    #[test]
    fn switch_alternates_work_and_break_by_parity() {
        let (clock, _) = manual_clock(4);

        // Leaving work with an even cycle count selects the long break.
        clock.switch_active_timer();
        assert!(!clock.is_work_time());
        assert_eq!(clock.current_phase(), Phase::LongBreak);

        clock.switch_active_timer();
        assert!(clock.is_work_time());
        assert_eq!(clock.current_phase(), Phase::Work);
    }

    #[test]
    fn completed_work_counts_a_cycle_and_picks_short_break() {
        let (clock, ticker) = manual_clock(4);
        complete_active(&clock, &ticker);

        assert_eq!(clock.cycle_count(), 1);
        assert_eq!(clock.current_phase(), Phase::ShortBreak);
        assert!(!clock.is_work_time());
        // The newly active timer is left stopped; starting it is the view
        // layer's decision.
        assert!(!clock.is_running());
    }

    #[test]
    fn second_completed_work_picks_long_break() {
        let (clock, ticker) = manual_clock(4);
        complete_active(&clock, &ticker); // work -> short break, count 1
        complete_active(&clock, &ticker); // short break -> work
        complete_active(&clock, &ticker); // work -> long break, count 2

        assert_eq!(clock.cycle_count(), 2);
        assert_eq!(clock.current_phase(), Phase::LongBreak);
    }

    #[test]
    fn completed_break_does_not_count_a_cycle() {
        let (clock, ticker) = manual_clock(4);
        complete_active(&clock, &ticker);
        assert_eq!(clock.cycle_count(), 1);

        complete_active(&clock, &ticker); // run the short break out
        assert_eq!(clock.cycle_count(), 1);
        assert_eq!(clock.current_phase(), Phase::Work);
        assert!(clock.is_work_time());
    }

    #[test]
    fn edit_timer_affects_only_the_named_timer() {
        let (clock, _) = manual_clock(4);
        clock.edit_timer(Phase::Work, 0, 30).unwrap();

        assert_eq!(clock.duration_of(Phase::Work), 30 * 60);
        assert_eq!(clock.duration_of(Phase::ShortBreak), 5 * 60);
        assert_eq!(clock.duration_of(Phase::LongBreak), 15 * 60);
    }

    #[test]
    fn skip_resets_active_progress_and_activates_target_unstarted() {
        let (clock, ticker) = manual_clock(4);
        clock.start_timer();
        ticker.fire_n(2);
        assert_eq!(clock.current_time(), 25 * 60 - 2);

        clock.skip_timer(Phase::ShortBreak);
        assert_eq!(clock.current_phase(), Phase::ShortBreak);
        assert!(!clock.is_work_time());
        assert!(!clock.is_running());
        // The abandoned work timer got its progress back.
        assert_eq!(clock.duration_of(Phase::Work), 25 * 60);
        clock.skip_timer(Phase::Work);
        assert_eq!(clock.current_time(), 25 * 60);
        assert!(clock.is_work_time());
    }

    #[test]
    fn pause_twice_changes_nothing_after_the_first() {
        let (clock, ticker) = manual_clock(4);
        clock.start_timer();
        ticker.fire_n(3);

        assert!(clock.pause_timer().is_some());
        let remaining = clock.current_time();
        assert!(clock.pause_timer().is_none());
        assert_eq!(clock.current_time(), remaining);
    }

    #[test]
    fn start_twice_is_a_noop_the_second_time() {
        let (clock, _) = manual_clock(4);
        assert!(clock.start_timer().is_some());
        assert!(clock.start_timer().is_none());
    }

    #[test]
    fn reset_pomodoro_restores_initial_state() {
        let (clock, ticker) = manual_clock(4);
        clock.edit_timer(Phase::Work, 1, 0).unwrap();
        complete_active(&clock, &ticker);
        clock.start_timer();
        ticker.fire_n(10);

        clock.reset_pomodoro(6);
        assert_eq!(clock.current_phase(), Phase::Work);
        assert!(clock.is_work_time());
        assert_eq!(clock.cycle_count(), 0);
        assert_eq!(clock.work_cycle_target(), 6);
        assert_eq!(clock.current_time(), 25 * 60);
        assert!(!clock.is_running());

        // The rebuilt timers are wired to the clock: a full work run still
        // advances the phase.
        complete_active(&clock, &ticker);
        assert_eq!(clock.cycle_count(), 1);
        assert_eq!(clock.current_phase(), Phase::ShortBreak);
    }

    #[test]
    fn reset_pomodoro_cancels_running_countdowns() {
        let (clock, ticker) = manual_clock(4);
        clock.start_timer();
        ticker.fire_n(5);
        clock.reset_pomodoro(4);

        // Ticks from the abandoned task must not reach the new timers.
        ticker.fire_n(10);
        assert_eq!(clock.current_time(), 25 * 60);
    }

    #[test]
    fn edit_work_cycles_stores_the_target() {
        let (clock, _) = manual_clock(4);
        clock.edit_work_cycles(8);
        assert_eq!(clock.work_cycle_target(), 8);
    }

    #[test]
    fn snapshot_reports_the_active_timer() {
        let (clock, ticker) = manual_clock(4);
        clock.start_timer();
        ticker.fire_n(30);

        match clock.snapshot() {
            Event::StateSnapshot {
                phase,
                is_work_time,
                running,
                remaining_secs,
                total_secs,
                cycle_count,
                work_cycle_target,
                ..
            } => {
                assert_eq!(phase, Phase::Work);
                assert!(is_work_time);
                assert!(running);
                assert_eq!(remaining_secs, 25 * 60 - 30);
                assert_eq!(total_secs, 25 * 60);
                assert_eq!(cycle_count, 0);
                assert_eq!(work_cycle_target, 4);
            }
            other => panic!("expected StateSnapshot, got {other:?}"),
        }
    }

    #[test]
    fn snapshot_serializes_with_type_tag() {
        let (clock, _) = manual_clock(4);
        let json = serde_json::to_value(clock.snapshot()).unwrap();
        assert_eq!(json["type"], "StateSnapshot");
        assert_eq!(json["phase"], "work");
        assert_eq!(json["remaining_secs"], 25 * 60);
    }
}

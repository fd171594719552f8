//! Countdown timer primitive.
//!
//! `CountdownTimer` owns a duration and a remaining-seconds counter. While
//! running, a tick task scheduled on a [`TickSource`] decrements the counter
//! once per second; the tick that reaches zero stops the timer and notifies
//! the registered listener with [`Signal::Finish`] exactly once.
//!
//! ## State transitions
//!
//! ```text
//! Stopped --start--> Running      (guard: remaining > 0, listener set)
//! Running --pause--> Stopped      (remaining preserved)
//! Running --tick hits 0--> Stopped + Finish notification
//! any     --reset--> Stopped      (remaining restored to total)
//! ```
//!
//! Commands and ticks both mutate state through one mutex, so a tick racing
//! a pause can never interleave inconsistently: a tick that was already in
//! flight when pause ran observes `running == false` under the lock and
//! stops without decrementing.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tracing::debug;

use crate::error::{CoreError, Result};
use crate::signal::{Receive, Signal};

use super::tick::{TickFlow, TickHandle, TickSource};

fn total_seconds(hours: i64, minutes: i64, seconds: i64) -> Result<u64> {
    if hours < 0 || minutes < 0 || seconds < 0 {
        return Err(CoreError::InvalidDuration {
            hours,
            minutes,
            seconds,
        });
    }
    Ok(hours as u64 * 3600 + minutes as u64 * 60 + seconds as u64)
}

struct TimerState {
    total_secs: u64,
    remaining_secs: u64,
    running: bool,
    listener: Option<Weak<dyn Receive>>,
    task: Option<TickHandle>,
}

/// A countdown over a fixed duration, ticked in the background.
pub struct CountdownTimer {
    state: Arc<Mutex<TimerState>>,
    ticker: Arc<dyn TickSource>,
}

impl CountdownTimer {
    /// Create a timer counting down from `hours:minutes:seconds`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDuration`] if any component is negative.
    pub fn new(
        hours: i64,
        minutes: i64,
        seconds: i64,
        ticker: Arc<dyn TickSource>,
    ) -> Result<Self> {
        Ok(Self::from_secs(total_seconds(hours, minutes, seconds)?, ticker))
    }

    /// Create a timer from a raw second count.
    pub fn from_secs(total_secs: u64, ticker: Arc<dyn TickSource>) -> Self {
        Self {
            state: Arc::new(Mutex::new(TimerState {
                total_secs,
                remaining_secs: total_secs,
                running: false,
                listener: None,
                task: None,
            })),
            ticker,
        }
    }

    /// Register the completion listener. Starts and stops nothing.
    ///
    /// The association is non-owning; if the listener is dropped the finish
    /// notification is silently skipped.
    pub fn set_listener(&self, listener: Weak<dyn Receive>) {
        self.lock().listener = Some(listener);
    }

    /// Overwrite the configured duration.
    ///
    /// The remaining time is reset to the new duration immediately, also
    /// while running -- an edit mid-run jumps the countdown rather than
    /// deferring to the next reset.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidDuration`] if hours or minutes are
    /// negative; state is left unchanged.
    pub fn set_duration(&self, hours: i64, minutes: i64) -> Result<()> {
        let total = total_seconds(hours, minutes, 0)?;
        let mut state = self.lock();
        state.total_secs = total;
        state.remaining_secs = total;
        Ok(())
    }

    /// Begin counting down.
    ///
    /// Benign no-op when already running, when nothing is left to count
    /// down, or when no listener is registered. Returns whether the timer
    /// transitioned to running.
    pub fn start(&self) -> bool {
        let stale = {
            let mut state = self.lock();
            if state.running {
                debug!("start ignored: timer already running");
                return false;
            }
            if state.remaining_secs == 0 {
                debug!("start ignored: nothing left to count down");
                return false;
            }
            if state.listener.is_none() {
                debug!("start ignored: no listener registered");
                return false;
            }
            state.running = true;
            state.task.take()
        };
        // Only one tick task may be live per timer; a handle left over from
        // an earlier run is cancelled before a new task is scheduled.
        if let Some(task) = stale {
            task.cancel();
        }

        let shared = Arc::clone(&self.state);
        let handle = self.ticker.schedule(Box::new(move || Self::on_tick(&shared)));

        let mut state = self.lock();
        if state.running {
            state.task = Some(handle);
        } else {
            // Paused in the window between scheduling and bookkeeping.
            drop(state);
            handle.cancel();
        }
        true
    }

    /// Stop counting down, preserving the remaining time exactly.
    ///
    /// Benign no-op when not running or when no listener is registered.
    /// Returns whether the timer transitioned to stopped.
    pub fn pause(&self) -> bool {
        let task = {
            let mut state = self.lock();
            if !state.running {
                debug!("pause ignored: timer not running");
                return false;
            }
            if state.listener.is_none() {
                debug!("pause ignored: no listener registered");
                return false;
            }
            state.running = false;
            state.task.take()
        };
        if let Some(task) = task {
            task.cancel();
        }
        true
    }

    /// Restore the remaining time to the configured duration.
    ///
    /// Pauses first if running; the timer is always stopped afterwards.
    pub fn reset(&self) {
        let task = {
            let mut state = self.lock();
            state.running = false;
            state.task.take()
        };
        if let Some(task) = task {
            task.cancel();
        }
        let mut state = self.lock();
        state.remaining_secs = state.total_secs;
    }

    /// Seconds left on the countdown. Never blocks on ticking.
    pub fn remaining_secs(&self) -> u64 {
        self.lock().remaining_secs
    }

    /// The configured duration in seconds.
    pub fn total_secs(&self) -> u64 {
        self.lock().total_secs
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    fn lock(&self) -> MutexGuard<'_, TimerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn on_tick(shared: &Mutex<TimerState>) -> TickFlow {
        let listener = {
            let mut state = shared.lock().unwrap_or_else(|e| e.into_inner());
            if !state.running {
                // A pause landed between this tick firing and the lock.
                return TickFlow::Stop;
            }
            state.remaining_secs = state.remaining_secs.saturating_sub(1);
            if state.remaining_secs > 0 {
                return TickFlow::Continue;
            }
            state.running = false;
            state.task = None;
            state.listener.clone()
        };
        // Notify outside the lock so the listener may query the timer.
        if let Some(listener) = listener.and_then(|weak| weak.upgrade()) {
            listener.receive(Signal::Finish);
        }
        TickFlow::Stop
    }
}

impl fmt::Debug for CountdownTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("CountdownTimer")
            .field("total_secs", &state.total_secs)
            .field("remaining_secs", &state.remaining_secs)
            .field("running", &state.running)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{IntervalTicker, ManualTicker};
    use proptest::prelude::*;
    use std::time::Duration;

    #[derive(Default)]
    struct TestSink {
        signals: Mutex<Vec<Signal>>,
    }

    impl TestSink {
        fn count(&self) -> usize {
            self.signals.lock().unwrap().len()
        }
    }

    impl Receive for TestSink {
        fn receive(&self, signal: Signal) {
            self.signals.lock().unwrap().push(signal);
        }
    }

    fn listening_timer(
        hours: i64,
        minutes: i64,
        seconds: i64,
    ) -> (CountdownTimer, Arc<ManualTicker>, Arc<TestSink>) {
        let ticker = Arc::new(ManualTicker::new());
        let timer =
            CountdownTimer::new(hours, minutes, seconds, ticker.clone() as Arc<dyn TickSource>)
                .unwrap();
        let sink = Arc::new(TestSink::default());
        let sink_dyn: Arc<dyn Receive> = sink.clone();
        let listener: Weak<dyn Receive> = Arc::downgrade(&sink_dyn);
        timer.set_listener(listener);
        (timer, ticker, sink)
    }

    #[test]
    fn construction_computes_total_seconds() {
        let (timer, _, _) = listening_timer(1, 30, 15);
        assert_eq!(timer.remaining_secs(), 5415);
        assert_eq!(timer.total_secs(), 5415);
        assert!(!timer.is_running());
    }

    proptest! {
        #[test]
        fn remaining_matches_components(h in 0i64..=24, m in 0i64..=59, s in 0i64..=59) {
            let ticker = Arc::new(ManualTicker::new());
            let timer = CountdownTimer::new(h, m, s, ticker as Arc<dyn TickSource>).unwrap();
            prop_assert_eq!(timer.remaining_secs(), (h * 3600 + m * 60 + s) as u64);
        }
    }

    #[test]
    fn negative_components_are_rejected() {
        let ticker = Arc::new(ManualTicker::new());
        for (h, m, s) in [(-1, 0, 0), (0, -5, 0), (0, 0, -1)] {
            let result = CountdownTimer::new(h, m, s, ticker.clone() as Arc<dyn TickSource>);
            assert!(matches!(result, Err(CoreError::InvalidDuration { .. })));
        }
    }

    #[test]
    fn negative_duration_edit_is_rejected_and_state_unchanged() {
        let (timer, _, _) = listening_timer(0, 25, 0);
        let result = timer.set_duration(0, -10);
        assert!(matches!(result, Err(CoreError::InvalidDuration { .. })));
        assert_eq!(timer.total_secs(), 25 * 60);
        assert_eq!(timer.remaining_secs(), 25 * 60);
    }

    #[test]
    fn run_to_completion_notifies_exactly_once() {
        let (timer, ticker, sink) = listening_timer(0, 0, 5);
        assert!(timer.start());
        ticker.fire_n(5);
        assert_eq!(timer.remaining_secs(), 0);
        assert!(!timer.is_running());
        assert_eq!(sink.count(), 1);

        // Further ticks change nothing; the task retired itself.
        ticker.fire_n(3);
        assert_eq!(timer.remaining_secs(), 0);
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn start_without_listener_is_noop() {
        let ticker = Arc::new(ManualTicker::new());
        let timer = CountdownTimer::new(0, 0, 5, ticker.clone() as Arc<dyn TickSource>).unwrap();
        assert!(!timer.start());
        assert!(!timer.is_running());
        ticker.fire();
        assert_eq!(timer.remaining_secs(), 5);
    }

    #[test]
    fn start_with_zero_remaining_is_noop() {
        let (timer, ticker, sink) = listening_timer(0, 0, 2);
        timer.start();
        ticker.fire_n(2);
        assert_eq!(sink.count(), 1);

        assert!(!timer.start());
        assert!(!timer.is_running());
    }

    #[test]
    fn start_while_running_does_not_double_tick() {
        let (timer, ticker, _) = listening_timer(0, 0, 10);
        assert!(timer.start());
        assert!(!timer.start());
        ticker.fire();
        assert_eq!(timer.remaining_secs(), 9);
    }

    #[test]
    fn pause_preserves_remaining_time() {
        let (timer, ticker, _) = listening_timer(0, 0, 5);
        timer.start();
        ticker.fire_n(2);
        assert!(timer.pause());
        assert_eq!(timer.remaining_secs(), 3);

        // Paused: an arbitrary delay leaves the counter untouched.
        ticker.fire_n(10);
        assert_eq!(timer.remaining_secs(), 3);
    }

    #[test]
    fn resume_accumulates_without_skipping() {
        let (timer, ticker, sink) = listening_timer(0, 0, 5);
        timer.start();
        ticker.fire_n(2);
        timer.pause();
        ticker.fire_n(2);
        timer.start();
        ticker.fire_n(3);
        assert_eq!(timer.remaining_secs(), 0);
        assert_eq!(sink.count(), 1);
    }

    #[test]
    fn pause_is_idempotent() {
        let (timer, ticker, _) = listening_timer(0, 0, 5);
        timer.start();
        ticker.fire();
        assert!(timer.pause());
        assert!(!timer.pause());
        assert_eq!(timer.remaining_secs(), 4);
        assert!(!timer.is_running());
    }

    #[test]
    fn reset_while_running_stops_and_restores() {
        let (timer, ticker, sink) = listening_timer(0, 0, 5);
        timer.start();
        ticker.fire_n(2);
        timer.reset();
        assert!(!timer.is_running());
        assert_eq!(timer.remaining_secs(), 5);

        ticker.fire_n(5);
        assert_eq!(timer.remaining_secs(), 5);
        assert_eq!(sink.count(), 0);
    }

    #[test]
    fn reset_while_stopped_restores_remaining() {
        let (timer, ticker, _) = listening_timer(0, 0, 5);
        timer.start();
        ticker.fire_n(3);
        timer.pause();
        timer.reset();
        assert_eq!(timer.remaining_secs(), 5);
    }

    #[test]
    fn duration_edit_resets_remaining_immediately() {
        let (timer, _, _) = listening_timer(0, 25, 0);
        timer.set_duration(0, 30).unwrap();
        assert_eq!(timer.total_secs(), 30 * 60);
        assert_eq!(timer.remaining_secs(), 30 * 60);
    }

    #[test]
    fn duration_edit_while_running_jumps_remaining() {
        let (timer, ticker, sink) = listening_timer(0, 25, 0);
        timer.start();
        ticker.fire_n(2);
        timer.set_duration(0, 1).unwrap();
        assert_eq!(timer.remaining_secs(), 60);
        assert!(timer.is_running());

        ticker.fire_n(60);
        assert_eq!(timer.remaining_secs(), 0);
        assert_eq!(sink.count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_completes_on_interval_ticks() {
        let ticker: Arc<dyn TickSource> = Arc::new(IntervalTicker::one_second());
        let timer = CountdownTimer::new(0, 0, 3, ticker).unwrap();
        let sink = Arc::new(TestSink::default());
        let sink_dyn: Arc<dyn Receive> = sink.clone();
        let listener: Weak<dyn Receive> = Arc::downgrade(&sink_dyn);
        timer.set_listener(listener);

        timer.start();
        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(timer.remaining_secs(), 0);
        assert!(!timer.is_running());
        assert_eq!(sink.count(), 1);
    }
}

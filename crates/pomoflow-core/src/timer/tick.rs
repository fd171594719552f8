//! Tick scheduling abstraction.
//!
//! The countdown timer does not talk to the concurrency runtime directly.
//! It schedules a repeating one-second callback on a [`TickSource`] and
//! cancels it through the returned [`TickHandle`]. Production code uses
//! [`IntervalTicker`] (tokio); tests and simulations use [`ManualTicker`]
//! and drive ticks explicitly.

use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Whether a scheduled callback wants to keep firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickFlow {
    Continue,
    Stop,
}

/// Repeating callback driven by a tick source.
pub type TickFn = Box<dyn FnMut() -> TickFlow + Send + 'static>;

/// Cancellation handle for a scheduled tick task.
///
/// Dropping the handle does not cancel the task; cancellation is always an
/// explicit call so that pause and reset control exactly when ticking stops.
pub struct TickHandle {
    cancel: Box<dyn FnOnce() + Send>,
}

impl TickHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Box::new(cancel),
        }
    }

    /// Stop the repeating callback.
    pub fn cancel(self) {
        (self.cancel)();
    }
}

/// Source of repeating ticks.
pub trait TickSource: Send + Sync {
    /// Schedule `tick` to fire once per period until it returns
    /// [`TickFlow::Stop`] or the handle is cancelled.
    fn schedule(&self, tick: TickFn) -> TickHandle;
}

/// Production tick source backed by `tokio::time::interval`.
///
/// The first tick fires one full period after scheduling. Missed ticks are
/// skipped rather than bursted; second-granularity drift is accepted.
pub struct IntervalTicker {
    period: Duration,
}

impl IntervalTicker {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn one_second() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl Default for IntervalTicker {
    fn default() -> Self {
        Self::one_second()
    }
}

impl TickSource for IntervalTicker {
    fn schedule(&self, mut tick: TickFn) -> TickHandle {
        let period = self.period;
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // An interval's first tick completes immediately; consume it so
            // the callback fires one full period after scheduling.
            interval.tick().await;
            loop {
                interval.tick().await;
                if tick() == TickFlow::Stop {
                    break;
                }
            }
        });
        TickHandle::new(move || task.abort())
    }
}

/// Deterministic tick source for tests and simulations.
///
/// Scheduled callbacks fire only when [`ManualTicker::fire`] is called.
/// Ticks are delivered on the calling thread; drive it from the same thread
/// that issues timer commands.
#[derive(Default)]
pub struct ManualTicker {
    tasks: Arc<Mutex<Vec<Option<TickFn>>>>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one tick to every scheduled callback.
    pub fn fire(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        for slot in tasks.iter_mut() {
            if let Some(tick) = slot.as_mut() {
                if tick() == TickFlow::Stop {
                    *slot = None;
                }
            }
        }
    }

    /// Deliver `n` ticks.
    pub fn fire_n(&self, n: usize) {
        for _ in 0..n {
            self.fire();
        }
    }

    /// Number of live callbacks.
    pub fn active(&self) -> usize {
        self.tasks
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|slot| slot.is_some())
            .count()
    }
}

impl TickSource for ManualTicker {
    fn schedule(&self, tick: TickFn) -> TickHandle {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        let index = tasks.len();
        tasks.push(Some(tick));
        let tasks = Arc::clone(&self.tasks);
        TickHandle::new(move || {
            let mut tasks = tasks.lock().unwrap_or_else(|e| e.into_inner());
            if let Some(slot) = tasks.get_mut(index) {
                *slot = None;
            }
        })
    }
}

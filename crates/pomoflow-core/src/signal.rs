//! Completion signalling between timers and their listeners.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Signal delivered by a countdown timer to its listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Signal {
    /// The countdown reached zero. Delivered exactly once per completed run.
    Finish,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Finish => f.write_str("finish"),
        }
    }
}

/// Capability to receive signals from a countdown timer.
///
/// Timers hold their listener as a `Weak` reference, so implementing this
/// trait creates no ownership relation between a timer and its listener.
/// Delivery to a listener that has been dropped is skipped; it is never
/// retried.
pub trait Receive: Send + Sync {
    fn receive(&self, signal: Signal);
}

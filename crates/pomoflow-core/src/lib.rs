//! # Pomoflow Core Library
//!
//! This library provides the core business logic for the Pomoflow Pomodoro
//! timer. It implements a CLI-first philosophy where all operations are
//! available through the library API, with the CLI binary being a thin view
//! layer that reads remaining time and issues control commands.
//!
//! ## Architecture
//!
//! - **Countdown Timer**: a serialized countdown state machine decremented
//!   once per second by a tick task scheduled on a [`TickSource`]
//! - **Pomodoro Clock**: owns the work / short break / long break timers and
//!   advances the active phase when the running timer finishes
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`CountdownTimer`]: countdown primitive with start/pause/reset
//! - [`PomodoroClock`]: phase-sequencing state machine
//! - [`Config`]: application configuration management

pub mod clock;
pub mod error;
pub mod events;
pub mod signal;
pub mod storage;
pub mod timer;

pub use clock::{Phase, PomodoroClock};
pub use error::{ConfigError, CoreError};
pub use events::Event;
pub use signal::{Receive, Signal};
pub use storage::Config;
pub use timer::{CountdownTimer, IntervalTicker, ManualTicker, TickFlow, TickHandle, TickSource};

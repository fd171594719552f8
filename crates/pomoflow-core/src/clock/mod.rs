mod phase;
mod pomodoro;

pub use phase::Phase;
pub use pomodoro::PomodoroClock;

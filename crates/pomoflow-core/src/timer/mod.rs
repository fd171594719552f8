mod countdown;
mod tick;

pub use countdown::CountdownTimer;
pub use tick::{IntervalTicker, ManualTicker, TickFlow, TickFn, TickHandle, TickSource};

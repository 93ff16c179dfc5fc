//! Countdown timer and stopwatch that reports time on a fixed tick and
//! notifies listeners when a countdown is almost done, done, or stopped.

pub mod clock;
pub mod config;
mod error;
pub mod stopwatch;
pub mod ticker;

pub use clock::{Clock, ManualClock, MonotonicClock, SystemClock};
pub use config::Config;
pub use error::Error;
pub use stopwatch::{Event, Mode, State, Stopwatch, StopwatchOptions, TimeUpdate};
pub use ticker::{TickFn, TickHandle, Ticker, TokioTicker};

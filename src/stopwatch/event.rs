use std::fmt;

/// Notification published by a [`Stopwatch`](super::Stopwatch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Current time: remaining in countdown mode, elapsed in count-up mode.
    Time(TimeUpdate),
    /// Remaining time dropped below the almost-done threshold.
    AlmostDone,
    /// The countdown reached zero.
    Done,
    /// The timer left the running state.
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeUpdate {
    pub ms: u64,
    /// `ms` rounded to the nearest second, halves rounding up.
    pub seconds: u64,
}

impl TimeUpdate {
    pub fn from_ms(ms: u64) -> Self {
        Self {
            ms,
            seconds: ms.saturating_add(500) / 1000,
        }
    }
}

impl fmt::Display for TimeUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.seconds / 60, self.seconds % 60)
    }
}

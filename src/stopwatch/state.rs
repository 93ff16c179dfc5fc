/// Lifecycle of a stopwatch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum State {
    #[default]
    Stopped,
    Running,
    /// A countdown ran out. Only reachable in countdown mode.
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Reports remaining time and finishes at zero.
    Countdown,
    /// Reports elapsed time until stopped.
    CountUp,
}

impl Mode {
    pub fn for_target(target_ms: u64) -> Self {
        if target_ms > 0 {
            Mode::Countdown
        } else {
            Mode::CountUp
        }
    }
}

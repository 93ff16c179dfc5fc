use std::time::Duration;

use serde::Deserialize;

use crate::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StopwatchOptions {
    /// How often the current time is reported while running.
    pub tick_interval_ms: u64,
    /// Remaining time below which `AlmostDone` fires, countdown mode only.
    pub almost_done_threshold_ms: u64,
}

impl Default for StopwatchOptions {
    fn default() -> Self {
        Self {
            tick_interval_ms: 50,
            almost_done_threshold_ms: 10_000,
        }
    }
}

impl StopwatchOptions {
    pub fn with_tick_interval_ms(mut self, ms: u64) -> Self {
        self.tick_interval_ms = ms;
        self
    }

    pub fn with_almost_done_threshold_ms(mut self, ms: u64) -> Self {
        self.almost_done_threshold_ms = ms;
        self
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub(crate) fn validate(&self) -> Result<(), Error> {
        if self.tick_interval_ms == 0 {
            return Err(Error::InvalidTickInterval(self.tick_interval_ms));
        }
        Ok(())
    }
}

use std::time::Duration;

use tokio::{
    runtime::Handle,
    time::{Instant, MissedTickBehavior},
};

use crate::Error;

pub type TickFn = Box<dyn Fn() + Send + Sync + 'static>;

/// Repeating callback primitive.
///
/// `every` schedules `tick` to run once per `period`, starting one period
/// from now, until the returned handle is cancelled or dropped.
pub trait Ticker: Send + Sync {
    fn every(&self, period: Duration, tick: TickFn) -> TickHandle;
}

/// Ownership of a scheduled tick. Cancels it exactly once, on `cancel` or drop.
pub struct TickHandle {
    cancel: Option<Box<dyn FnOnce() + Send + 'static>>,
}

impl TickHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.release();
    }
}

/// Ticks driven by a task on a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioTicker {
    runtime: Handle,
}

impl TokioTicker {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Binds to the runtime the caller is running on.
    pub fn try_current() -> Result<Self, Error> {
        Handle::try_current().map(Self::new).map_err(Error::NoRuntime)
    }
}

impl Ticker for TokioTicker {
    fn every(&self, period: Duration, tick: TickFn) -> TickHandle {
        let task = self.runtime.spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                tick();
            }
        });
        let abort = task.abort_handle();
        TickHandle::new(move || abort.abort())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    fn counting() -> (Arc<AtomicUsize>, TickFn) {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = count.clone();
        let tick = Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (count, tick)
    }

    #[test]
    fn handle_cancels_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let handle = TickHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        handle.cancel();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let counter = calls.clone();
        drop(TickHandle::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn try_current_fails_outside_runtime() {
        assert!(matches!(TokioTicker::try_current(), Err(Error::NoRuntime(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_period() {
        let ticker = TokioTicker::try_current().unwrap();
        let (count, tick) = counting();
        let _handle = ticker.every(Duration::from_millis(100), tick);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn no_ticks_after_cancel() {
        let ticker = TokioTicker::try_current().unwrap();
        let (count, tick) = counting();
        let handle = ticker.every(Duration::from_millis(100), tick);

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        handle.cancel();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }
}

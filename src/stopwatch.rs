//! Countdown timer / stopwatch with periodic time notifications.

mod event;
mod listeners;
mod options;
mod state;

pub use event::{Event, TimeUpdate};
pub use options::StopwatchOptions;
pub use state::{Mode, State};

use std::{
    cell::RefCell,
    sync::{Arc, Weak},
};

use futures::Stream;
use parking_lot::ReentrantMutex;
use tokio::sync::broadcast;
use tokio_stream::{
    StreamExt,
    wrappers::{BroadcastStream, errors::BroadcastStreamRecvError},
};

use crate::{
    Error,
    clock::{Clock, SystemClock},
    stopwatch::listeners::Listeners,
    ticker::{TickHandle, Ticker, TokioTicker},
};

const EVENT_CAPACITY: usize = 128;

/// A countdown timer, or a stopwatch when no target duration is set.
///
/// While running, the current time is reported every tick to `on_time`
/// listeners and to event stream subscribers. A countdown additionally
/// reports `AlmostDone` once when the remaining time drops below the
/// configured threshold, and `Stop` followed by `Done` when it reaches zero.
pub struct Stopwatch {
    shared: Arc<ReentrantMutex<Inner>>,
}

struct Inner {
    core: RefCell<Core>,
    listeners: RefCell<Listeners>,
    sender: broadcast::Sender<Event>,
    clock: Arc<dyn Clock>,
    ticker: Arc<dyn Ticker>,
}

struct Core {
    state: State,
    options: StopwatchOptions,
    /// 0 means count-up mode.
    target_ms: u64,
    elapsed_ms: u64,
    /// Clock reading that corresponds to zero elapsed time.
    reference_ms: i64,
    current_ms: u64,
    almost_done_fired: bool,
    done_fired: bool,
    active: Option<ActiveTicker>,
    generation: u64,
}

struct ActiveTicker {
    generation: u64,
    _handle: TickHandle,
}

impl Core {
    fn mode(&self) -> Mode {
        Mode::for_target(self.target_ms)
    }

    fn active_generation(&self) -> Option<u64> {
        self.active.as_ref().map(|active| active.generation)
    }

    fn release_ticker(&mut self) {
        if let Some(active) = self.active.take() {
            tracing::trace!(generation = active.generation, "releasing ticker");
        }
    }

    fn measure(&mut self, now_ms: i64) {
        let elapsed = now_ms.saturating_sub(self.reference_ms);
        self.elapsed_ms = u64::try_from(elapsed).unwrap_or(0);
    }
}

impl Stopwatch {
    /// Creates a stopwatch on the wall clock, ticking on the current tokio
    /// runtime. A target of `None` or `Some(0)` makes it count up.
    pub fn new(target_ms: Option<u64>, options: StopwatchOptions) -> Result<Self, Error> {
        let ticker = TokioTicker::try_current()?;
        Self::with_parts(target_ms, options, Arc::new(SystemClock), Arc::new(ticker))
    }

    pub fn with_parts(
        target_ms: Option<u64>,
        options: StopwatchOptions,
        clock: Arc<dyn Clock>,
        ticker: Arc<dyn Ticker>,
    ) -> Result<Self, Error> {
        options.validate()?;

        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        let now = clock.now_ms();
        let target_ms = target_ms.unwrap_or(0);
        let core = Core {
            state: State::Stopped,
            options,
            target_ms,
            elapsed_ms: 0,
            reference_ms: now,
            current_ms: target_ms,
            almost_done_fired: false,
            done_fired: false,
            active: None,
            generation: 0,
        };
        let inner = Inner {
            core: RefCell::new(core),
            listeners: RefCell::new(Listeners::default()),
            sender,
            clock,
            ticker,
        };
        let stopwatch = Self {
            shared: Arc::new(ReentrantMutex::new(inner)),
        };
        stopwatch.reset(None);
        Ok(stopwatch)
    }

    /// Starts or resumes the timer, keeping any time already elapsed.
    pub fn start(&self) {
        let weak = Arc::downgrade(&self.shared);
        self.shared.lock().start(weak);
    }

    /// Pauses the timer. Emits a final `Time` then `Stop`, but only if it was
    /// running.
    pub fn stop(&self) {
        self.shared.lock().stop();
    }

    /// Stops the timer and clears elapsed time and both one-shot latches.
    /// `Some(target)` replaces the countdown length; `Some(0)` switches to
    /// count-up mode.
    pub fn reset(&self, target_ms: Option<u64>) {
        self.shared.lock().reset(target_ms);
    }

    /// Starts a stopped timer or stops any other. Returns whether it is now
    /// running.
    pub fn toggle(&self) -> bool {
        let inner = self.shared.lock();
        let stopped = inner.core.borrow().state == State::Stopped;
        if stopped {
            inner.start(Arc::downgrade(&self.shared));
            true
        } else {
            inner.stop();
            false
        }
    }

    pub fn state(&self) -> State {
        self.read(|core| core.state)
    }

    pub fn is_stopped(&self) -> bool {
        self.state() == State::Stopped
    }

    pub fn is_running(&self) -> bool {
        self.state() == State::Running
    }

    pub fn is_complete(&self) -> bool {
        self.state() == State::Complete
    }

    pub fn mode(&self) -> Mode {
        self.read(Core::mode)
    }

    /// Last reported time: remaining in countdown mode, elapsed otherwise.
    pub fn current_ms(&self) -> u64 {
        self.read(|core| core.current_ms)
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.read(|core| core.elapsed_ms)
    }

    /// Countdown length, 0 in count-up mode.
    pub fn target_ms(&self) -> u64 {
        self.read(|core| core.target_ms)
    }

    pub fn options(&self) -> StopwatchOptions {
        self.read(|core| core.options)
    }

    pub fn on_time(&self, listener: impl Fn(TimeUpdate) + Send + Sync + 'static) -> &Self {
        self.listen(|listeners| listeners.add_time(Arc::new(listener)))
    }

    pub fn on_almost_done(&self, listener: impl Fn() + Send + Sync + 'static) -> &Self {
        self.listen(|listeners| listeners.add_almost_done(Arc::new(listener)))
    }

    pub fn on_done(&self, listener: impl Fn() + Send + Sync + 'static) -> &Self {
        self.listen(|listeners| listeners.add_done(Arc::new(listener)))
    }

    pub fn on_stop(&self, listener: impl Fn() + Send + Sync + 'static) -> &Self {
        self.listen(|listeners| listeners.add_stop(Arc::new(listener)))
    }

    /// Receiver for every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.shared.lock().sender.subscribe()
    }

    /// Stream of every event emitted from now on. Events missed by a slow
    /// consumer are skipped.
    pub fn events(&self) -> impl Stream<Item = Event> + Send + use<> {
        BroadcastStream::new(self.subscribe()).filter_map(|result| match result {
            Ok(event) => Some(event),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "stopwatch event stream lagged");
                None
            }
        })
    }

    fn read<T>(&self, f: impl FnOnce(&Core) -> T) -> T {
        let inner = self.shared.lock();
        let core = inner.core.borrow();
        f(&*core)
    }

    fn listen(&self, f: impl FnOnce(&mut Listeners)) -> &Self {
        let inner = self.shared.lock();
        f(&mut *inner.listeners.borrow_mut());
        self
    }
}

impl Inner {
    fn start(&self, this: Weak<ReentrantMutex<Inner>>) {
        let now = self.clock.now_ms();
        let (generation, period) = {
            let mut core = self.core.borrow_mut();
            core.release_ticker();
            core.state = State::Running;
            let elapsed = i64::try_from(core.elapsed_ms).unwrap_or(i64::MAX);
            core.reference_ms = now.saturating_sub(elapsed);
            core.generation += 1;
            tracing::debug!(
                mode = ?core.mode(),
                target_ms = core.target_ms,
                elapsed_ms = core.elapsed_ms,
                "stopwatch started"
            );
            (core.generation, core.options.tick_interval())
        };

        let handle = self.ticker.every(
            period,
            Box::new(move || {
                if let Some(shared) = this.upgrade() {
                    shared.lock().on_tick(generation);
                }
            }),
        );
        self.core.borrow_mut().active = Some(ActiveTicker {
            generation,
            _handle: handle,
        });

        self.update();
    }

    fn stop(&self) {
        let was_running = {
            let mut core = self.core.borrow_mut();
            core.release_ticker();
            if core.state == State::Running {
                core.state = State::Stopped;
                true
            } else {
                false
            }
        };
        if !was_running {
            return;
        }

        self.update();
        tracing::debug!(
            elapsed_ms = self.core.borrow().elapsed_ms,
            "stopwatch stopped"
        );
        self.emit(Event::Stop);
    }

    fn reset(&self, target_ms: Option<u64>) {
        self.stop();

        let now = self.clock.now_ms();
        let update = {
            let mut core = self.core.borrow_mut();
            core.state = State::Stopped;
            core.done_fired = false;
            core.almost_done_fired = false;
            core.elapsed_ms = 0;
            core.reference_ms = now;
            if let Some(target_ms) = target_ms {
                core.target_ms = target_ms;
            }
            core.current_ms = core.target_ms;
            tracing::debug!(target_ms = core.target_ms, "stopwatch reset");
            TimeUpdate::from_ms(core.current_ms)
        };
        self.emit(Event::Time(update));
    }

    fn on_tick(&self, generation: u64) {
        if self.core.borrow().active_generation() != Some(generation) {
            tracing::trace!(generation, "ignoring tick from released ticker");
            return;
        }
        self.update();
    }

    fn update(&self) {
        let mode = self.core.borrow().mode();
        match mode {
            Mode::Countdown => self.count_down(),
            Mode::CountUp => self.count_up(),
        }
    }

    fn count_down(&self) {
        let now = self.clock.now_ms();
        let remaining = {
            let mut core = self.core.borrow_mut();
            core.measure(now);
            core.current_ms = core.target_ms.saturating_sub(core.elapsed_ms);
            core.current_ms
        };
        tracing::trace!(remaining_ms = remaining, "countdown tick");
        self.emit(Event::Time(TimeUpdate::from_ms(remaining)));

        let (stopped, threshold) = {
            let core = self.core.borrow();
            (
                core.state == State::Stopped,
                core.options.almost_done_threshold_ms,
            )
        };
        if remaining == 0 && !stopped {
            self.stop();
            let first = {
                let mut core = self.core.borrow_mut();
                // A stop listener may have reset or restarted the run.
                let expired = core.state == State::Stopped
                    && core.mode() == Mode::Countdown
                    && core.elapsed_ms >= core.target_ms;
                let first = expired && !core.done_fired;
                if first {
                    core.done_fired = true;
                    core.state = State::Complete;
                }
                first
            };
            if first {
                tracing::info!(target_ms = self.core.borrow().target_ms, "countdown complete");
                self.emit(Event::Done);
            }
        } else if remaining < threshold {
            let first = !std::mem::replace(&mut self.core.borrow_mut().almost_done_fired, true);
            if first {
                tracing::debug!(remaining_ms = remaining, "countdown almost done");
                self.emit(Event::AlmostDone);
            }
        }
    }

    fn count_up(&self) {
        let now = self.clock.now_ms();
        let elapsed = {
            let mut core = self.core.borrow_mut();
            core.measure(now);
            core.current_ms = core.elapsed_ms;
            core.current_ms
        };
        tracing::trace!(elapsed_ms = elapsed, "stopwatch tick");
        self.emit(Event::Time(TimeUpdate::from_ms(elapsed)));
    }

    /// Runs listeners with no borrow held, then broadcasts.
    fn emit(&self, event: Event) {
        let dispatch = self.listeners.borrow().dispatch(event);
        dispatch.run();
        // No subscribers is not an error.
        let _ = self.sender.send(event);
    }
}

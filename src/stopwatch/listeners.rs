use std::sync::Arc;

use crate::stopwatch::{Event, TimeUpdate};

pub type TimeListener = Arc<dyn Fn(TimeUpdate) + Send + Sync>;
pub type Listener = Arc<dyn Fn() + Send + Sync>;

/// Registered callbacks, kept in registration order per event kind.
#[derive(Default)]
pub struct Listeners {
    time: Vec<TimeListener>,
    almost_done: Vec<Listener>,
    done: Vec<Listener>,
    stop: Vec<Listener>,
}

impl Listeners {
    pub fn add_time(&mut self, listener: TimeListener) {
        self.time.push(listener);
    }

    pub fn add_almost_done(&mut self, listener: Listener) {
        self.almost_done.push(listener);
    }

    pub fn add_done(&mut self, listener: Listener) {
        self.done.push(listener);
    }

    pub fn add_stop(&mut self, listener: Listener) {
        self.stop.push(listener);
    }

    /// Snapshot of the listeners for `event`, so the table can be released
    /// before any of them runs.
    pub fn dispatch(&self, event: Event) -> Dispatch {
        match event {
            Event::Time(update) => Dispatch::Time(self.time.clone(), update),
            Event::AlmostDone => Dispatch::Signal(self.almost_done.clone()),
            Event::Done => Dispatch::Signal(self.done.clone()),
            Event::Stop => Dispatch::Signal(self.stop.clone()),
        }
    }
}

pub enum Dispatch {
    Time(Vec<TimeListener>, TimeUpdate),
    Signal(Vec<Listener>),
}

impl Dispatch {
    pub fn run(self) {
        match self {
            Dispatch::Time(listeners, update) => {
                for listener in listeners {
                    listener(update);
                }
            }
            Dispatch::Signal(listeners) => {
                for listener in listeners {
                    listener();
                }
            }
        }
    }
}

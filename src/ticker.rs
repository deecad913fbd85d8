//! Fixed-rate tick source driving the sampling loop.

use std::thread;
use std::time::{Duration, Instant};

/// Best-effort fixed-rate ticker.
///
/// The first `tick` returns immediately; each later `tick` sleeps until the
/// next deadline and then advances it by exactly the interval, so the long-run
/// rate tracks the configured interval without drift. If the caller's own work
/// overran the interval, the tick fires immediately once and the deadline
/// re-anchors to the current time instead of scheduling a burst of catch-up
/// ticks.
pub struct Ticker {
    interval: Duration,
    next_deadline: Option<Instant>,
}

impl Ticker {
    pub fn new(interval: Duration) -> Self {
        Ticker {
            interval,
            next_deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block until the next tick is due.
    pub fn tick(&mut self) {
        match self.next_deadline {
            None => {
                self.next_deadline = Some(Instant::now() + self.interval);
            }
            Some(deadline) => {
                let now = Instant::now();
                if deadline > now {
                    thread::sleep(deadline - now);
                    self.next_deadline = Some(deadline + self.interval);
                } else {
                    // Overrun: re-anchor rather than burst.
                    self.next_deadline = Some(now + self.interval);
                }
            }
        }
    }
}

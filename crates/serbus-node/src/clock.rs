use std::time::{Duration, Instant};

/// Time source for deadline checks and the wait-loop yield point.
///
/// The engine never sleeps or reads the clock directly; everything goes
/// through this seam so tests can drive timeouts deterministically.
pub trait Clock: Send {
    /// Current instant on a monotonic timeline.
    fn now(&self) -> Instant;

    /// Give up the CPU briefly between wait-loop iterations.
    fn yield_now(&self);
}

/// Wall clock: `Instant::now` plus a short sleep per yield.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    yield_interval: Duration,
}

impl MonotonicClock {
    /// Default pause between acknowledgment wait iterations.
    pub const DEFAULT_YIELD: Duration = Duration::from_micros(100);

    pub fn new() -> Self {
        Self {
            yield_interval: Self::DEFAULT_YIELD,
        }
    }

    /// Use an explicit yield interval.
    pub fn with_yield_interval(yield_interval: Duration) -> Self {
        Self { yield_interval }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn yield_now(&self) {
        std::thread::sleep(self.yield_interval);
    }
}

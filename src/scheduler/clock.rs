//! Monotonic millisecond clocks for frame timing

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::time::Instant;

/// Source of monotonic timestamps in milliseconds
pub trait FrameClock: Send + Sync {
    fn now_ms(&self) -> f64;
}

/// Clock backed by the tokio time driver
///
/// Follows paused/advanced time in tests.
#[derive(Debug, Clone)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClock for MonotonicClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Manually advanced clock for hosts that supply their own frame timestamps
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<f64>>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            now: Arc::new(Mutex::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: f64) {
        *self.now.lock() += ms;
    }

    pub fn set(&self, ms: f64) {
        *self.now.lock() = ms;
    }
}

impl FrameClock for ManualClock {
    fn now_ms(&self) -> f64 {
        *self.now.lock()
    }
}

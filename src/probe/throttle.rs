use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// A held concurrency slot. The slot is returned when this is dropped.
pub struct LimiterPermit {
    _slot: OwnedSemaphorePermit,
}

/// Bounds the number of probes in flight. Waiters are served FIFO.
#[derive(Clone)]
pub struct ConcurrencyLimiter {
    slots: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyLimiter {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, Semaphore::MAX_PERMITS);
        Self {
            slots: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    pub async fn acquire(&self) -> LimiterPermit {
        let slot = self
            .slots
            .clone()
            .acquire_owned()
            .await
            .expect("limiter semaphore is never closed");
        LimiterPermit { _slot: slot }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_flight(&self) -> usize {
        self.capacity - self.slots.available_permits()
    }
}

/// Per-probe pacing toward a requests-per-second ceiling.
///
/// The delay only paces the probe that just finished. With several probes in
/// flight the aggregate rate can reach `concurrency × rps`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateThrottler {
    rps: f64,
}

impl RateThrottler {
    pub fn new(rps: f64) -> Self {
        let rps = if rps.is_finite() && rps > 0.0 { rps } else { 0.0 };
        Self { rps }
    }

    pub fn is_enabled(&self) -> bool {
        self.rps > 0.0
    }

    /// `max(0, 1/rps - elapsed)`, always zero when disabled. Intervals too
    /// long for a `Duration` saturate at `Duration::MAX`.
    pub fn delay_after(&self, elapsed: Duration) -> Duration {
        if !self.is_enabled() {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(1.0 / self.rps)
            .unwrap_or(Duration::MAX)
            .saturating_sub(elapsed)
    }
}

//! Global politeness gate for edge source requests.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::cancel::CancelToken;

/// Spaces successive fetches at least `interval` apart, across all threads.
///
/// Each caller reserves the next free slot under the lock and then sleeps
/// outside it, so waiting workers never hold the gate.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_slot: Mutex::new(None),
        }
    }

    /// A limiter that never waits.
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Block until this caller may issue a request.
    ///
    /// Returns `false` if `cancel` fired while waiting.
    pub fn acquire(&self, cancel: &CancelToken) -> bool {
        if self.interval.is_zero() {
            return !cancel.is_cancelled();
        }
        let slot = {
            let mut next = self.next_slot.lock().unwrap_or_else(|e| e.into_inner());
            let now = Instant::now();
            let slot = next.map_or(now, |n| n.max(now));
            *next = Some(slot + self.interval);
            slot
        };
        cancel.sleep(slot.saturating_duration_since(Instant::now()))
    }
}

// src/time.rs

//! Injectable wall-clock access and the hour-bucket helper shared by the
//! impression pipeline.

use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds in one hour, the counter's bucket width (§3).
pub const HOUR_IN_MS: i64 = 3_600_000;

/// Current epoch time in milliseconds.
///
/// Kept as a free function (rather than hardcoding `SystemTime::now()` at
/// every call site) so tests can shadow it with a fixed clock by going
/// through the [`Clock`] trait instead.
pub fn current_epoch_time_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock is before the unix epoch")
        .as_millis() as i64
}

/// Truncates an epoch-ms timestamp down to the start of its hour bucket.
///
/// `⌊time / 3_600_000⌋ * 3_600_000` per §3/§4.4.2.
pub fn truncate_hour(time_ms: i64) -> i64 {
    (time_ms / HOUR_IN_MS) * HOUR_IN_MS
}

/// A source of the current time, injectable for deterministic tests.
///
/// Mirrors the "Time: `now()` must be injectable for tests" design note
/// (§9) without requiring every component to be generic over a clock type;
/// components take `Arc<dyn Clock>` the way `spineldb` takes `Arc<dyn ...>`
/// collaborators elsewhere.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// The default clock, backed by the OS wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        current_epoch_time_ms()
    }
}

/// A fixed or steppable clock for tests.
#[derive(Debug)]
pub struct FixedClock(std::sync::atomic::AtomicI64);

impl FixedClock {
    pub fn new(start_ms: i64) -> Self {
        Self(std::sync::atomic::AtomicI64::new(start_ms))
    }

    pub fn set(&self, ms: i64) {
        self.0.store(ms, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: i64) {
        self.0.fetch_add(delta_ms, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_ms(&self) -> i64 {
        self.0.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncates_down_to_the_hour() {
        assert_eq!(truncate_hour(0), 0);
        assert_eq!(truncate_hour(HOUR_IN_MS - 1), 0);
        assert_eq!(truncate_hour(HOUR_IN_MS), HOUR_IN_MS);
        assert_eq!(truncate_hour(HOUR_IN_MS + 1), HOUR_IN_MS);
    }

    #[test]
    fn fixed_clock_advances() {
        let clock = FixedClock::new(100);
        assert_eq!(clock.now_ms(), 100);
        clock.advance(50);
        assert_eq!(clock.now_ms(), 150);
        clock.set(0);
        assert_eq!(clock.now_ms(), 0);
    }
}

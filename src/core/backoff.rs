// src/core/backoff.rs

//! Bounded exponential backoff cursor for retry loops (§4.1).
//!
//! `next()` never sleeps; callers sleep on the returned duration so
//! cancellation stays caller-controlled (§5 "Suspension points").

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

const DEFAULT_BASE_SECS: u64 = 10;
const DEFAULT_MAX_WAIT_SECS: u64 = 30;

/// A cursor exposing `next()` and `reset()` (§4.1).
///
/// Uses an `AtomicU32` for the attempt counter rather than `&mut self` so a
/// `Backoff` can be shared behind an `Arc` the way other long-lived
/// synchronizer state is, without forcing every caller through a mutex for
/// what is otherwise a single counter.
#[derive(Debug)]
pub struct Backoff {
    base_secs: u64,
    max_wait_secs: u64,
    attempt: AtomicU32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_SECS, DEFAULT_MAX_WAIT_SECS)
    }
}

impl Backoff {
    pub fn new(base_secs: u64, max_wait_secs: u64) -> Self {
        Self {
            base_secs,
            max_wait_secs,
            attempt: AtomicU32::new(0),
        }
    }

    /// Returns `min(base * 2^n, max_wait)` seconds (as a `Duration`) and
    /// advances the attempt counter.
    pub fn next(&self) -> Duration {
        let n = self.attempt.fetch_add(1, Ordering::SeqCst);
        let factor = 1u64.checked_shl(n).unwrap_or(u64::MAX);
        let wait_secs = self.base_secs.saturating_mul(factor).min(self.max_wait_secs);
        Duration::from_secs(wait_secs)
    }

    /// Resets the attempt counter to zero.
    pub fn reset(&self) {
        self.attempt.store(0, Ordering::SeqCst);
    }

    /// The current attempt count (exposed for tests/telemetry).
    pub fn attempt(&self) -> u32 {
        self.attempt.load(Ordering::SeqCst)
    }
}

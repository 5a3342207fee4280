//! Fixed-window rate limiting for gate evaluations.
//!
//! Counts evaluations per wall-clock second. The window resets lazily on
//! the first call in a new second, so idle periods cost nothing. Wall-clock
//! jumps are accepted: a backwards jump simply opens a new window.

use chrono::Utc;
use parking_lot::Mutex;
use tracing::debug;

use pgate_core::DEFAULT_RATE_PER_SEC;

/// Current window: the second it covers and how many calls it admitted.
#[derive(Debug)]
struct Window {
    second: i64,
    count: u32,
}

/// Per-second fixed-window limiter.
///
/// Thread-safe: the read-reset-increment sequence runs under one lock, so
/// concurrent callers can never both be admitted past the ceiling.
#[derive(Debug)]
pub struct RateLimiter {
    /// Maximum admissions per second.
    max_per_sec: u32,
    window: Mutex<Window>,
}

impl RateLimiter {
    /// Create a limiter admitting `max_per_sec` calls per second.
    ///
    /// A ceiling of 0 means "not configured" and falls back to
    /// [`DEFAULT_RATE_PER_SEC`].
    pub fn new(max_per_sec: u32) -> Self {
        let max_per_sec = if max_per_sec == 0 {
            DEFAULT_RATE_PER_SEC
        } else {
            max_per_sec
        };
        Self {
            max_per_sec,
            window: Mutex::new(Window {
                second: i64::MIN,
                count: 0,
            }),
        }
    }

    /// Try to admit one call in the current wall-clock second.
    pub fn allow(&self) -> bool {
        self.allow_at(Utc::now().timestamp())
    }

    /// Try to admit one call in second `now_secs` (Unix seconds).
    pub fn allow_at(&self, now_secs: i64) -> bool {
        let mut window = self.window.lock();

        if window.second != now_secs {
            window.second = now_secs;
            window.count = 0;
        }

        if window.count >= self.max_per_sec {
            return false;
        }

        window.count += 1;
        if window.count == self.max_per_sec {
            debug!(max = self.max_per_sec, second = now_secs, "Rate limit window full");
        }
        true
    }

    /// Configured ceiling per second.
    pub fn ceiling(&self) -> u32 {
        self.max_per_sec
    }

    /// Admissions recorded in the most recent window.
    pub fn current_count(&self) -> u32 {
        self.window.lock().count
    }

    /// Remaining admissions in the most recent window.
    pub fn remaining_capacity(&self) -> u32 {
        self.max_per_sec.saturating_sub(self.current_count())
    }
}

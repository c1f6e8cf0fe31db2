//! Clock abstraction for freshness checks.
//!
//! Cache entries carry an absolute wall-clock expiry, so components that
//! compare against "now" take a [`Clock`] instead of calling
//! [`chrono::Utc::now`] directly. Tests inject a [`MockClock`] and move time
//! forward without sleeping.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use apsis_common::{Clock, MockClock};
//!
//! let clock = MockClock::new();
//! let start = clock.utc_now();
//! clock.advance(Duration::from_secs(31));
//! assert_eq!((clock.utc_now() - start).num_seconds(), 31);
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

/// Source of monotonic and wall-clock time.
pub trait Clock: Send + Sync {
    /// Monotonic instant, for measuring elapsed time.
    fn now(&self) -> Instant;

    /// Current wall-clock time in UTC.
    fn utc_now(&self) -> DateTime<Utc>;

    /// Seconds since the UNIX epoch.
    fn unix_seconds(&self) -> i64 {
        self.utc_now().timestamp()
    }
}

/// Real clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for deterministic tests.
///
/// Clones share the same elapsed offset, so a clock handed to a component
/// can still be advanced from the test body.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    base_utc: DateTime<Utc>,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    /// Create a clock frozen at the current real time.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(Utc::now())
    }

    /// Create a clock whose wall-clock reading starts at `base_utc`.
    #[must_use]
    pub fn starting_at(base_utc: DateTime<Utc>) -> Self {
        Self { start: Instant::now(), base_utc, elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    /// Move the clock forward.
    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }

    /// Total simulated time since creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }

    fn utc_now(&self) -> DateTime<Utc> {
        // Saturate rather than fail on absurd offsets.
        let offset = chrono::Duration::from_std(self.elapsed()).unwrap_or(chrono::Duration::MAX);
        self.base_utc.checked_add_signed(offset).unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

//! Reconnection schedules
//!
//! The transport never gives up. After every closed channel or failed connect
//! attempt it asks the strategy how long to wait, keyed by the number of
//! consecutive failures (0 before the very first attempt, reset to 0 by every
//! successful open).
//!
//! # Built-in Strategies
//!
//! - **SteppedBackoff**: the default step table, 0ms → 100ms → 1s → 3s → 5s
//! - **FixedDelay**: constant delay, mostly useful in tests
//!
//! Implement [`ReconnectionStrategy`] for anything else.
//!
//! # Examples
//!
//! ```rust
//! use liveo_client::{ReconnectionStrategy, SteppedBackoff};
//! use std::time::Duration;
//!
//! let schedule = SteppedBackoff::default();
//! assert_eq!(schedule.next_delay(0), Duration::ZERO);
//! assert_eq!(schedule.next_delay(7), Duration::from_secs(1));
//! ```

use std::time::Duration;

/// Delay policy for connection attempts
pub trait ReconnectionStrategy: Send + Sync {
    /// Delay before the next attempt after `failures` consecutive failures
    fn next_delay(&self, failures: u32) -> Duration;
}

/// Step table of delays keyed by consecutive failure count
///
/// Each step is `(first_failure_count, delay)`; the last step whose threshold is
/// reached applies, and the final step repeats forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SteppedBackoff {
    steps: Vec<(u32, Duration)>,
}

impl SteppedBackoff {
    /// Build a schedule from `(threshold, delay)` steps
    ///
    /// Steps are sorted by threshold. Failure counts below the smallest
    /// threshold connect immediately.
    pub fn new(mut steps: Vec<(u32, Duration)>) -> Self {
        steps.sort_by_key(|(threshold, _)| *threshold);
        Self { steps }
    }

    pub fn steps(&self) -> &[(u32, Duration)] {
        &self.steps
    }
}

impl Default for SteppedBackoff {
    fn default() -> Self {
        Self::new(vec![
            (0, Duration::ZERO),
            (1, Duration::from_millis(100)),
            (5, Duration::from_millis(1000)),
            (10, Duration::from_millis(3000)),
            (13, Duration::from_millis(5000)),
        ])
    }
}

impl ReconnectionStrategy for SteppedBackoff {
    fn next_delay(&self, failures: u32) -> Duration {
        self.steps
            .iter()
            .rev()
            .find(|(threshold, _)| failures >= *threshold)
            .map(|(_, delay)| *delay)
            .unwrap_or(Duration::ZERO)
    }
}

/// Fixed delay between attempts
///
/// The first attempt (no failures yet) still connects immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay {
    delay: Duration,
}

impl FixedDelay {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl ReconnectionStrategy for FixedDelay {
    fn next_delay(&self, failures: u32) -> Duration {
        if failures == 0 {
            Duration::ZERO
        } else {
            self.delay
        }
    }
}

//! Progress logging for long record loops.

use log::info;

use crate::logging::format_count;

/// Logs a progress line each time a running count crosses a multiple of the interval.
///
/// # Example
/// ```
/// use samspill_lib::progress::ProgressTracker;
///
/// let mut tracker = ProgressTracker::new("Spilled records").with_interval(100);
/// for _ in 0..250 {
///     tracker.record(1); // Logs at 100, 200
/// }
/// tracker.log_final(); // Logs "Spilled records 250 (complete)"
/// assert_eq!(tracker.count(), 250);
/// ```
#[derive(Debug)]
pub struct ProgressTracker {
    interval: u64,
    message: String,
    count: u64,
}

impl ProgressTracker {
    /// Create a new tracker with the given message prefix and an interval of 1,000,000.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { interval: 1_000_000, message: message.into(), count: 0 }
    }

    /// Set the logging interval. An interval of zero is treated as one.
    #[must_use]
    pub fn with_interval(mut self, interval: u64) -> Self {
        self.interval = interval.max(1);
        self
    }

    /// Add to the count, logging once for every interval boundary crossed.
    ///
    /// Returns `true` if the new count lies exactly on a boundary.
    pub fn record(&mut self, additional: u64) -> bool {
        let prev = self.count;
        self.count += additional;

        for i in (prev / self.interval + 1)..=(self.count / self.interval) {
            info!("{} {}", self.message, format_count(i * self.interval));
        }
        self.count > 0 && self.count.is_multiple_of(self.interval)
    }

    /// Log the final count unless the last boundary already did.
    pub fn log_final(&self) {
        if self.count > 0 && !self.count.is_multiple_of(self.interval) {
            info!("{} {} (complete)", self.message, format_count(self.count));
        }
    }

    /// The current count.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }
}

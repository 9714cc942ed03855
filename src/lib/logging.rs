//! Logging helpers for formatted output.
//!
//! This module provides consistent, user-friendly formatting for counts, sizes, rates and
//! operation summaries.

use std::time::{Duration, Instant};

use crate::spill::SpillStats;

/// Formats a count with thousands separators.
///
/// # Examples
///
/// ```
/// use samspill_lib::logging::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1234), "1,234");
/// assert_eq!(format_count(1_000_000), "1,000,000");
/// ```
#[must_use]
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a percentage with specified decimal places.
///
/// # Examples
///
/// ```
/// use samspill_lib::logging::format_percent;
///
/// assert_eq!(format_percent(0.9543, 2), "95.43%");
/// assert_eq!(format_percent(1.0, 0), "100%");
/// ```
#[must_use]
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0, decimals = decimals)
}

/// Formats a byte count using binary units.
///
/// # Examples
///
/// ```
/// use samspill_lib::logging::format_bytes;
///
/// assert_eq!(format_bytes(512), "512 B");
/// assert_eq!(format_bytes(1536), "1.5 KiB");
/// assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MiB");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1} {}", UNITS[unit])
}

/// Formats a duration in human-readable form (e.g. "45s", "2m 15s", "1h 30m").
///
/// # Examples
///
/// ```
/// use samspill_lib::logging::format_duration;
/// use std::time::Duration;
///
/// assert_eq!(format_duration(Duration::from_secs(45)), "45s");
/// assert_eq!(format_duration(Duration::from_secs(135)), "2m 15s");
/// assert_eq!(format_duration(Duration::from_secs(5400)), "1h 30m");
/// ```
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        let mins = secs / 60;
        let remaining_secs = secs % 60;
        if remaining_secs == 0 { format!("{mins}m") } else { format!("{mins}m {remaining_secs}s") }
    } else {
        let hours = secs / 3600;
        let mins = (secs % 3600) / 60;
        if mins == 0 { format!("{hours}h") } else { format!("{hours}h {mins}m") }
    }
}

/// Formats a rate (items per second), falling back to items per minute for slow rates.
///
/// # Examples
///
/// ```
/// use samspill_lib::logging::format_rate;
/// use std::time::Duration;
///
/// assert_eq!(format_rate(1000, Duration::from_secs(1)), "1,000 items/s");
/// assert_eq!(format_rate(30, Duration::from_secs(60)), "30.0 items/min");
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_rate(count: u64, duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{} items/s", format_count(count));
    }

    let rate = count as f64 / secs;
    if rate >= 1.0 {
        format!("{} items/s", format_count(rate as u64))
    } else {
        let items_per_min = count as f64 / (secs / 60.0);
        format!("{items_per_min:.1} items/min")
    }
}

/// Logs a summary of one spill file's write and read passes.
///
/// ```no_run
/// use samspill_lib::logging::log_spill_summary;
/// use samspill_lib::spill::SpillStats;
///
/// log_spill_summary("chunk.spill", &SpillStats::default());
/// ```
#[allow(clippy::cast_precision_loss)]
pub fn log_spill_summary(name: &str, stats: &SpillStats) {
    log::info!("Spill Summary ({name}):");
    log::info!("  Records written: {}", format_count(stats.records_written));
    log::info!("  Groups written: {}", format_count(stats.groups_written));
    log::info!("  Uncompressed: {}", format_bytes(stats.bytes_written));
    log::info!("  On disk: {}", format_bytes(stats.file_bytes_written));

    if stats.bytes_written > 0 {
        let saved = 1.0 - stats.file_bytes_written as f64 / stats.bytes_written as f64;
        log::info!(
            "  Compression: {:.2}x ({} saved)",
            stats.compression_ratio(),
            format_percent(saved.max(0.0), 1)
        );
    }

    if stats.records_read > 0 {
        log::info!("  Records read back: {}", format_count(stats.records_read));
    }
}

/// Operation timing helper.
///
/// # Examples
///
/// ```no_run
/// use samspill_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Spilling records");
///
/// // ... do work ...
///
/// timer.log_completion(10_000);
/// ```
pub struct OperationTimer {
    operation: String,
    start_time: Instant,
}

impl OperationTimer {
    /// Creates a new operation timer and logs the start.
    #[must_use]
    pub fn new(operation: &str) -> Self {
        log::info!("{operation} ...");
        Self { operation: operation.to_string(), start_time: Instant::now() }
    }

    /// Logs the completion with item count and rate.
    pub fn log_completion(&self, count: u64) {
        let duration = self.start_time.elapsed();
        log::info!(
            "{} completed: {} in {} ({})",
            self.operation,
            format_count(count),
            format_duration(duration),
            format_rate(count, duration)
        );
    }
}

//! Logging utilities for formatted output.
//!
//! Count, percentage, duration and rate formatting shared by progress messages and the
//! end-of-run filter summary.

use std::time::{Duration, Instant};

use crate::metrics::FilterMetrics;

/// Formats a count with thousands separators.
///
/// # Examples
///
/// ```
/// use samfilter_lib::logging::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1234567), "1,234,567");
/// ```
#[must_use]
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// Formats a fraction (0.0-1.0) as a percentage with `decimals` decimal places.
///
/// ```
/// use samfilter_lib::logging::format_percent;
///
/// assert_eq!(format_percent(0.9543, 2), "95.43%");
/// assert_eq!(format_percent(1.0, 0), "100%");
/// ```
#[must_use]
pub fn format_percent(value: f64, decimals: usize) -> String {
    format!("{:.decimals$}%", value * 100.0, decimals = decimals)
}

/// Formats a duration in human-readable form (e.g. "45s", "2m 15s", "1h 30m").
#[must_use]
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{secs}s")
    } else if secs < 3600 {
        let (mins, rem) = (secs / 60, secs % 60);
        if rem == 0 { format!("{mins}m") } else { format!("{mins}m {rem}s") }
    } else {
        let (hours, mins) = (secs / 3600, (secs % 3600) / 60);
        if mins == 0 { format!("{hours}h") } else { format!("{hours}h {mins}m") }
    }
}

/// Formats a processing rate as records per second, falling back to records per minute
/// for slow runs.
#[must_use]
pub fn format_rate(count: u64, duration: Duration) -> String {
    let secs = duration.as_secs_f64();
    if secs < 0.001 {
        return format!("{} records/s", format_count(count));
    }

    let rate = count as f64 / secs;
    if rate >= 1.0 {
        format!("{} records/s", format_count(rate as u64))
    } else {
        format!("{:.1} records/min", count as f64 / (secs / 60.0))
    }
}

/// Logs a formatted summary of a filtering pass.
///
/// Orphaned mates are only reported when some were seen.
pub fn log_filter_summary(metrics: &FilterMetrics) {
    log::info!("Filter Summary:");
    log::info!("  Total records: {}", format_count(metrics.total_records));
    log::info!("  Kept records: {}", format_count(metrics.kept_records));
    log::info!("  Filtered records: {}", format_count(metrics.filtered_records));

    if metrics.total_records > 0 {
        log::info!("  Kept: {}", format_percent(metrics.fraction_kept(), 2));
    }

    if metrics.orphaned_mates > 0 {
        log::info!(
            "  {} paired records had no mate in the input and were judged alone.",
            format_count(metrics.orphaned_mates)
        );
    }
}

/// Operation timing and summary helper.
///
/// ```no_run
/// use samfilter_lib::logging::OperationTimer;
///
/// let timer = OperationTimer::new("Filtering records");
/// // ... do work ...
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

    /// Logs the completion with record count and rate.
    pub fn log_completion(&self, count: u64) {
        let duration = self.start_time.elapsed();
        log::info!(
            "{} completed: {} records in {} ({})",
            self.operation,
            format_count(count),
            format_duration(duration),
            format_rate(count, duration)
        );
    }
}

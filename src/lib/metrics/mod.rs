//! Metrics collected while filtering.
//!
//! - [`FilterMetrics`] - record counts for one filtering pass
//! - [`writer`] - Metrics file I/O utilities

pub mod writer;

use serde::{Deserialize, Serialize};

pub use writer::write_metrics;

/// Core trait for metrics that are written to TSV files.
pub trait Metric: Serialize + for<'de> Deserialize<'de> + Clone + Default {
    /// Human-readable name used in error messages when writing metrics files.
    fn metric_name() -> &'static str;
}

/// Counts for one filtering pass.
///
/// `total_records == kept_records + filtered_records` once the pass completes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterMetrics {
    /// Records read from the source
    pub total_records: u64,
    /// Records written to the sink
    pub kept_records: u64,
    /// Records dropped by the filter
    pub filtered_records: u64,
    /// Paired records whose mate never appeared and were decided on their own
    pub orphaned_mates: u64,
}

impl FilterMetrics {
    /// Fraction of input records that were kept, or 0 for an empty input.
    #[must_use]
    pub fn fraction_kept(&self) -> f64 {
        if self.total_records == 0 {
            0.0
        } else {
            self.kept_records as f64 / self.total_records as f64
        }
    }
}

impl Metric for FilterMetrics {
    fn metric_name() -> &'static str {
        "filter"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_kept() {
        assert!(FilterMetrics::default().fraction_kept().abs() < f64::EPSILON);
        let metrics = FilterMetrics {
            total_records: 8,
            kept_records: 6,
            filtered_records: 2,
            orphaned_mates: 0,
        };
        assert!((metrics.fraction_kept() - 0.75).abs() < f64::EPSILON);
    }
}

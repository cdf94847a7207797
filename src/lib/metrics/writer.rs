//! Utilities for writing metrics files.

use anyhow::{Context, Result};
use fgoxide::io::DelimFile;
use std::path::Path;

use super::Metric;

/// Writes metrics rows to a tab-separated file with a header line.
///
/// # Errors
///
/// Returns an error naming the metric type and path if the file cannot be written.
pub fn write_metrics<P: AsRef<Path>, T: Metric>(path: P, metrics: &[T]) -> Result<()> {
    let path_ref = path.as_ref();
    DelimFile::default().write_tsv(&path_ref, metrics).with_context(|| {
        format!("Failed to write {} metrics: {}", T::metric_name(), path_ref.display())
    })
}

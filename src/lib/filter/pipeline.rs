//! The streaming filter driver.

use log::debug;

use crate::errors::{FilterError, Result};
use crate::filter::ReadFilter;
use crate::filter::pairing::{PairingCoordinator, Released};
use crate::filter::record::AlignmentRecord;
use crate::metrics::FilterMetrics;
use crate::progress::{DEFAULT_PROGRESS_INTERVAL, ProgressTracker};

/// Destination for kept records.
pub trait RecordSink<R> {
    /// Writes one kept record.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the record cannot be written.
    fn write_record(&mut self, record: R) -> Result<()>;
}

impl<R> RecordSink<R> for Vec<R> {
    fn write_record(&mut self, record: R) -> Result<()> {
        self.push(record);
        Ok(())
    }
}

/// Streams records through one [`ReadFilter`] into a [`RecordSink`].
///
/// Records reach the sink in input order. Each call to [`run`](Self::run) is an
/// independent pass with its own counters.
#[derive(Debug)]
pub struct FilterPipeline<R> {
    filter: ReadFilter<R>,
    progress_interval: u64,
}

impl<R: AlignmentRecord> FilterPipeline<R> {
    #[must_use]
    pub fn new(filter: ReadFilter<R>) -> Self {
        Self { filter, progress_interval: DEFAULT_PROGRESS_INTERVAL }
    }

    /// Number of input records between progress log messages.
    #[must_use]
    pub fn with_progress_interval(mut self, interval: u64) -> Self {
        self.progress_interval = interval;
        self
    }

    #[must_use]
    pub fn filter(&self) -> &ReadFilter<R> {
        &self.filter
    }

    /// Filters `records` into `sink` and returns the pass's counts.
    ///
    /// # Errors
    ///
    /// Stops at the first source, predicate or sink error. Records written before the
    /// error stay in the sink; finishing it is the caller's job.
    pub fn run<I, E, S>(&mut self, records: I, sink: &mut S) -> Result<FilterMetrics>
    where
        I: IntoIterator<Item = std::result::Result<R, E>>,
        E: Into<FilterError>,
        S: RecordSink<R> + ?Sized,
    {
        debug!("Filtering records with the {} filter", self.filter.name());
        let mut coordinator = PairingCoordinator::new();
        let mut progress =
            ProgressTracker::new("Processed records").with_interval(self.progress_interval);
        let mut metrics = FilterMetrics::default();

        for result in records {
            let record = result.map_err(Into::into)?;
            metrics.total_records += 1;
            coordinator.push(&mut self.filter, record)?;
            release_ready(&mut coordinator, sink, &mut metrics)?;
            progress.log_if_needed(1);
        }

        metrics.orphaned_mates = coordinator.finish();
        release_ready(&mut coordinator, sink, &mut metrics)?;
        progress.log_final();
        Ok(metrics)
    }
}

fn release_ready<R, S>(
    coordinator: &mut PairingCoordinator<R>,
    sink: &mut S,
    metrics: &mut FilterMetrics,
) -> Result<()>
where
    S: RecordSink<R> + ?Sized,
{
    while let Some(released) = coordinator.pop_ready() {
        match released {
            Released::Kept(record) => {
                sink.write_record(record)?;
                metrics.kept_records += 1;
            }
            Released::Dropped => metrics.filtered_records += 1,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use crate::filter::intervals::{Interval, IntervalSet};
    use crate::filter::read_names::ReadNameSet;
    use crate::sam::builder::SamBuilder;
    use noodles::sam::alignment::RecordBuf;
    use rstest::rstest;

    /// Four templates on 151bp reads: A with both mates at the start of chr1, B the same
    /// on chr2, C with both mates far along chr1 and D with one mate beside A and the
    /// other beside C.
    fn templates() -> SamBuilder {
        let mut builder = SamBuilder::with_read_length(151);
        let _ = builder.add_pair().name("A").contig(0).start1(1).start2(151).build();
        let _ = builder.add_pair().name("B").contig(1).start1(1).start2(151).build();
        let _ = builder.add_pair().name("C").contig(0).start1(1_000).start2(1_000).build();
        let _ = builder.add_pair().name("D").contig(0).start1(1).start2(1_000).build();
        builder
    }

    fn run(
        filter: ReadFilter<RecordBuf>,
        records: &[RecordBuf],
    ) -> (FilterMetrics, Vec<RecordBuf>) {
        let mut pipeline = FilterPipeline::new(filter);
        let mut kept = Vec::new();
        let input = records.iter().cloned().map(Ok::<_, FilterError>);
        let metrics = pipeline.run(input, &mut kept).unwrap();
        (metrics, kept)
    }

    fn kept_names(kept: &[RecordBuf]) -> String {
        kept.iter().map(AlignmentRecord::display_name).collect()
    }

    fn chr1_start() -> IntervalSet {
        IntervalSet::new([Interval::new(0, "chr1", 1, 200).unwrap()])
    }

    #[rstest]
    #[case(true, "AACCDD")]
    #[case(false, "BB")]
    fn test_read_list_scenario(#[case] include: bool, #[case] expected: &str) {
        let builder = templates();
        let names = ReadNameSet::from_names(["A", "C", "D"]).unwrap();
        let filter = if include {
            ReadFilter::include_read_names(names)
        } else {
            ReadFilter::exclude_read_names(names)
        };

        let (metrics, kept) = run(filter, builder.records());
        assert_eq!(kept_names(&kept), expected);
        assert_eq!(metrics.total_records, 8);
        assert_eq!(metrics.kept_records as usize, expected.len());
        assert_eq!(metrics.kept_records + metrics.filtered_records, 8);
    }

    #[test]
    fn test_include_and_exclude_partition_input() {
        let builder = templates();
        let names = ReadNameSet::from_names(["B", "D"]).unwrap();
        let (_, included) = run(ReadFilter::include_read_names(names.clone()), builder.records());
        let (_, excluded) = run(ReadFilter::exclude_read_names(names), builder.records());

        let mut all: Vec<RecordBuf> = included.into_iter().chain(excluded).collect();
        all.sort_by_key(|r| (r.display_name(), r.flags().bits()));
        let mut input = builder.records().to_vec();
        input.sort_by_key(|r| (r.display_name(), r.flags().bits()));
        assert_eq!(all, input);
    }

    #[test]
    fn test_paired_intervals_scenario() {
        let builder = templates();
        let (metrics, kept) = run(ReadFilter::paired_intervals(chr1_start()), builder.records());
        assert_eq!(kept_names(&kept), "AADD");
        assert_eq!(metrics.kept_records, 4);
        assert_eq!(metrics.filtered_records, 4);
        assert_eq!(metrics.orphaned_mates, 0);
    }

    #[test]
    fn test_paired_intervals_without_matches_keeps_nothing() {
        let builder = templates();
        let intervals = IntervalSet::new([Interval::new(4, "chr5", 1, 1_000).unwrap()]);
        let (metrics, kept) = run(ReadFilter::paired_intervals(intervals), builder.records());
        assert!(kept.is_empty());
        assert_eq!(metrics.filtered_records, 8);
    }

    #[test]
    fn test_coordinate_sorted_input_keeps_order() {
        let builder = templates();
        let r = builder.records();
        // A1 D1 A2 C1 C2 D2 B1 B2
        let sorted = [&r[0], &r[6], &r[1], &r[4], &r[5], &r[7], &r[2], &r[3]].map(Clone::clone);

        let (_, kept) = run(ReadFilter::paired_intervals(chr1_start()), &sorted);
        assert_eq!(kept, vec![r[0].clone(), r[6].clone(), r[1].clone(), r[7].clone()]);
    }

    #[test]
    fn test_orphan_counted_and_judged_alone() {
        let builder = templates();
        // D2 is missing, so D1 is resolved at the end of input on its own overlap.
        let records = &builder.records()[..7];
        let (metrics, kept) = run(ReadFilter::paired_intervals(chr1_start()), records);
        assert_eq!(kept_names(&kept), "AAD");
        assert_eq!(metrics.orphaned_mates, 1);
        assert_eq!(metrics.total_records, 7);
    }

    #[test]
    fn test_aligned_filters() {
        let mut builder = SamBuilder::new();
        let _ = builder.add_pair().name("m").start1(10).start2(20).build();
        let _ = builder.add_pair().name("h").start1(10).build();
        let _ = builder.add_frag().name("u").build();

        let (_, mapped) = run(ReadFilter::include_aligned(), builder.records());
        let (_, unmapped) = run(ReadFilter::exclude_aligned(), builder.records());
        assert_eq!(kept_names(&mapped), "mmh");
        assert_eq!(kept_names(&unmapped), "hu");
    }

    #[test]
    fn test_predicate_error_aborts_run() {
        let builder = templates();
        let filter = ReadFilter::<RecordBuf>::predicate(|r: &RecordBuf| -> Result<bool> {
            if r.display_name() == "C" {
                return Err(FilterError::Evaluation {
                    read_name: r.display_name(),
                    reason: "refused".into(),
                });
            }
            Ok(true)
        });

        let mut pipeline = FilterPipeline::new(filter);
        let mut kept = Vec::new();
        let input = builder.records().iter().cloned().map(Ok::<_, FilterError>);
        let err = pipeline.run(input, &mut kept).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RuntimeEvaluation);
        assert_eq!(kept_names(&kept), "AABB");
    }

    #[test]
    fn test_source_error_is_io_error() {
        let builder = templates();
        let input = builder.records()[..2].iter().cloned().map(Ok).chain(std::iter::once(Err(
            std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "truncated"),
        )));

        let mut pipeline =
            FilterPipeline::new(ReadFilter::include_aligned()).with_progress_interval(1);
        let mut kept = Vec::new();
        let err = pipeline.run(input, &mut kept).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Io);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let (metrics, kept) = run(ReadFilter::include_aligned(), &[]);
        assert!(kept.is_empty());
        assert_eq!(metrics, FilterMetrics::default());
    }
}

#![deny(unsafe_code)]
// Clippy lint configuration for CI
// - cast_*: record counts are reported as floats and percentages
// - missing_*_doc: error and panic docs are given where they are not obvious
// - needless_pass_by_value: builders and constructors take ownership
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::needless_pass_by_value,
    clippy::items_after_statements,
    clippy::match_same_arms,
    clippy::redundant_closure_for_method_calls,
    clippy::uninlined_format_args
)]

//! # samfilter - SAM/BAM record filtering library
//!
//! Streams alignment records from a SAM or BAM file through one filter policy and writes
//! the kept records, in input order, to a new file.
//!
//! ## Overview
//!
//! ### Filtering
//!
//! - **[`filter`]** - The [`ReadFilter`](filter::ReadFilter) policies, the mate-aware
//!   [`PairingCoordinator`](filter::PairingCoordinator) and the
//!   [`FilterPipeline`](filter::FilterPipeline) that drives them
//! - **[`reorder_buffer`]** - Releases records in input order while a mate is pending
//!
//! ### SAM/BAM
//!
//! - **[`bam_io`]** - Opening SAM/BAM readers and writers
//! - **[`header`]** - `@PG` chaining for output headers
//! - **[`sam`]** - Header inspection and the [`SamBuilder`](sam::SamBuilder) for tests
//!
//! ### Utilities
//!
//! - **[`errors`]** - The [`FilterError`](errors::FilterError) type
//! - **[`validation`]** - Parameter and file checks
//! - **[`progress`]** / **[`logging`]** - Progress and summary logging
//! - **[`metrics`]** - [`FilterMetrics`](metrics::FilterMetrics) and TSV output
//!
//! ## Quick Start
//!
//! ```no_run
//! use samfilter_lib::bam_io::{create_alignment_reader, create_alignment_writer};
//! use samfilter_lib::filter::{FilterParameters, FilterPipeline, FilterSelection};
//! use std::path::Path;
//!
//! # fn main() -> anyhow::Result<()> {
//! let params = FilterParameters {
//!     read_list: Some("names.txt".into()),
//!     ..FilterParameters::default()
//! };
//!
//! let (mut reader, header) = create_alignment_reader(Path::new("input.bam"), 1)?;
//! let filter = FilterSelection::IncludeReadList.build(&params, &header)?;
//! let mut sink = create_alignment_writer(Path::new("kept.bam"), &header, 1)?;
//!
//! let metrics = FilterPipeline::new(filter).run(reader.record_bufs(&header), &mut sink)?;
//! sink.finish()?;
//! println!("kept {} of {}", metrics.kept_records, metrics.total_records);
//! # Ok(())
//! # }
//! ```
//!
//! Any closure `FnMut(&RecordBuf) -> Result<bool>` can serve as a predicate:
//!
//! ```
//! use noodles::sam::alignment::RecordBuf;
//! use samfilter_lib::errors::Result;
//! use samfilter_lib::filter::{FilterPipeline, ReadFilter};
//! use samfilter_lib::sam::SamBuilder;
//!
//! let mut builder = SamBuilder::new();
//! let _ = builder.add_pair().name("mapped").start1(100).start2(300).build();
//! let _ = builder.add_frag().name("unmapped").build();
//!
//! let filter = ReadFilter::<RecordBuf>::predicate(|r: &RecordBuf| -> Result<bool> {
//!     Ok(r.flags().is_unmapped())
//! });
//! let mut kept = Vec::new();
//! let input = builder.records().iter().cloned().map(Ok::<_, std::io::Error>);
//! let metrics = FilterPipeline::new(filter).run(input, &mut kept).unwrap();
//! assert_eq!(metrics.kept_records, 1);
//! ```

pub mod bam_io;
pub mod errors;
pub mod filter;
pub mod header;
pub mod logging;
pub mod metrics;
pub mod progress;
pub mod reorder_buffer;
pub mod sam;
pub mod validation;

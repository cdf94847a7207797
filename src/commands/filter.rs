//! Filter SAM/BAM records by read name, interval overlap, alignment status, tag value or
//! an external predicate program.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::info;
use noodles::sam::alignment::RecordBuf;

use samfilter_lib::bam_io::{
    AlignmentSink, create_alignment_reader, create_alignment_writer, reads_path_for,
};
use samfilter_lib::errors::{self, FilterError};
use samfilter_lib::filter::read_names::ReadNameWriter;
use samfilter_lib::filter::record::AlignmentRecord;
use samfilter_lib::filter::{FilterParameters, FilterPipeline, FilterSelection, RecordSink};
use samfilter_lib::header::add_pg_record;
use samfilter_lib::logging::{OperationTimer, format_count, log_filter_summary};
use samfilter_lib::metrics::write_metrics;
use samfilter_lib::sam::warn_if_coordinate_sorted;

use crate::commands::command::Command;
use crate::commands::common::{BamIoOptions, ThreadingOptions};
use crate::version::VERSION;

/// Keeps the records of a SAM/BAM file selected by one filter policy.
#[derive(Debug, Parser)]
#[command(
    name = "filter",
    about = "\x1b[38;5;72m[FILTERING]\x1b[0m  \x1b[36mFilter SAM/BAM records\x1b[0m",
    long_about = r#"
Keep the records of a SAM or BAM file selected by one filter policy.

Exactly one policy is chosen with --filter. Each policy takes only the inputs it needs:

  include-aligned            keep mapped records
  exclude-aligned            keep unmapped records
  include-read-list          keep records named in --read-list
  exclude-read-list          keep records not named in --read-list
  include-paired-intervals   keep pairs where either mate overlaps --intervals
  include-script             keep records accepted by the --script program
  include-tag-values         keep records whose --tag value is a --tag-value
  exclude-tag-values         keep records whose --tag is absent or not a --tag-value

The camelCase names of Picard FilterSamReads (e.g. includeReadList) are also accepted.

Read lists hold one name per line; only the first word is used and a leading '@' is
removed. Interval lists are Picard interval lists or BED files (.bed or .bed.gz).

Mates stay together: records are kept or dropped by template, so both mates of a pair
always share a fate. With include-paired-intervals the first mate is held until its
partner arrives. A mate that never appears is judged on its own overlap.

The script program receives the SAM header and then one SAM line per record on standard
input, and must answer each record with one line: true/yes/keep/1 to keep the record,
false/no/drop/0 or an empty line to drop it.

Records are written in input order. Output ending in .sam is written as SAM, anything
else as BAM. An input of '-' reads BAM from standard input.

Example usage:
  samfilter filter -i in.bam -o kept.bam -f include-read-list -l names.txt
  samfilter filter -i in.bam -o roi.bam -f include-paired-intervals -L targets.bed
  samfilter filter -i in.bam -o rg.sam -f include-tag-values -t RG -T A -T B
"#
)]
pub struct Filter {
    /// Input/output options
    #[command(flatten)]
    pub io: BamIoOptions,

    /// Filter policy to apply
    #[arg(short = 'f', long = "filter", value_enum)]
    pub filter: FilterSelection,

    /// File of read names, one per line
    #[arg(short = 'l', long = "read-list")]
    pub read_list: Option<PathBuf>,

    /// Picard interval list or BED file
    #[arg(short = 'L', long = "intervals")]
    pub intervals: Option<PathBuf>,

    /// Executable predicate program
    #[arg(short = 's', long = "script")]
    pub script: Option<PathBuf>,

    /// Two-character tag for the tag-value filters
    #[arg(short = 't', long = "tag")]
    pub tag: Option<String>,

    /// Tag value to match; may be repeated
    #[arg(short = 'T', long = "tag-value")]
    pub tag_values: Vec<String>,

    /// Optional output file for filtering metrics
    #[arg(short = 'm', long = "metrics")]
    pub metrics: Option<PathBuf>,

    /// Write the distinct read names of the input and output to `<stem>.reads` files
    /// alongside the output
    #[arg(long = "write-read-names", default_value = "false")]
    pub write_read_names: bool,

    /// Threading options
    #[command(flatten)]
    pub threading: ThreadingOptions,
}

impl Filter {
    fn parameters(&self) -> FilterParameters {
        FilterParameters {
            read_list: self.read_list.clone(),
            intervals: self.intervals.clone(),
            script: self.script.clone(),
            tag: self.tag.clone(),
            tag_values: self.tag_values.clone(),
        }
    }

    fn read_name_writers(&self) -> Result<(Option<ReadNameWriter>, Option<ReadNameWriter>)> {
        if !self.write_read_names {
            return Ok((None, None));
        }
        let dir = self.io.output_dir();
        let input_path = reads_path_for(&self.io.input, dir);
        let output_path = reads_path_for(&self.io.output, dir);
        if input_path == output_path {
            bail!(
                "Input and output read names would both be written to {}",
                input_path.display()
            );
        }
        let input = ReadNameWriter::create(input_path)?;
        let output = ReadNameWriter::create(output_path)?;
        Ok((Some(input), Some(output)))
    }
}

/// Output file plus the optional writer of kept read names.
struct KeptRecords {
    sink: AlignmentSink,
    names: Option<ReadNameWriter>,
}

impl RecordSink<RecordBuf> for KeptRecords {
    fn write_record(&mut self, record: RecordBuf) -> errors::Result<()> {
        if let Some(names) = self.names.as_mut() {
            names.record(record.read_name())?;
        }
        self.sink.write_record(record)
    }
}

impl KeptRecords {
    fn finish(self) -> Result<()> {
        self.sink.finish()?;
        if let Some(names) = self.names {
            let path = names.path().to_path_buf();
            names.finish().with_context(|| format!("Failed to write {}", path.display()))?;
        }
        Ok(())
    }
}

impl Command for Filter {
    fn execute(&self, command_line: &str) -> Result<()> {
        self.io.validate()?;
        let threads = self.threading.num_threads()?;
        let params = self.parameters();
        self.filter.validate(&params)?;

        let timer = OperationTimer::new("Filtering records");

        info!("Starting Filter");
        info!("Input: {}", self.io.input.display());
        info!("Output: {}", self.io.output.display());
        info!("Filter: {}", self.filter);
        if threads > 1 {
            info!("Using {threads} BGZF threads");
        }

        let (mut reader, header) = create_alignment_reader(&self.io.input, threads)?;
        let filter = self.filter.build(&params, &header)?;
        if self.filter == FilterSelection::IncludePairedIntervals {
            warn_if_coordinate_sorted(&header, &self.io.input);
        }

        let output_header = add_pg_record(header.clone(), VERSION.as_str(), command_line)?;
        let (mut input_names, output_names) = self.read_name_writers()?;
        let sink = create_alignment_writer(&self.io.output, &output_header, threads)?;
        let mut kept = KeptRecords { sink, names: output_names };

        let records = reader.record_bufs(&header).map(|result| {
            let record = result.map_err(FilterError::from)?;
            if let Some(names) = input_names.as_mut() {
                names.record(record.read_name())?;
            }
            Ok::<_, FilterError>(record)
        });

        let mut pipeline = FilterPipeline::new(filter);
        let run_result = pipeline.run(records, &mut kept);
        let finish_result = kept.finish();
        let metrics = run_result
            .with_context(|| format!("Failed to filter {}", self.io.input.display()))?;
        finish_result?;

        if let Some(names) = input_names {
            let count = format_count(names.len() as u64);
            info!("Wrote {count} input read names to {}", names.path().display());
            names.finish()?;
        }

        if let Some(path) = &self.metrics {
            write_metrics(path, std::slice::from_ref(&metrics))?;
            info!("Wrote metrics to {}", path.display());
        }

        log_filter_summary(&metrics);
        timer.log_completion(metrics.total_records);
        Ok(())
    }
}

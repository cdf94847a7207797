//! Genomic intervals and overlap queries.
//!
//! Interval files are read once, resolved against the input header, and turned into an
//! [`IntervalSet`]: per reference sequence, the intervals are sorted and merged into a
//! disjoint union so that an overlap query is a single binary search.
//!
//! Two on-disk formats are supported:
//!
//! - Picard interval lists: `@` header lines followed by
//!   `contig<TAB>start<TAB>end<TAB>strand<TAB>name` with 1-based inclusive coordinates.
//! - BED (`.bed`, `.bed.gz`): `contig<TAB>start<TAB>end[<TAB>name...]` with 0-based
//!   half-open coordinates, converted to 1-based inclusive on load.

use std::io::BufRead;
use std::path::Path;

use fgoxide::io::Io;
use noodles::sam::Header;

use crate::errors::{FilterError, Result};

const IO_COMPRESSION: u32 = 5;
const IO_BUFFER_SIZE: usize = 64 * 1024;

/// A closed genomic interval on one reference sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    /// Index of the reference sequence in the header
    pub reference_sequence_id: usize,
    /// Name of the reference sequence
    pub contig: String,
    /// 1-based inclusive start
    pub start: usize,
    /// 1-based inclusive end
    pub end: usize,
    /// Optional interval name
    pub name: Option<String>,
}

impl Interval {
    /// Creates an interval, checking `1 <= start <= end`.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinates are out of order or start below 1.
    pub fn new(
        reference_sequence_id: usize,
        contig: impl Into<String>,
        start: usize,
        end: usize,
    ) -> Result<Self> {
        if start == 0 {
            return Err(FilterError::parameter("interval", "start must be >= 1"));
        }
        if start > end {
            return Err(FilterError::parameter(
                "interval",
                format!("start {start} is greater than end {end}"),
            ));
        }
        Ok(Self { reference_sequence_id, contig: contig.into(), start, end, name: None })
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// True if this interval shares at least one base with `start..=end` on the same
    /// reference sequence.
    #[must_use]
    pub fn overlaps(&self, reference_sequence_id: usize, start: usize, end: usize) -> bool {
        self.reference_sequence_id == reference_sequence_id
            && start <= self.end
            && end >= self.start
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Intervals always cover at least one base.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// A set of intervals indexed for overlap queries.
#[derive(Debug, Clone, Default)]
pub struct IntervalSet {
    /// Disjoint, sorted `(start, end)` runs indexed by reference sequence id.
    merged: Vec<Vec<(usize, usize)>>,
    /// Number of intervals the set was built from, before merging.
    interval_count: usize,
}

impl IntervalSet {
    /// Builds a set from intervals in any order. Overlapping and abutting intervals are
    /// merged.
    #[must_use]
    pub fn new(intervals: impl IntoIterator<Item = Interval>) -> Self {
        let mut by_reference: Vec<Vec<(usize, usize)>> = Vec::new();
        let mut interval_count = 0;
        for interval in intervals {
            let id = interval.reference_sequence_id;
            if by_reference.len() <= id {
                by_reference.resize_with(id + 1, Vec::new);
            }
            by_reference[id].push((interval.start, interval.end));
            interval_count += 1;
        }

        for runs in &mut by_reference {
            runs.sort_unstable();
            let mut merged: Vec<(usize, usize)> = Vec::with_capacity(runs.len());
            for &(start, end) in runs.iter() {
                match merged.last_mut() {
                    Some(last) if start <= last.1.saturating_add(1) => last.1 = last.1.max(end),
                    _ => merged.push((start, end)),
                }
            }
            *runs = merged;
        }

        Self { merged: by_reference, interval_count }
    }

    /// Loads intervals from a Picard interval list or a BED file, chosen by extension,
    /// resolving contig names against `header`.
    ///
    /// # Errors
    ///
    /// Returns a load error for unreadable or malformed files, files with no intervals,
    /// and contigs missing from the header.
    pub fn from_path(path: &Path, header: &Header) -> Result<Self> {
        let format = IntervalFormat::from_path(path);
        let reader = Io::new(IO_COMPRESSION, IO_BUFFER_SIZE)
            .new_reader(path)
            .map_err(|e| FilterError::load(format.file_type(), path.display(), e.to_string()))?;

        let mut intervals = Vec::new();
        for (index, line) in reader.lines().enumerate() {
            let line = line
                .map_err(|e| FilterError::load(format.file_type(), path.display(), e.to_string()))?;
            let line_number = index + 1;
            let parsed = format.parse_line(&line).map_err(|reason| {
                let reason = format!("line {line_number}: {reason}");
                FilterError::load(format.file_type(), path.display(), reason)
            })?;
            let Some(fields) = parsed else {
                continue;
            };

            let reference_sequences = header.reference_sequences();
            let Some(reference_sequence_id) =
                reference_sequences.get_index_of(fields.contig.as_bytes())
            else {
                return Err(FilterError::ReferenceNotFound {
                    ref_name: fields.contig.to_string(),
                    path: path.display().to_string(),
                });
            };

            let mut interval = Interval {
                reference_sequence_id,
                contig: fields.contig.to_string(),
                start: fields.start,
                end: fields.end,
                name: None,
            };
            if let Some(name) = fields.name {
                interval = interval.with_name(name);
            }
            intervals.push(interval);
        }

        if intervals.is_empty() {
            return Err(FilterError::load(format.file_type(), path.display(), "no intervals found"));
        }
        Ok(Self::new(intervals))
    }

    /// True if `start..=end` on the given reference shares a base with any interval.
    #[must_use]
    pub fn overlaps(&self, reference_sequence_id: usize, start: usize, end: usize) -> bool {
        let Some(runs) = self.merged.get(reference_sequence_id) else {
            return false;
        };
        let idx = runs.partition_point(|&(run_start, _)| run_start <= end);
        idx > 0 && runs[idx - 1].1 >= start
    }

    /// Number of intervals the set was built from.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interval_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interval_count == 0
    }

    /// Number of disjoint runs after merging.
    #[must_use]
    pub fn merged_len(&self) -> usize {
        self.merged.iter().map(Vec::len).sum()
    }

    /// Total number of bases covered.
    #[must_use]
    pub fn territory(&self) -> u64 {
        self.merged.iter().flatten().map(|&(start, end)| (end - start + 1) as u64).sum()
    }
}

/// Interval file formats, detected from the file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalFormat {
    IntervalList,
    Bed,
}

/// The columns of one data line, already converted to 1-based inclusive coordinates.
#[derive(Debug, PartialEq, Eq)]
struct IntervalFields<'a> {
    contig: &'a str,
    start: usize,
    end: usize,
    name: Option<&'a str>,
}

impl IntervalFormat {
    /// BED for `.bed` and `.bed.gz`, interval list otherwise.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        if name.ends_with(".bed") || name.ends_with(".bed.gz") {
            Self::Bed
        } else {
            Self::IntervalList
        }
    }

    fn file_type(self) -> &'static str {
        match self {
            Self::IntervalList => "interval list",
            Self::Bed => "BED file",
        }
    }

    /// Parses one line. Returns `Ok(None)` for header, comment and blank lines.
    fn parse_line(self, line: &str) -> std::result::Result<Option<IntervalFields<'_>>, String> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return Ok(None);
        }
        match self {
            Self::IntervalList if line.starts_with('@') => return Ok(None),
            Self::Bed
                if line.starts_with('#')
                    || line.starts_with("track")
                    || line.starts_with("browser") =>
            {
                return Ok(None);
            }
            _ => {}
        }

        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 3 {
            return Err(format!(
                "expected at least 3 tab-separated columns, found {}",
                fields.len()
            ));
        }

        let contig = fields[0];
        let start = parse_coordinate(fields[1], "start")?;
        let end = parse_coordinate(fields[2], "end")?;

        let (start, end, name) = match self {
            Self::IntervalList => {
                if start == 0 {
                    return Err("start must be >= 1".to_string());
                }
                (start, end, fields.get(4).copied())
            }
            Self::Bed => {
                let start =
                    start.checked_add(1).ok_or_else(|| format!("start {start} is too large"))?;
                (start, end, fields.get(3).copied())
            }
        };
        if start > end {
            return Err(format!("start {start} is greater than end {end}"));
        }

        let name = name.filter(|n| !n.is_empty() && *n != ".");
        Ok(Some(IntervalFields { contig, start, end, name }))
    }
}

fn parse_coordinate(value: &str, column: &str) -> std::result::Result<usize, String> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| format!("{column} '{value}' is not a non-negative integer"))
}

//! The read filtering engine.
//!
//! A [`ReadFilter`] is one filter policy. The [`pipeline::FilterPipeline`] streams records
//! through it, using the [`pairing::PairingCoordinator`] so that policies which judge
//! whole templates see both mates before either is released, and so that output stays in
//! input order.
//!
//! - [`record`] - the [`AlignmentRecord`](record::AlignmentRecord) view filters work on
//! - [`read_names`] - read-name lists
//! - [`intervals`] - interval lists, BED files and overlap queries
//! - [`predicate`] - user-supplied predicates, including external scripts
//! - [`pairing`] - mate-pair coordination and ordered release
//! - [`pipeline`] - the streaming driver and record sinks
//! - [`selection`] - command-line filter selection and parameter validation

pub mod intervals;
pub mod pairing;
pub mod pipeline;
pub mod predicate;
pub mod read_names;
pub mod record;
pub mod selection;

use std::fmt;

use ahash::AHashSet;

use crate::errors::Result;
use intervals::IntervalSet;
use predicate::RecordPredicate;
use read_names::ReadNameSet;
use record::AlignmentRecord;

pub use pairing::PairingCoordinator;
pub use pipeline::{FilterPipeline, RecordSink};
pub use selection::{FilterParameters, FilterSelection};

/// Outcome of offering one record to the pairing coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterDecision {
    Keep,
    Drop,
    /// The record is the first mate seen for its template and is held until the second
    /// arrives or the input ends.
    Defer,
}

/// How much of a template a filter needs to see before deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pairing {
    /// Each record is decided on its own.
    PerRecord,
    /// Both mates are decided together: kept if either mate passes.
    Template,
}

/// One filter policy.
///
/// Every variant answers the same question for a record, "keep or drop", through
/// [`decide`](Self::decide). Only [`PairedIntervals`](Self::PairedIntervals) asks for
/// template-level decisions.
pub enum ReadFilter<R> {
    /// Keep mapped records (`include`) or unmapped records (`!include`).
    Aligned { include: bool },
    /// Keep records whose name is (`include`) or is not (`!include`) in the set.
    ReadNames { names: ReadNameSet, include: bool },
    /// Keep primary records of templates where either mate's alignment overlaps an
    /// interval. Secondary and supplementary records are dropped.
    PairedIntervals { intervals: IntervalSet },
    /// Keep records whose tag value is (`include`) or is not (`!include`) in the set.
    /// Records lacking the tag count as not in the set.
    TagValues { tag: [u8; 2], values: AHashSet<String>, include: bool },
    /// Keep records the predicate accepts.
    Predicate { predicate: Box<dyn RecordPredicate<R>> },
}

impl<R: AlignmentRecord> ReadFilter<R> {
    #[must_use]
    pub fn include_aligned() -> Self {
        Self::Aligned { include: true }
    }

    #[must_use]
    pub fn exclude_aligned() -> Self {
        Self::Aligned { include: false }
    }

    #[must_use]
    pub fn include_read_names(names: ReadNameSet) -> Self {
        Self::ReadNames { names, include: true }
    }

    #[must_use]
    pub fn exclude_read_names(names: ReadNameSet) -> Self {
        Self::ReadNames { names, include: false }
    }

    #[must_use]
    pub fn paired_intervals(intervals: IntervalSet) -> Self {
        Self::PairedIntervals { intervals }
    }

    #[must_use]
    pub fn tag_values<I, S>(tag: [u8; 2], values: I, include: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::TagValues { tag, values: values.into_iter().map(Into::into).collect(), include }
    }

    #[must_use]
    pub fn predicate(predicate: impl RecordPredicate<R> + 'static) -> Self {
        Self::Predicate { predicate: Box::new(predicate) }
    }

    /// Short description used in logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Aligned { include: true } => "include aligned",
            Self::Aligned { include: false } => "exclude aligned",
            Self::ReadNames { include: true, .. } => "include read names",
            Self::ReadNames { include: false, .. } => "exclude read names",
            Self::PairedIntervals { .. } => "include paired intervals",
            Self::TagValues { include: true, .. } => "include tag values",
            Self::TagValues { include: false, .. } => "exclude tag values",
            Self::Predicate { .. } => "include predicate",
        }
    }

    /// Whether `record` must be decided together with its mate.
    ///
    /// Only primary records of read pairs that carry a name are paired up; everything
    /// else is decided per record even under a template-level filter.
    #[must_use]
    pub fn pairing(&self, record: &R) -> Pairing {
        match self {
            Self::PairedIntervals { .. }
                if record.is_paired() && record.is_primary() && record.read_name().is_some() =>
            {
                Pairing::Template
            }
            _ => Pairing::PerRecord,
        }
    }

    /// Decides whether `record` passes this filter on its own merits.
    ///
    /// # Errors
    ///
    /// Only predicate filters can fail, with a runtime evaluation error.
    pub fn decide(&mut self, record: &R) -> Result<bool> {
        match self {
            Self::Aligned { include } => Ok(record.is_unmapped() != *include),
            Self::ReadNames { names, include } => {
                let listed = record.read_name().is_some_and(|name| names.contains(name));
                Ok(listed == *include)
            }
            Self::PairedIntervals { intervals } => Ok(record.is_primary()
                && record
                    .aligned_span()
                    .is_some_and(|(id, start, end)| intervals.overlaps(id, start, end))),
            Self::TagValues { tag, values, include } => {
                let listed = record.tag_value(*tag).is_some_and(|value| values.contains(&value));
                Ok(listed == *include)
            }
            Self::Predicate { predicate } => predicate.evaluate(record),
        }
    }
}

impl<R> fmt::Debug for ReadFilter<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Aligned { include } => {
                f.debug_struct("Aligned").field("include", include).finish()
            }
            Self::ReadNames { names, include } => f
                .debug_struct("ReadNames")
                .field("names", &names.len())
                .field("include", include)
                .finish(),
            Self::PairedIntervals { intervals } => {
                f.debug_struct("PairedIntervals").field("intervals", &intervals.len()).finish()
            }
            Self::TagValues { tag, values, include } => f
                .debug_struct("TagValues")
                .field("tag", &String::from_utf8_lossy(tag))
                .field("values", values)
                .field("include", include)
                .finish(),
            Self::Predicate { .. } => f.write_str("Predicate"),
        }
    }
}

//! Command-line filter selection.
//!
//! A [`FilterSelection`] names one filter policy. Each selection requires some of the
//! [`FilterParameters`] and forbids the rest; [`FilterSelection::validate`] enforces that
//! before any input is opened, and [`FilterSelection::build`] loads the auxiliary files and
//! constructs the [`ReadFilter`].

use std::fmt;
use std::path::PathBuf;

use clap::ValueEnum;
use log::info;
use noodles::sam::Header;
use noodles::sam::alignment::RecordBuf;

use crate::errors::{FilterError, Result};
use crate::filter::ReadFilter;
use crate::filter::intervals::IntervalSet;
use crate::filter::predicate::ScriptPredicate;
use crate::filter::read_names::ReadNameSet;
use crate::logging::format_count;
use crate::validation::validate_tag;

/// Which records to keep.
///
/// The camelCase names of the Picard `FilterSamReads` tool are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FilterSelection {
    /// Keep mapped records
    #[value(alias = "includeAligned")]
    IncludeAligned,
    /// Keep unmapped records
    #[value(alias = "excludeAligned")]
    ExcludeAligned,
    /// Keep records named in --read-list
    #[value(alias = "includeReadList")]
    IncludeReadList,
    /// Keep records not named in --read-list
    #[value(alias = "excludeReadList")]
    ExcludeReadList,
    /// Keep pairs where either mate overlaps --intervals
    #[value(alias = "includePairedIntervals")]
    IncludePairedIntervals,
    /// Keep records accepted by the --script program
    #[value(alias = "includeJavascript")]
    IncludeScript,
    /// Keep records whose --tag value is one of --tag-value
    #[value(alias = "includeTagValues")]
    IncludeTagValues,
    /// Keep records whose --tag value is absent or not one of --tag-value
    #[value(alias = "excludeTagValues")]
    ExcludeTagValues,
}

impl fmt::Display for FilterSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_possible_value() {
            Some(value) => f.write_str(value.get_name()),
            None => Ok(()),
        }
    }
}

/// An input that some selections require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter {
    ReadList,
    Intervals,
    Script,
    Tag,
    TagValues,
}

impl Parameter {
    pub const ALL: [Parameter; 5] = [
        Parameter::ReadList,
        Parameter::Intervals,
        Parameter::Script,
        Parameter::Tag,
        Parameter::TagValues,
    ];

    /// The command-line flag that supplies this parameter.
    #[must_use]
    pub fn flag(self) -> &'static str {
        match self {
            Parameter::ReadList => "--read-list",
            Parameter::Intervals => "--intervals",
            Parameter::Script => "--script",
            Parameter::Tag => "--tag",
            Parameter::TagValues => "--tag-value",
        }
    }
}

/// The optional inputs of the filter command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterParameters {
    pub read_list: Option<PathBuf>,
    pub intervals: Option<PathBuf>,
    pub script: Option<PathBuf>,
    pub tag: Option<String>,
    pub tag_values: Vec<String>,
}

impl FilterParameters {
    #[must_use]
    pub fn is_present(&self, parameter: Parameter) -> bool {
        match parameter {
            Parameter::ReadList => self.read_list.is_some(),
            Parameter::Intervals => self.intervals.is_some(),
            Parameter::Script => self.script.is_some(),
            Parameter::Tag => self.tag.is_some(),
            Parameter::TagValues => !self.tag_values.is_empty(),
        }
    }
}

impl FilterSelection {
    /// The parameters this selection needs; every other parameter is rejected.
    #[must_use]
    pub fn required_parameters(self) -> &'static [Parameter] {
        match self {
            Self::IncludeAligned | Self::ExcludeAligned => &[],
            Self::IncludeReadList | Self::ExcludeReadList => &[Parameter::ReadList],
            Self::IncludePairedIntervals => &[Parameter::Intervals],
            Self::IncludeScript => &[Parameter::Script],
            Self::IncludeTagValues | Self::ExcludeTagValues => {
                &[Parameter::Tag, Parameter::TagValues]
            }
        }
    }

    /// Checks that exactly the required parameters are present and well formed.
    ///
    /// Only the parameter values are inspected; no file is opened.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first missing or extra parameter.
    pub fn validate(self, params: &FilterParameters) -> Result<()> {
        let required = self.required_parameters();
        for parameter in Parameter::ALL {
            let needed = required.contains(&parameter);
            let present = params.is_present(parameter);
            if needed && !present {
                return Err(FilterError::parameter(
                    parameter.flag(),
                    format!("required by --filter {self}"),
                ));
            }
            if present && !needed {
                return Err(FilterError::parameter(
                    parameter.flag(),
                    format!("not allowed with --filter {self}"),
                ));
            }
        }
        if let Some(tag) = &params.tag {
            validate_tag(tag, Parameter::Tag.flag())?;
        }
        Ok(())
    }

    /// Validates `params`, loads the auxiliary input and constructs the filter.
    ///
    /// # Errors
    ///
    /// Returns a configuration error from [`validate`](Self::validate) or a load error
    /// from the read-name, interval or script loader.
    pub fn build(
        self,
        params: &FilterParameters,
        header: &Header,
    ) -> Result<ReadFilter<RecordBuf>> {
        self.validate(params)?;

        let filter = match self {
            Self::IncludeAligned => ReadFilter::include_aligned(),
            Self::ExcludeAligned => ReadFilter::exclude_aligned(),
            Self::IncludeReadList | Self::ExcludeReadList => {
                let path = required(params.read_list.as_deref(), Parameter::ReadList)?;
                let names = ReadNameSet::from_path(path)?;
                let count = format_count(names.len() as u64);
                info!("Loaded {count} read names from {}", path.display());
                if self == Self::IncludeReadList {
                    ReadFilter::include_read_names(names)
                } else {
                    ReadFilter::exclude_read_names(names)
                }
            }
            Self::IncludePairedIntervals => {
                let path = required(params.intervals.as_deref(), Parameter::Intervals)?;
                let intervals = IntervalSet::from_path(path, header)?;
                info!(
                    "Loaded {} intervals ({} after merging, {} bp) from {}",
                    format_count(intervals.len() as u64),
                    format_count(intervals.merged_len() as u64),
                    format_count(intervals.territory()),
                    path.display()
                );
                ReadFilter::paired_intervals(intervals)
            }
            Self::IncludeScript => {
                let path = required(params.script.as_deref(), Parameter::Script)?;
                let predicate = ScriptPredicate::load(path, header)?;
                info!("Started predicate script {}", predicate.path().display());
                ReadFilter::predicate(predicate)
            }
            Self::IncludeTagValues | Self::ExcludeTagValues => {
                let tag = required(params.tag.as_deref(), Parameter::Tag)?;
                let tag = validate_tag(tag, Parameter::Tag.flag())?;
                let values = params.tag_values.iter().cloned();
                ReadFilter::tag_values(tag, values, self == Self::IncludeTagValues)
            }
        };
        Ok(filter)
    }
}

fn required<T: ?Sized>(value: Option<&T>, parameter: Parameter) -> Result<&T> {
    value.ok_or_else(|| FilterError::parameter(parameter.flag(), "is required"))
}

//! Custom error types for samfilter operations.

use std::fmt;

use thiserror::Error;

/// Result type alias for samfilter operations
pub type Result<T> = std::result::Result<T, FilterError>;

/// Error type for samfilter operations
#[derive(Error, Debug)]
pub enum FilterError {
    /// Invalid parameter value, or a parameter that is missing or not allowed for the
    /// selected filter
    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidParameter {
        /// The parameter name
        parameter: String,
        /// Explanation of why it's invalid
        reason: String,
    },

    /// An auxiliary input (read list, interval list, predicate) could not be loaded
    #[error("Failed to load {file_type} '{path}': {reason}")]
    Load {
        /// Type of file (e.g., "read name list", "interval list")
        file_type: String,
        /// Path to the file
        path: String,
        /// Explanation of the problem
        reason: String,
    },

    /// A contig named in an interval file is absent from the input header
    #[error("Reference sequence '{ref_name}' from '{path}' not found in input header")]
    ReferenceNotFound {
        /// The reference sequence name
        ref_name: String,
        /// Path to the file naming the contig
        path: String,
    },

    /// The user-supplied predicate failed while evaluating a record
    #[error("Predicate failed on read '{read_name}': {reason}")]
    Evaluation {
        /// Name of the record being evaluated
        read_name: String,
        /// Explanation of the failure
        reason: String,
    },

    /// Reading the source or writing the sink failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Broad category of a [`FilterError`].
///
/// Configuration and load errors are raised before any record is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong, missing or extra parameter for the selected filter
    Configuration,
    /// Malformed or empty auxiliary input, or an unknown contig
    Load,
    /// Predicate failure on a specific record
    RuntimeEvaluation,
    /// Source or sink failure
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Configuration => "configuration",
            Self::Load => "load",
            Self::RuntimeEvaluation => "runtime evaluation",
            Self::Io => "io",
        };
        f.write_str(name)
    }
}

impl FilterError {
    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter { .. } => ErrorKind::Configuration,
            Self::Load { .. } | Self::ReferenceNotFound { .. } => ErrorKind::Load,
            Self::Evaluation { .. } => ErrorKind::RuntimeEvaluation,
            Self::Io(_) => ErrorKind::Io,
        }
    }

    pub(crate) fn load(
        file_type: &str,
        path: impl fmt::Display,
        reason: impl Into<String>,
    ) -> Self {
        Self::Load {
            file_type: file_type.to_string(),
            path: path.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn parameter(parameter: &str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter { parameter: parameter.to_string(), reason: reason.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_parameter() {
        let error = FilterError::InvalidParameter {
            parameter: "--read-list".to_string(),
            reason: "required by --filter include-read-list".to_string(),
        };
        let msg = format!("{error}");
        assert!(msg.contains("Invalid parameter '--read-list'"));
        assert!(msg.contains("required by"));
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_load_error() {
        let error =
            FilterError::load("interval list", "/path/to/x.interval_list", "line 3: start > end");
        let msg = format!("{error}");
        assert!(msg.contains("Failed to load interval list '/path/to/x.interval_list'"));
        assert!(msg.contains("line 3"));
        assert_eq!(error.kind(), ErrorKind::Load);
    }

    #[test]
    fn test_reference_not_found() {
        let error = FilterError::ReferenceNotFound {
            ref_name: "chr99".to_string(),
            path: "x.bed".to_string(),
        };
        assert!(format!("{error}").contains("Reference sequence 'chr99'"));
        assert_eq!(error.kind(), ErrorKind::Load);
    }

    #[test]
    fn test_evaluation_error() {
        let error = FilterError::Evaluation {
            read_name: "q1".to_string(),
            reason: "unrecognized reply 'maybe'".to_string(),
        };
        assert!(format!("{error}").contains("read 'q1'"));
        assert_eq!(error.kind(), ErrorKind::RuntimeEvaluation);
        assert_eq!(error.kind().to_string(), "runtime evaluation");
    }

    #[test]
    fn test_io_error_from() {
        let error = FilterError::from(std::io::Error::other("disk full"));
        assert_eq!(error.kind(), ErrorKind::Io);
        assert!(format!("{error}").contains("disk full"));
    }
}

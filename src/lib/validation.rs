//! Input validation utilities
//!
//! Common checks for command-line parameters, file paths and SAM tags, reported through
//! the structured errors in [`crate::errors`].

use std::path::Path;

use crate::errors::{FilterError, Result};

/// Validate that a file exists
///
/// # Errors
/// Returns a load error if the file does not exist
///
/// # Example
/// ```
/// use samfilter_lib::validation::validate_file_exists;
///
/// let result = validate_file_exists("/nonexistent/file.bam", "Input BAM");
/// assert!(result.is_err());
/// ```
pub fn validate_file_exists<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        return Err(FilterError::load(description, path_ref.display(), "File does not exist"));
    }
    Ok(())
}

/// Validate that a path exists and is a regular file, not a directory or device
///
/// # Errors
/// Returns a load error if the path is missing or is not a regular file
pub fn validate_regular_file<P: AsRef<Path>>(path: P, description: &str) -> Result<()> {
    let path_ref = path.as_ref();
    validate_file_exists(path_ref, description)?;
    let metadata = std::fs::metadata(path_ref)?;
    if !metadata.is_file() {
        return Err(FilterError::load(description, path_ref.display(), "Not a regular file"));
    }
    Ok(())
}

/// Validate that a SAM tag is exactly 2 characters
///
/// # Errors
/// Returns an error if the tag is not exactly 2 ASCII characters
///
/// # Example
/// ```
/// use samfilter_lib::validation::validate_tag;
///
/// assert_eq!(validate_tag("RG", "--tag").unwrap(), [b'R', b'G']);
/// assert!(validate_tag("ABC", "--tag").is_err());
/// ```
pub fn validate_tag(tag: &str, name: &str) -> Result<[u8; 2]> {
    match tag.as_bytes() {
        &[a, b] if a.is_ascii_alphanumeric() && b.is_ascii_alphanumeric() => Ok([a, b]),
        _ => Err(FilterError::parameter(
            name,
            format!("Tag must be exactly 2 alphanumeric characters, got: '{tag}'"),
        )),
    }
}

/// Validate that an optional thread count is at least one, defaulting to a single thread
///
/// # Errors
/// Returns an error if the value is zero
pub fn validate_threads(threads: Option<usize>, name: &str) -> Result<usize> {
    match threads {
        None => Ok(1),
        Some(0) => Err(FilterError::parameter(name, "must be at least 1")),
        Some(n) => Ok(n),
    }
}

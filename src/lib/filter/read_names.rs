//! Read-name lists.
//!
//! A [`ReadNameSet`] holds the names selected by `--read-list`. Both mates of a pair
//! share a name, so membership alone keeps or drops whole templates. [`ReadNameWriter`]
//! goes the other way and records the distinct names seen in a stream.

use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::{Path, PathBuf};

use ahash::AHashSet;
use fgoxide::io::Io;

use crate::errors::{FilterError, Result};

const FILE_TYPE: &str = "read name list";

/// Compression level for [`Io`]; only its reader is used here.
const IO_COMPRESSION: u32 = 5;
const IO_BUFFER_SIZE: usize = 64 * 1024;

/// An immutable, non-empty set of read names compared by exact byte equality.
#[derive(Debug, Clone)]
pub struct ReadNameSet {
    names: AHashSet<Vec<u8>>,
}

impl ReadNameSet {
    /// Builds a set from names already in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if no names are supplied.
    pub fn from_names<I, N>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = N>,
        N: Into<Vec<u8>>,
    {
        let names: AHashSet<Vec<u8>> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(FilterError::parameter("read names", "at least one read name is required"));
        }
        Ok(Self { names })
    }

    /// Loads one read name per line from a plain or gzip-compressed file.
    ///
    /// Lines are trimmed and blank lines skipped. Only the first whitespace-delimited
    /// token is used, and a leading `@` is stripped so FASTQ header lines work as-is.
    ///
    /// # Errors
    ///
    /// Returns a load error if the file cannot be read or contains no names.
    pub fn from_path(path: &Path) -> Result<Self> {
        let reader = Io::new(IO_COMPRESSION, IO_BUFFER_SIZE)
            .new_reader(path)
            .map_err(|e| FilterError::load(FILE_TYPE, path.display(), e.to_string()))?;

        let mut names = AHashSet::new();
        for line in reader.lines() {
            let line =
                line.map_err(|e| FilterError::load(FILE_TYPE, path.display(), e.to_string()))?;
            if let Some(name) = parse_name(&line) {
                names.insert(name.as_bytes().to_vec());
            }
        }

        if names.is_empty() {
            return Err(FilterError::load(FILE_TYPE, path.display(), "no read names found"));
        }
        Ok(Self { names })
    }

    #[must_use]
    pub fn contains(&self, name: &[u8]) -> bool {
        self.names.contains(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Extracts the read name from one line of a read list.
fn parse_name(line: &str) -> Option<&str> {
    let token = line.split_whitespace().next()?;
    let name = token.strip_prefix('@').unwrap_or(token);
    (!name.is_empty()).then_some(name)
}

/// Writes each distinct read name it is shown to a text file, one per line, in order of
/// first appearance.
pub struct ReadNameWriter {
    path: PathBuf,
    seen: AHashSet<Vec<u8>>,
    writer: BufWriter<File>,
}

impl ReadNameWriter {
    /// Creates (or truncates) the output file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let writer = BufWriter::new(File::create(&path)?);
        Ok(Self { path, seen: AHashSet::new(), writer })
    }

    /// Records a name, writing it if it has not been seen before. Records without a
    /// name are ignored.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if writing fails.
    pub fn record(&mut self, name: Option<&[u8]>) -> Result<()> {
        let Some(name) = name else { return Ok(()) };
        if !self.seen.contains(name) {
            self.writer.write_all(name)?;
            self.writer.write_all(b"\n")?;
            self.seen.insert(name.to_vec());
        }
        Ok(())
    }

    /// Number of distinct names written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flushes the file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if flushing fails.
    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case("read1", Some("read1"))]
    #[case("  read1  ", Some("read1"))]
    #[case("@read1 1:N:0:ACGT", Some("read1"))]
    #[case("read1\tcomment", Some("read1"))]
    #[case("", None)]
    #[case("   ", None)]
    #[case("@", None)]
    fn test_parse_name(#[case] line: &str, #[case] expected: Option<&str>) {
        assert_eq!(parse_name(line), expected);
    }

    #[test]
    fn test_from_path_reads_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("names.txt");
        std::fs::write(&path, "q1\n\n@q2 extra\n  q3\nq1\n").unwrap();

        let set = ReadNameSet::from_path(&path).unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.contains(b"q1"));
        assert!(set.contains(b"q2"));
        assert!(set.contains(b"q3"));
        assert!(!set.contains(b"q4"));
        assert!(!set.contains(b"@q2"));
    }

    #[test]
    fn test_from_path_empty_file_is_load_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "\n   \n").unwrap();

        let err = ReadNameSet::from_path(&path).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Load);
        assert!(err.to_string().contains("no read names"));
    }

    #[test]
    fn test_from_path_missing_file_is_load_error() {
        let dir = TempDir::new().unwrap();
        let err = ReadNameSet::from_path(&dir.path().join("missing.txt")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Load);
    }

    #[test]
    fn test_from_names_requires_a_name() {
        assert!(ReadNameSet::from_names(Vec::<Vec<u8>>::new()).is_err());
        let set = ReadNameSet::from_names(["a", "b"]).unwrap();
        assert!(set.contains(b"a"));
        assert!(!set.is_empty());
    }

    #[test]
    fn test_read_name_writer_writes_distinct_names() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.reads");
        let mut writer = ReadNameWriter::create(&path).unwrap();
        let names: [Option<&[u8]>; 5] = [Some(b"b"), Some(b"a"), Some(b"b"), None, Some(b"c")];
        for name in names {
            writer.record(name).unwrap();
        }
        assert_eq!(writer.len(), 3);
        assert_eq!(writer.path(), path.as_path());
        writer.finish().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "b\na\nc\n");
    }
}

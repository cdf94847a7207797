//! SAM/BAM readers and writers.
//!
//! The format of a path follows its extension: `.sam` is SAM text, anything else is BAM.
//! `-` and `/dev/stdin` read BAM from standard input.
//!
//! # Threading
//!
//! BAM is BGZF-compressed, and (de)compression can run on worker threads:
//!
//! - `threads=1` uses the single-threaded BGZF reader and writer
//! - `threads>1` uses the multi-threaded BGZF reader and writer with that many workers
//!
//! Threads never change the order records are read or written in.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::num::NonZero;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use noodles::bgzf::io::{
    MultithreadedReader, MultithreadedWriter, Reader as BgzfReader, Writer as BgzfWriter,
};
use noodles::sam::Header;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::io::Write as AlignmentWrite;
use noodles::{bam, sam};

use crate::errors;
use crate::filter::RecordSink;

/// Byte source for BAM input: a file or standard input.
pub type InputStream = Box<dyn Read + Send>;

/// Single- or multi-threaded BGZF reader.
pub enum BgzfReaderEnum {
    SingleThreaded(BgzfReader<InputStream>),
    MultiThreaded(MultithreadedReader<InputStream>),
}

impl BgzfReaderEnum {
    fn new(inner: InputStream, threads: usize) -> Self {
        match NonZero::new(threads) {
            Some(workers) if threads > 1 => {
                Self::MultiThreaded(MultithreadedReader::with_worker_count(workers, inner))
            }
            _ => Self::SingleThreaded(BgzfReader::new(inner)),
        }
    }
}

impl Read for BgzfReaderEnum {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::SingleThreaded(r) => r.read(buf),
            Self::MultiThreaded(r) => r.read(buf),
        }
    }
}

impl BufRead for BgzfReaderEnum {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            Self::SingleThreaded(r) => r.fill_buf(),
            Self::MultiThreaded(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            Self::SingleThreaded(r) => r.consume(amt),
            Self::MultiThreaded(r) => r.consume(amt),
        }
    }
}

/// Single- or multi-threaded BGZF writer.
pub enum BgzfWriterEnum {
    SingleThreaded(BgzfWriter<File>),
    MultiThreaded(MultithreadedWriter<File>),
}

impl BgzfWriterEnum {
    fn new(file: File, threads: usize) -> Self {
        match NonZero::new(threads) {
            Some(workers) if threads > 1 => {
                Self::MultiThreaded(MultithreadedWriter::with_worker_count(workers, file))
            }
            _ => Self::SingleThreaded(BgzfWriter::new(file)),
        }
    }

    /// Flushes all blocks and writes the BGZF EOF marker.
    ///
    /// # Errors
    ///
    /// Returns an error if the final blocks cannot be written.
    pub fn finish(self) -> io::Result<()> {
        match self {
            Self::SingleThreaded(w) => w.finish().map(|_| ()),
            Self::MultiThreaded(mut w) => w.finish().map(|_| ()),
        }
    }
}

impl Write for BgzfWriterEnum {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::SingleThreaded(w) => w.write(buf),
            Self::MultiThreaded(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::SingleThreaded(w) => w.flush(),
            Self::MultiThreaded(w) => w.flush(),
        }
    }
}

/// A SAM or BAM record source.
pub enum AlignmentReader {
    Bam(bam::io::Reader<BgzfReaderEnum>),
    Sam(sam::io::Reader<BufReader<File>>),
}

impl AlignmentReader {
    /// Iterates over the remaining records in stored order.
    pub fn record_bufs<'a>(
        &'a mut self,
        header: &'a Header,
    ) -> Box<dyn Iterator<Item = io::Result<RecordBuf>> + 'a> {
        match self {
            Self::Bam(reader) => Box::new(reader.record_bufs(header)),
            Self::Sam(reader) => Box::new(reader.record_bufs(header)),
        }
    }
}

/// Opens a SAM or BAM file, or BAM on standard input, and reads its header.
///
/// # Errors
///
/// Returns an error if the input cannot be opened or its header cannot be read.
pub fn create_alignment_reader(path: &Path, threads: usize) -> Result<(AlignmentReader, Header)> {
    if is_sam_path(path) {
        let file = File::open(path)
            .with_context(|| format!("Failed to open input SAM: {}", path.display()))?;
        let mut reader = sam::io::Reader::new(BufReader::new(file));
        let header = reader
            .read_header()
            .with_context(|| format!("Failed to read header from: {}", path.display()))?;
        return Ok((AlignmentReader::Sam(reader), header));
    }

    let inner: InputStream = if is_stdin_path(path) {
        Box::new(io::stdin())
    } else {
        let file = File::open(path)
            .with_context(|| format!("Failed to open input BAM: {}", path.display()))?;
        Box::new(file)
    };
    let mut reader = bam::io::Reader::from(BgzfReaderEnum::new(inner, threads));
    let header = reader
        .read_header()
        .with_context(|| format!("Failed to read header from: {}", path.display()))?;
    Ok((AlignmentReader::Bam(reader), header))
}

enum AlignmentWriter {
    Bam(bam::io::Writer<BgzfWriterEnum>),
    Sam(sam::io::Writer<BufWriter<File>>),
}

/// A SAM or BAM output file that kept records are written to.
///
/// [`finish`](Self::finish) must be called to complete the file; a BAM that is dropped
/// without finishing may lack its EOF marker.
pub struct AlignmentSink {
    path: PathBuf,
    header: Header,
    writer: AlignmentWriter,
    records_written: u64,
}

impl AlignmentSink {
    /// Writes one record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written.
    pub fn write(&mut self, record: &RecordBuf) -> io::Result<()> {
        match &mut self.writer {
            AlignmentWriter::Bam(w) => w.write_alignment_record(&self.header, record)?,
            AlignmentWriter::Sam(w) => w.write_alignment_record(&self.header, record)?,
        }
        self.records_written += 1;
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Flushes buffered output and completes the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the final writes fail.
    pub fn finish(self) -> Result<()> {
        let result = match self.writer {
            AlignmentWriter::Bam(w) => w.into_inner().finish(),
            AlignmentWriter::Sam(w) => w.into_inner().flush(),
        };
        result.with_context(|| format!("Failed to finish output: {}", self.path.display()))
    }
}

impl RecordSink<RecordBuf> for AlignmentSink {
    fn write_record(&mut self, record: RecordBuf) -> errors::Result<()> {
        Ok(self.write(&record)?)
    }
}

/// Creates a SAM or BAM file and writes `header` to it.
///
/// # Errors
///
/// Returns an error if the file cannot be created or the header cannot be written.
pub fn create_alignment_writer(
    path: &Path,
    header: &Header,
    threads: usize,
) -> Result<AlignmentSink> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output: {}", path.display()))?;

    let writer = if is_sam_path(path) {
        let mut writer = sam::io::Writer::new(BufWriter::new(file));
        writer
            .write_header(header)
            .with_context(|| format!("Failed to write header to: {}", path.display()))?;
        AlignmentWriter::Sam(writer)
    } else {
        let mut writer = bam::io::Writer::from(BgzfWriterEnum::new(file, threads));
        writer
            .write_header(header)
            .with_context(|| format!("Failed to write header to: {}", path.display()))?;
        AlignmentWriter::Bam(writer)
    };

    Ok(AlignmentSink {
        path: path.to_path_buf(),
        header: header.clone(),
        writer,
        records_written: 0,
    })
}

/// Check if a path refers to stdin.
///
/// ```
/// use samfilter_lib::bam_io::is_stdin_path;
/// use std::path::Path;
///
/// assert!(is_stdin_path(Path::new("-")));
/// assert!(is_stdin_path(Path::new("/dev/stdin")));
/// assert!(!is_stdin_path(Path::new("input.bam")));
/// ```
#[must_use]
pub fn is_stdin_path<P: AsRef<Path>>(path: P) -> bool {
    let path_str = path.as_ref().to_string_lossy();
    path_str == "-" || path_str == "/dev/stdin"
}

/// True if the path has a `.sam` extension, in any case.
#[must_use]
pub fn is_sam_path<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref().extension().is_some_and(|ext| ext.eq_ignore_ascii_case("sam"))
}

/// The `<stem>.reads` file in `dir` that the read names of `path` are written to.
///
/// Standard input uses the stem `stdin`.
///
/// ```
/// use samfilter_lib::bam_io::reads_path_for;
/// use std::path::Path;
///
/// let dir = Path::new("/out");
/// assert_eq!(reads_path_for(Path::new("/in/sample.bam"), dir), Path::new("/out/sample.reads"));
/// assert_eq!(reads_path_for(Path::new("-"), dir), Path::new("/out/stdin.reads"));
/// ```
#[must_use]
pub fn reads_path_for(path: &Path, dir: &Path) -> PathBuf {
    let stem: Cow<'_, str> = if is_stdin_path(path) {
        "stdin".into()
    } else {
        path.file_stem().map_or_else(|| "reads".into(), |s| s.to_string_lossy())
    };
    dir.join(format!("{stem}.reads"))
}

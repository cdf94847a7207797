//! User-supplied keep/drop predicates.
//!
//! [`RecordPredicate`] is the capability the scripted filter delegates to. Library users
//! can pass any closure; the command line uses [`ScriptPredicate`], which streams records
//! as SAM text through an external program.
//!
//! # Script protocol
//!
//! The program is started once. Its standard input first receives the SAM header, one
//! `@` line per header record, followed by one SAM line per record to evaluate. After
//! each record line the program must write exactly one line to standard output:
//!
//! - `true`, `1`, `yes` or `keep` keeps the record
//! - `false`, `0`, `no`, `drop` or an empty line drops it
//!
//! Replies are case-insensitive and surrounding whitespace is ignored. Any other reply,
//! or the program exiting before it replies, aborts the run.

use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use log::debug;
use noodles::sam;
use noodles::sam::Header;
use noodles::sam::alignment::RecordBuf;
use noodles::sam::alignment::io::Write as AlignmentWrite;

use crate::errors::{FilterError, Result};
use crate::filter::record::AlignmentRecord;
use crate::validation::validate_regular_file;

const FILE_TYPE: &str = "predicate script";

/// Decides whether a record is kept.
///
/// An `Err` is a runtime evaluation failure and aborts filtering; it is never treated as
/// a drop.
pub trait RecordPredicate<R> {
    fn evaluate(&mut self, record: &R) -> Result<bool>;
}

impl<R, F> RecordPredicate<R> for F
where
    F: FnMut(&R) -> Result<bool>,
{
    fn evaluate(&mut self, record: &R) -> Result<bool> {
        self(record)
    }
}

/// Coerces one reply line from a predicate program to a decision.
///
/// ```
/// use samfilter_lib::filter::predicate::parse_reply;
///
/// assert_eq!(parse_reply("KEEP\n"), Some(true));
/// assert_eq!(parse_reply(""), Some(false));
/// assert_eq!(parse_reply("maybe"), None);
/// ```
#[must_use]
pub fn parse_reply(reply: &str) -> Option<bool> {
    match reply.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "keep" => Some(true),
        "false" | "0" | "no" | "drop" | "" => Some(false),
        _ => None,
    }
}

/// A predicate backed by an external program speaking the line protocol described in
/// the module documentation.
pub struct ScriptPredicate {
    path: PathBuf,
    header: Header,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
    line: Vec<u8>,
    reply: String,
    evaluated: u64,
}

impl ScriptPredicate {
    /// Validates and starts the predicate program, then sends it the SAM header.
    ///
    /// # Errors
    ///
    /// Returns a load error if the path is not an executable regular file, the program
    /// cannot be started, or it stops accepting input while the header is written.
    pub fn load(path: &Path, header: &Header) -> Result<Self> {
        validate_regular_file(path, FILE_TYPE)?;
        let path = fs::canonicalize(path)
            .map_err(|e| FilterError::load(FILE_TYPE, path.display(), e.to_string()))?;
        check_executable(&path)?;

        let mut child = Command::new(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| FilterError::load(FILE_TYPE, path.display(), e.to_string()))?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(FilterError::load(FILE_TYPE, path.display(), "failed to open pipes"));
        };

        let mut predicate = Self {
            path,
            header: header.clone(),
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
            line: Vec::new(),
            reply: String::new(),
            evaluated: 0,
        };
        predicate.send_header().map_err(|e| {
            FilterError::load(FILE_TYPE, predicate.path.display(), format!("writing header: {e}"))
        })?;
        debug!("Started predicate script {}", predicate.path.display());
        Ok(predicate)
    }

    /// The canonical path of the running program.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records evaluated so far.
    #[must_use]
    pub fn evaluated(&self) -> u64 {
        self.evaluated
    }

    fn send_header(&mut self) -> std::io::Result<()> {
        self.line.clear();
        sam::io::Writer::new(&mut self.line).write_header(&self.header)?;
        let stdin = self.stdin.as_mut().ok_or_else(|| std::io::Error::other("input closed"))?;
        stdin.write_all(&self.line)?;
        stdin.flush()
    }

    fn evaluate_record(&mut self, record: &RecordBuf) -> Result<bool> {
        let fail =
            |reason: String| FilterError::Evaluation { read_name: record.display_name(), reason };

        self.line.clear();
        sam::io::Writer::new(&mut self.line)
            .write_alignment_record(&self.header, record)
            .map_err(|e| fail(format!("could not format record as SAM: {e}")))?;

        let stdin = self.stdin.as_mut().ok_or_else(|| fail("predicate input is closed".into()))?;
        stdin
            .write_all(&self.line)
            .and_then(|()| stdin.flush())
            .map_err(|e| fail(format!("predicate stopped reading input: {e}")))?;

        self.reply.clear();
        let read = self
            .stdout
            .read_line(&mut self.reply)
            .map_err(|e| fail(format!("could not read predicate reply: {e}")))?;
        if read == 0 {
            let status = match self.child.try_wait() {
                Ok(Some(status)) => format!(" ({status})"),
                _ => String::new(),
            };
            return Err(fail(format!("predicate exited without replying{status}")));
        }

        self.evaluated += 1;
        parse_reply(&self.reply)
            .ok_or_else(|| fail(format!("unrecognized reply '{}'", self.reply.trim())))
    }
}

impl RecordPredicate<RecordBuf> for ScriptPredicate {
    fn evaluate(&mut self, record: &RecordBuf) -> Result<bool> {
        self.evaluate_record(record)
    }
}

impl Drop for ScriptPredicate {
    fn drop(&mut self) {
        // Closing stdin lets a well-behaved program see end of input and exit.
        drop(self.stdin.take());
        if matches!(self.child.try_wait(), Ok(None)) {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}

#[cfg(unix)]
fn check_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = fs::metadata(path)
        .map_err(|e| FilterError::load(FILE_TYPE, path.display(), e.to_string()))?;
    let mode = metadata.permissions().mode();
    if mode & 0o111 == 0 {
        return Err(FilterError::load(FILE_TYPE, path.display(), "file is not executable"));
    }
    Ok(())
}

#[cfg(not(unix))]
fn check_executable(_path: &Path) -> Result<()> {
    Ok(())
}

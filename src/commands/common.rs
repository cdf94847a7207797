//! Option groups shared by commands, composed with `#[command(flatten)]`.

use std::path::{Path, PathBuf};

use clap::Args;

use samfilter_lib::bam_io::is_stdin_path;
use samfilter_lib::validation::{validate_file_exists, validate_threads};

/// Input and output alignment files.
#[derive(Debug, Clone, Args)]
pub struct BamIoOptions {
    /// Input SAM or BAM file, or `-` for BAM on standard input
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Output file; SAM if it ends in `.sam`, otherwise BAM
    #[arg(short = 'o', long = "output")]
    pub output: PathBuf,
}

impl BamIoOptions {
    /// Checks that the input exists (skipped for stdin) and that the output's directory
    /// does.
    ///
    /// # Errors
    ///
    /// Returns an error naming the missing path.
    pub fn validate(&self) -> anyhow::Result<()> {
        if !is_stdin_path(&self.input) {
            validate_file_exists(&self.input, "Input SAM/BAM")?;
        }
        let dir = self.output_dir();
        if !dir.as_os_str().is_empty() && !dir.is_dir() {
            anyhow::bail!("Output directory does not exist: {}", dir.display());
        }
        Ok(())
    }

    /// Directory holding the output file; empty for a bare file name.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        self.output.parent().unwrap_or_else(|| Path::new(""))
    }
}

/// BGZF compression threads.
#[derive(Debug, Clone, Default, Args)]
pub struct ThreadingOptions {
    /// Threads for BGZF compression and decompression; filtering itself is always
    /// single-threaded
    #[arg(long = "threads")]
    pub threads: Option<usize>,
}

impl ThreadingOptions {
    #[must_use]
    pub fn new(threads: usize) -> Self {
        Self { threads: Some(threads) }
    }

    /// The validated thread count, 1 when unset.
    ///
    /// # Errors
    ///
    /// Returns an error for `--threads 0`.
    pub fn num_threads(&self) -> anyhow::Result<usize> {
        Ok(validate_threads(self.threads, "--threads")?)
    }
}

//! Helpers for running the `samfilter` binary against generated inputs.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use noodles::sam::Header;
use samfilter_lib::bam_io::create_alignment_reader;
use samfilter_lib::filter::record::AlignmentRecord;
use samfilter_lib::sam::SamBuilder;

/// Shell predicate keeping records whose POS is at least 500.
pub const POSITION_SCRIPT: &str = r#"#!/bin/sh
while IFS= read -r line; do
  case "$line" in
    @*) continue ;;
  esac
  pos=$(printf '%s\n' "$line" | cut -f4)
  if [ "$pos" -ge 500 ]; then echo keep; else echo drop; fi
done
"#;

/// Runs `samfilter filter` with `args`.
pub fn run_filter(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_samfilter"))
        .arg("filter")
        .args(args)
        .output()
        .expect("Failed to run samfilter")
}

/// Asserts success, showing stderr otherwise.
pub fn assert_success(output: &Output) {
    assert!(
        output.status.success(),
        "samfilter failed with {}:\n{}",
        output.status,
        String::from_utf8_lossy(&output.stderr)
    );
}

pub fn path_str(path: &Path) -> &str {
    path.to_str().expect("Temp paths are UTF-8")
}

/// Templates on 151bp reads:
///
/// - `A`: both mates at the start of chr1
/// - `B`: both mates at the start of chr2
/// - `C`: both mates far along chr1
/// - `D`: one mate at the start of chr1 and one far along it
pub fn scenario() -> SamBuilder {
    let mut builder = SamBuilder::with_read_length(151);
    let _ = builder.add_pair().name("A").contig(0).start1(1).start2(151).build();
    let _ = builder.add_pair().name("B").contig(1).start1(1).start2(151).build();
    let _ = builder.add_pair().name("C").contig(0).start1(1_000).start2(1_000).build();
    let _ = builder.add_pair().name("D").contig(0).start1(1).start2(1_000).build();
    builder
}

/// Writes the [`scenario`] to `input.bam` in `dir`.
pub fn write_scenario_bam(dir: &Path) -> PathBuf {
    let path = dir.join("input.bam");
    scenario().write_bam(&path).expect("Failed to write input BAM");
    path
}

pub fn write_text(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).expect("Failed to write text file");
    path
}

/// Writes an executable script.
#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;
    let path = write_text(dir, name, body);
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
        .expect("Failed to make script executable");
    path
}

/// Reads a SAM or BAM file, returning its header and each record's name.
pub fn read_names(path: &Path) -> (Header, Vec<String>) {
    let (mut reader, header) = create_alignment_reader(path, 1).expect("Failed to open output");
    let names = reader
        .record_bufs(&header)
        .map(|r| r.expect("Failed to read record").display_name())
        .collect();
    (header, names)
}

/// The record names of a file concatenated, e.g. `"AADD"`.
pub fn joined_names(path: &Path) -> String {
    read_names(path).1.concat()
}

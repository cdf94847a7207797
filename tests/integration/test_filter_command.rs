//! End-to-end tests for `samfilter filter`.

use std::fs;
use std::io::Write;
use std::process::{Command, Stdio};

use noodles::sam::header::record::value::map::program::tag::PREVIOUS_PROGRAM_ID;
use rstest::rstest;
use samfilter_lib::metrics::FilterMetrics;
use samfilter_lib::sam::SamBuilder;
use tempfile::TempDir;

use crate::helpers::{
    assert_success, joined_names, path_str, read_names, run_filter, write_scenario_bam,
    write_text,
};

#[rstest]
#[case("include-read-list", "AACCDD")]
#[case("exclude-read-list", "BB")]
#[case("includeReadList", "AACCDD")]
#[case("excludeReadList", "BB")]
fn test_read_list(#[case] filter: &str, #[case] expected: &str) {
    let dir = TempDir::new().unwrap();
    let input = write_scenario_bam(dir.path());
    let names = write_text(dir.path(), "names.txt", "A\n\n  C  \n@D 1:N:0\n");
    let output = dir.path().join("output.bam");

    let result = run_filter(&[
        "-i",
        path_str(&input),
        "-o",
        path_str(&output),
        "-f",
        filter,
        "-l",
        path_str(&names),
    ]);

    assert_success(&result);
    assert_eq!(joined_names(&output), expected);
}

#[rstest]
#[case::interval_list("targets.interval_list", "@HD\tVN:1.6\nchr1\t1\t200\t+\tX\n", "AADD")]
#[case::bed_two_targets("targets.bed", "chr1\t0\t200\tX\nchr2\t0\t200\tY\n", "AABBDD")]
#[case::no_match("targets.bed", "chr5\t0\t1000\n", "")]
fn test_paired_intervals(#[case] file: &str, #[case] contents: &str, #[case] expected: &str) {
    let dir = TempDir::new().unwrap();
    let input = write_scenario_bam(dir.path());
    let intervals = write_text(dir.path(), file, contents);
    let output = dir.path().join("output.bam");

    let result = run_filter(&[
        "-i",
        path_str(&input),
        "-o",
        path_str(&output),
        "-f",
        "include-paired-intervals",
        "-L",
        path_str(&intervals),
    ]);

    assert_success(&result);
    assert_eq!(joined_names(&output), expected);
}

#[rstest]
#[case("include-aligned", "mmh")]
#[case("exclude-aligned", "hu")]
fn test_aligned(#[case] filter: &str, #[case] expected: &str) {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.bam");
    let mut builder = SamBuilder::new();
    let _ = builder.add_pair().name("m").start1(10).start2(200).build();
    let _ = builder.add_pair().name("h").start1(10).build();
    let _ = builder.add_frag().name("u").build();
    builder.write_bam(&input).unwrap();
    let output = dir.path().join("output.bam");

    let result = run_filter(&["-i", path_str(&input), "-o", path_str(&output), "-f", filter]);

    assert_success(&result);
    assert_eq!(joined_names(&output), expected);
}

#[rstest]
#[case("include-tag-values", "ac")]
#[case("exclude-tag-values", "bd")]
fn test_tag_values(#[case] filter: &str, #[case] expected: &str) {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("input.bam");
    let mut builder = SamBuilder::new();
    let _ = builder.add_frag().name("a").start(10).attr("XT", "alpha").build();
    let _ = builder.add_frag().name("b").start(20).attr("XT", "beta").build();
    let _ = builder.add_frag().name("c").start(30).attr("XT", "gamma").build();
    let _ = builder.add_frag().name("d").start(40).build();
    builder.write_bam(&input).unwrap();
    let output = dir.path().join("output.bam");

    let result = run_filter(&[
        "-i",
        path_str(&input),
        "-o",
        path_str(&output),
        "-f",
        filter,
        "-t",
        "XT",
        "-T",
        "alpha",
        "--tag-value",
        "gamma",
    ]);

    assert_success(&result);
    assert_eq!(joined_names(&output), expected);
}

#[cfg(unix)]
#[test]
fn test_include_script() {
    use crate::helpers::{POSITION_SCRIPT, write_script};

    let dir = TempDir::new().unwrap();
    let input = write_scenario_bam(dir.path());
    let script = write_script(dir.path(), "keep_far.sh", POSITION_SCRIPT);
    let output = dir.path().join("output.bam");

    let result = run_filter(&[
        "-i",
        path_str(&input),
        "-o",
        path_str(&output),
        "-f",
        "includeJavascript",
        "-s",
        path_str(&script),
    ]);

    assert_success(&result);
    // Only records starting at 1,000 pass: both mates of C and the second mate of D.
    assert_eq!(joined_names(&output), "CCD");
}

#[test]
fn test_metrics_read_names_and_sam_output() {
    let dir = TempDir::new().unwrap();
    let input = write_scenario_bam(dir.path());
    let names = write_text(dir.path(), "names.txt", "B\nD\n");
    let output = dir.path().join("kept.sam");
    let metrics = dir.path().join("filter_metrics.txt");

    let result = run_filter(&[
        "-i",
        path_str(&input),
        "-o",
        path_str(&output),
        "-f",
        "exclude-read-list",
        "-l",
        path_str(&names),
        "-m",
        path_str(&metrics),
        "--write-read-names",
    ]);
    assert_success(&result);

    let text = fs::read_to_string(&output).unwrap();
    assert!(text.starts_with('@'));
    assert_eq!(text.lines().filter(|l| !l.starts_with('@')).count(), 4);
    assert_eq!(joined_names(&output), "AACC");

    let rows: Vec<FilterMetrics> = fgoxide::io::DelimFile::default().read_tsv(&metrics).unwrap();
    let expected =
        FilterMetrics { total_records: 8, kept_records: 4, filtered_records: 4, orphaned_mates: 0 };
    assert_eq!(rows, vec![expected]);

    let input_names = fs::read_to_string(dir.path().join("input.reads")).unwrap();
    let output_names = fs::read_to_string(dir.path().join("kept.reads")).unwrap();
    assert_eq!(input_names, "A\nB\nC\nD\n");
    assert_eq!(output_names, "A\nC\n");
}

#[test]
fn test_output_header_gets_chained_program_record() {
    let dir = TempDir::new().unwrap();
    let input = write_scenario_bam(dir.path());
    let first = dir.path().join("first.bam");
    let second = dir.path().join("second.bam");

    for (from, to) in [(&input, &first), (&first, &second)] {
        let result =
            run_filter(&["-i", path_str(from), "-o", path_str(to), "-f", "include-aligned"]);
        assert_success(&result);
    }

    let (header, names) = read_names(&second);
    assert_eq!(names.len(), 8);
    let programs = header.programs();
    let programs = programs.as_ref();
    assert!(programs.contains_key(&b"SamBuilder"[..]));
    assert!(programs.contains_key(&b"samfilter"[..]));
    let chained = programs.get(&b"samfilter.1"[..]).expect("second @PG record");
    let pp = chained.other_fields().get(&PREVIOUS_PROGRAM_ID).map(ToString::to_string);
    assert_eq!(pp.as_deref(), Some("samfilter"));
}

#[test]
fn test_bam_from_stdin_with_threads() {
    let dir = TempDir::new().unwrap();
    let input = write_scenario_bam(dir.path());
    let output = dir.path().join("output.bam");

    let mut child = Command::new(env!("CARGO_BIN_EXE_samfilter"))
        .args(["filter", "-i", "-", "-o", path_str(&output), "-f", "include-aligned"])
        .args(["--threads", "2", "--write-read-names"])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    let bytes = fs::read(&input).unwrap();
    child.stdin.take().unwrap().write_all(&bytes).unwrap();
    let result = child.wait_with_output().unwrap();

    assert_success(&result);
    assert_eq!(joined_names(&output), "AABBCCDD");
    let input_names = fs::read_to_string(dir.path().join("stdin.reads")).unwrap();
    assert_eq!(input_names.lines().count(), 4);
}

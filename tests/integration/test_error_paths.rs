//! Failure paths of `samfilter filter`: every case exits non-zero with a message.

use rstest::rstest;
use tempfile::TempDir;

use crate::helpers::{path_str, run_filter, write_scenario_bam, write_text};

/// Runs the filter on the scenario input after writing `files` to a temp directory.
///
/// `{dir}` in `extra` is replaced by that directory. Returns whether the run succeeded,
/// its stderr, and whether the output file was created.
fn run_in_temp_dir(extra: &[&str], files: &[(&str, &str)]) -> (bool, String, bool) {
    let dir = TempDir::new().unwrap();
    let input = write_scenario_bam(dir.path());
    for (name, contents) in files {
        write_text(dir.path(), name, contents);
    }
    let output = dir.path().join("output.bam");
    let dir_str = path_str(dir.path()).to_string();
    let extra: Vec<String> = extra.iter().map(|a| a.replace("{dir}", &dir_str)).collect();

    let mut args = vec!["-i", path_str(&input), "-o", path_str(&output)];
    args.extend(extra.iter().map(String::as_str));
    let result = run_filter(&args);

    let stderr = String::from_utf8_lossy(&result.stderr).into_owned();
    (result.status.success(), stderr, output.exists())
}

/// Parameter combinations rejected before the input is read; no output is written.
#[rstest]
#[case::read_list_without_list(&["-f", "include-read-list", "-L", "{dir}/x.bed"], "--read-list")]
#[case::read_list_with_script(
    &["-f", "exclude-read-list", "-l", "{dir}/n.txt", "-s", "{dir}/p.sh"],
    "--script"
)]
#[case::script_with_read_list(
    &["-f", "include-script", "-s", "{dir}/p.sh", "-l", "{dir}/n.txt"],
    "--read-list"
)]
#[case::script_with_intervals(
    &["-f", "includeJavascript", "-s", "{dir}/p.sh", "-L", "{dir}/x.bed"],
    "--intervals"
)]
#[case::intervals_without_list(&["-f", "include-paired-intervals"], "--intervals")]
#[case::aligned_with_tag(&["-f", "include-aligned", "-t", "RG"], "--tag")]
#[case::tag_without_values(&["-f", "include-tag-values", "-t", "RG"], "--tag-value")]
#[case::values_without_tag(&["-f", "exclude-tag-values", "-T", "A"], "--tag")]
#[case::malformed_tag(&["-f", "include-tag-values", "-t", "RGX", "-T", "A"], "--tag")]
#[case::zero_threads(&["-f", "include-aligned", "--threads", "0"], "--threads")]
fn test_illegal_parameters(#[case] args: &[&str], #[case] message: &str) {
    let (success, stderr, output_exists) = run_in_temp_dir(args, &[]);
    assert!(!success);
    assert!(stderr.contains(message), "expected '{message}' in:\n{stderr}");
    assert!(!output_exists);
}

#[test]
fn test_unknown_filter_is_a_usage_error() {
    let (success, stderr, output_exists) = run_in_temp_dir(&["-f", "include-everything"], &[]);
    assert!(!success);
    assert!(stderr.contains("include-everything"));
    assert!(!output_exists);
}

/// Auxiliary inputs that cannot be loaded fail before any output is written.
#[rstest]
#[case::missing_read_list(&["-f", "include-read-list", "-l", "{dir}/none.txt"], &[], "none.txt")]
#[case::empty_read_list(
    &["-f", "include-read-list", "-l", "{dir}/n.txt"],
    &[("n.txt", "\n  \n")],
    "n.txt"
)]
#[case::unknown_contig(
    &["-f", "include-paired-intervals", "-L", "{dir}/x.bed"],
    &[("x.bed", "chrUn\t0\t100\n")],
    "chrUn"
)]
#[case::malformed_interval(
    &["-f", "include-paired-intervals", "-L", "{dir}/x.bed"],
    &[("x.bed", "chr1\t0\n")],
    "x.bed"
)]
#[case::script_not_executable(
    &["-f", "include-script", "-s", "{dir}/p.sh"],
    &[("p.sh", "#!/bin/sh\necho true\n")],
    "p.sh"
)]
fn test_load_failures(
    #[case] args: &[&str],
    #[case] files: &[(&str, &str)],
    #[case] message: &str,
) {
    let (success, stderr, output_exists) = run_in_temp_dir(args, files);
    assert!(!success);
    assert!(stderr.contains(message), "expected '{message}' in:\n{stderr}");
    assert!(!output_exists);
}

#[test]
fn test_missing_input() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("absent.bam");
    let output = dir.path().join("output.bam");

    let result =
        run_filter(&["-i", path_str(&input), "-o", path_str(&output), "-f", "include-aligned"]);

    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("absent.bam"));
}

#[cfg(unix)]
#[test]
fn test_script_failure_aborts_run() {
    use crate::helpers::write_script;

    let dir = TempDir::new().unwrap();
    let input = write_scenario_bam(dir.path());
    let script = write_script(
        dir.path(),
        "confused.sh",
        "#!/bin/sh\nwhile IFS= read -r line; do\n  case \"$line\" in @*) continue ;; esac\n  \
         echo perhaps\ndone\n",
    );
    let output = dir.path().join("output.bam");

    let result = run_filter(&[
        "-i",
        path_str(&input),
        "-o",
        path_str(&output),
        "-f",
        "include-script",
        "-s",
        path_str(&script),
    ]);

    assert!(!result.status.success());
    assert!(String::from_utf8_lossy(&result.stderr).contains("perhaps"));
}

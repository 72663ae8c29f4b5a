#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

fn kmerbatch_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_kmerbatch"))
}

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn cli_help_lists_subcommands() {
    let output = kmerbatch_cmd()
        .arg("--help")
        .output()
        .expect("Failed to execute");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("kmers"));
    assert!(stdout.contains("search"));
}

#[test]
fn cli_version_flag() {
    let output = kmerbatch_cmd()
        .arg("--version")
        .output()
        .expect("Failed to execute");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn kmers_count_prints_to_stdout() {
    let output = kmerbatch_cmd()
        .args(["kmers", "-t", "count", "-k", "4", "-i"])
        .arg(fixture_path("simple.fa"))
        .output()
        .expect("Failed to execute");
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "4\n");
}

#[test]
fn kmers_table_written_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("table.tsv");
    let output = kmerbatch_cmd()
        .args(["kmers", "--output_type", "table", "--kmer_size", "4"])
        .arg("--input_fasta")
        .arg(fixture_path("simple.fa"))
        .arg("--output_file")
        .arg(&out)
        .output()
        .expect("Failed to execute");
    assert!(output.status.success());
    assert_eq!(
        fs::read_to_string(&out).unwrap(),
        "ACGT\t3\nCGTA\t1\nGTAC\t1\nTACG\t1\n"
    );
}

#[test]
fn kmers_reads_stdin_with_dash() {
    let mut child = kmerbatch_cmd()
        .args(["kmers", "-i", "-", "-k", "3", "-t", "count"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn");
    child
        .stdin
        .as_mut()
        .unwrap()
        .write_all(b">x\nAAAA\n>y\nAAAT\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());
    // AAA, AAT
    assert_eq!(String::from_utf8_lossy(&output.stdout), "2\n");
}

#[test]
fn kmers_missing_parameters_are_listed_together() {
    let output = kmerbatch_cmd()
        .args(["kmers", "-t", "text"])
        .output()
        .expect("Failed to execute");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("input_fasta, kmer_size, output_file"));
    assert!(stderr.contains("--help"));
}

#[test]
fn kmers_rejects_zero_k() {
    let output = kmerbatch_cmd()
        .args(["kmers", "-t", "count", "-k", "0", "-i"])
        .arg(fixture_path("simple.fa"))
        .output()
        .expect("Failed to execute");
    assert!(!output.status.success());
}

#[test]
fn kmers_unreadable_input_is_an_error() {
    let output = kmerbatch_cmd()
        .args(["kmers", "-t", "count", "-k", "4", "-i", "/nonexistent/reads.fa"])
        .output()
        .expect("Failed to execute");
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("/nonexistent/reads.fa"));
}

#[test]
fn search_requires_query_and_ref() {
    let output = kmerbatch_cmd()
        .arg("search")
        .output()
        .expect("Failed to execute");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("query, ref"));
}

#[test]
fn search_with_missing_aligner_leaves_no_output() {
    let dir = tempfile::tempdir().unwrap();
    let query = dir.path().join("reads.fa");
    fs::copy(fixture_path("query.fa"), &query).unwrap();

    let output = kmerbatch_cmd()
        .arg("search")
        .arg("-q")
        .arg(&query)
        .args(["-r", "a.udb", "-u", "/nonexistent/usearch"])
        .output()
        .expect("Failed to execute");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("/nonexistent/usearch"));
    assert!(!dir.path().join("reads_hits.b6").exists());
}

#[cfg(unix)]
#[test]
fn search_json_summary() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().unwrap();
    let query = dir.path().join("reads.fa");
    fs::copy(fixture_path("query.fa"), &query).unwrap();

    let aligner = dir.path().join("aligner.sh");
    fs::write(
        &aligner,
        "#!/bin/sh\n\
         while [ $# -gt 0 ]; do\n\
           if [ \"$1\" = -blast6out ]; then out=\"$2\"; fi\n\
           shift\n\
         done\n\
         printf 'q\\tr\\n' > \"$out\"\n",
    )
    .unwrap();
    fs::set_permissions(&aligner, fs::Permissions::from_mode(0o755)).unwrap();

    let output = kmerbatch_cmd()
        .arg("search")
        .arg("-q")
        .arg(&query)
        .arg("-u")
        .arg(&aligner)
        .args(["-r", "a.udb,b.udb", "--chunk-size", "2", "--json"])
        .output()
        .expect("Failed to execute");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["sequences"], 5);
    assert_eq!(summary["chunks"], 3);
    assert_eq!(summary["searches"], 6);
    assert_eq!(summary["hits"], 6);
    assert_eq!(
        fs::read_to_string(dir.path().join("reads_hits.b6"))
            .unwrap()
            .lines()
            .count(),
        6
    );
}

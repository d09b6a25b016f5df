//! Tests for the `echr-extractor` binary.

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn cli() -> Command {
    Command::cargo_bin("echr-extractor").unwrap()
}

#[test]
fn test_help_lists_subcommands() {
    cli()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("extract"))
        .stdout(predicate::str::contains("extract-full"))
        .stdout(predicate::str::contains("network"));
}

#[test]
fn test_extract_rejects_bad_date() {
    cli()
        .args(["extract", "--start-date", "2020/01/01", "--no-save"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid date"));
}

#[test]
fn test_extract_rejects_bad_language() {
    cli()
        .args(["extract", "--language", "english", "--no-save"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid language code"));
}

#[test]
fn test_network_missing_metadata_file() {
    let dir = tempdir().unwrap();
    cli()
        .args(["network", "--metadata-path"])
        .arg(dir.path().join("missing.csv"))
        .arg("--no-save")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Metadata file not found"));
}

#[test]
fn test_network_from_fixture_writes_files() {
    let dir = tempdir().unwrap();
    cli()
        .args(["network", "--metadata-path"])
        .arg(fixture("metadata.csv"))
        .arg("--output")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Generated 3 nodes and 2 edges"));

    let edges = fs::read_to_string(dir.path().join("ECHR_edges.csv")).unwrap();
    assert_eq!(
        edges,
        "source_id,target_id,relation_type,weight\n\
         001-57619,001-57496,references,1.0\n\
         001-57534,001-57619,references,1.0\n"
    );
    assert!(dir.path().join("ECHR_nodes.json").exists());
}

#[test]
fn test_network_no_save_writes_nothing() {
    let dir = tempdir().unwrap();
    cli()
        .args(["network", "--no-save", "--metadata-path"])
        .arg(fixture("metadata.csv"))
        .arg("--output")
        .arg(dir.path())
        .assert()
        .success();

    assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
}

#[test]
fn test_network_output_defaults_to_env_dir() {
    let dir = tempdir().unwrap();
    let output_dir = dir.path().join("from-env");
    cli()
        .env("ECHR_OUTPUT_DIR", &output_dir)
        .args(["network", "--metadata-path"])
        .arg(fixture("metadata.csv"))
        .assert()
        .success();

    assert!(output_dir.join("ECHR_edges.csv").exists());
    assert!(output_dir.join("ECHR_nodes.csv").exists());
}

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn slft(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("slft").unwrap();
    cmd.current_dir(dir);
    cmd.env("NO_COLOR", "1");
    cmd
}

// --- Binary startup ---

#[test]
fn binary_runs() {
    let mut cmd = Command::cargo_bin("slft").unwrap();
    cmd.arg("--version");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("slft"));
}

#[test]
fn analyze_requires_urls() {
    let tmp = TempDir::new().unwrap();
    slft(tmp.path())
        .arg("analyze")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no URLs provided"));
}

#[test]
fn analyze_rejects_missing_urls_file() {
    let tmp = TempDir::new().unwrap();
    slft(tmp.path())
        .args(["analyze", "--urls-file", "does-not-exist.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("urls file not found"));
}

// --- Local ingestion end to end ---

#[test]
fn analyze_local_markdown_produces_artifacts() {
    let tmp = TempDir::new().unwrap();
    let doc = tmp.path().join("design.md");
    fs::write(
        &doc,
        "# Design\n\n```solidity\npragma solidity ^0.8.0;\ncontract Vault {}\n```\n",
    )
    .unwrap();

    slft(tmp.path())
        .args([
            "analyze",
            "--urls",
            doc.to_str().unwrap(),
            "--run-id",
            "testrun",
            "--artifacts-dir",
            "out",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ingested artifacts: 1"));

    let base = tmp.path().join("out");
    assert!(base.join("run_manifest.json").exists());
    assert!(base.join("analysis/analysis_summary.json").exists());

    let ingested: Vec<_> = fs::read_dir(base.join("ingest"))
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(ingested.iter().any(|name| name.ends_with(".json")));
    assert!(ingested.iter().any(|name| name.ends_with(".txt")));

    let manifest: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(base.join("run_manifest.json")).unwrap())
            .unwrap();
    assert_eq!(manifest["run_id"], "testrun");
    assert_eq!(manifest["ingestion"]["count"], 1);
}

#[test]
fn analyze_reads_urls_file() {
    let tmp = TempDir::new().unwrap();
    let doc = tmp.path().join("notes.md");
    fs::write(&doc, "plain notes\n").unwrap();

    let urls_file = tmp.path().join("urls.txt");
    fs::write(
        &urls_file,
        format!("# reconnaissance seeds\n\n{}\n", doc.display()),
    )
    .unwrap();

    slft(tmp.path())
        .args([
            "analyze",
            "--urls-file",
            urls_file.to_str().unwrap(),
            "--artifacts-dir",
            "out",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Ingested artifacts: 1"));
}

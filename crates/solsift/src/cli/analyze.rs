use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use chrono::Utc;
use solsift_core::{run_scan, Ingestor};

/// Staging root for downloaded Solidity sources, shared across runs so a
/// repeated ingest overwrites instead of duplicating.
const SOL_STAGING: &str = ".workspace_cache/solidity";

pub async fn run(
    urls: &[String],
    urls_file: Option<&Path>,
    run_id: Option<String>,
    artifacts_dir: Option<PathBuf>,
) -> Result<()> {
    let mut all_urls = split_urls_arg(urls);
    if let Some(file) = urls_file {
        if !file.exists() {
            bail!("urls file not found: {}", file.display());
        }
        all_urls.extend(load_urls_file(file)?);
    }
    if all_urls.is_empty() {
        bail!("no URLs provided; use --urls or --urls-file");
    }

    let rid = run_id.unwrap_or_else(make_run_id);
    let base = artifacts_dir.unwrap_or_else(|| PathBuf::from("artifacts").join(&rid));
    let ingest_dir = base.join("ingest");
    let analysis_dir = base.join("analysis");

    println!("Run ID: {rid}");
    println!("Artifacts directory: {}", base.display());

    let started_at = Utc::now().to_rfc3339();

    println!("Ingesting URLs...");
    let ingestor = Ingestor::new(&ingest_dir, SOL_STAGING)?;
    let artifacts = ingestor.ingest_urls(&all_urls).await;

    println!("Running static analysis...");
    let report = run_scan(&analysis_dir, ingestor.staging_dir())?;

    let manifest = serde_json::json!({
        "run_id": rid,
        "started_at": started_at,
        "urls": all_urls,
        "ingestion": {
            "count": artifacts.len(),
            "artifacts_dir": ingest_dir.display().to_string(),
        },
        "analysis": {
            "summary": analysis_dir.join("analysis_summary.json").display().to_string(),
            "solidity_sources_count": report.solidity_sources.len(),
        },
        "finished_at": Utc::now().to_rfc3339(),
    });
    let manifest_path = base.join("run_manifest.json");
    std::fs::write(&manifest_path, serde_json::to_string_pretty(&manifest)?)?;

    println!();
    println!("Run summary");
    println!("  Run ID:             {rid}");
    println!("  URLs:               {}", all_urls.len());
    println!("  Ingested artifacts: {}", artifacts.len());
    println!("  Solidity sources:   {}", report.solidity_sources.len());
    println!("  Manifest:           {}", manifest_path.display());

    Ok(())
}

fn make_run_id() -> String {
    Utc::now().format("%Y%m%dT%H%M%SZ").to_string()
}

/// Split repeated `--urls` values on commas and whitespace.
fn split_urls_arg(values: &[String]) -> Vec<String> {
    values
        .iter()
        .flat_map(|v| v.split(','))
        .flat_map(str::split_whitespace)
        .map(String::from)
        .collect()
}

/// One URL per line; blank lines and `#` comments are skipped.
fn load_urls_file(path: &Path) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path)?;
    Ok(contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect())
}

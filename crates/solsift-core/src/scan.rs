//! Lightweight pattern scan over staged Solidity sources.
//!
//! Downstream consumer of the ingestion pipeline: it reads the `.sol`
//! files the GitHub strategy staged on disk, runs regex heuristics, and
//! opportunistically shells out to `solc`/`slither` when they are on the
//! PATH. Everything here is best-effort reconnaissance, not verification.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::Result;

static EXTERNAL_CALL_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\.call\s*\(",
        r"\.call\s*\{",
        r"\.delegatecall\s*\(",
        r"\.transfer\s*\(",
        r"\.send\s*\(",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("external call pattern"))
    .collect()
});

static MODIFIER_DECL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"modifier\s+([A-Za-z0-9_]+)").expect("modifier pattern"));

static ERC_PATTERNS: Lazy<Vec<(&'static str, Vec<Regex>)>> = Lazy::new(|| {
    [
        ("ERC20", [r"\bIERC20\b", r"\bERC20\b"]),
        ("ERC721", [r"\bIERC721\b", r"\bERC721\b"]),
        ("ERC1155", [r"\bIERC1155\b", r"\bERC1155\b"]),
    ]
    .into_iter()
    .map(|(name, pats)| {
        let compiled = pats
            .iter()
            .map(|p| Regex::new(p).expect("erc pattern"))
            .collect();
        (name, compiled)
    })
    .collect()
});

const REENTRANCY_MARKERS: &[&str] = &[".call{", ".send(", ".transfer("];

/// Context characters kept around each external-call match.
const SNIPPET_CONTEXT: usize = 40;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceFindings {
    pub external_calls: Vec<String>,
    pub modifier_usage: Vec<String>,
    pub erc_standards: Vec<String>,
    pub reentrancy_candidates: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ScanReport {
    pub solidity_sources: Vec<String>,
    pub findings: BTreeMap<String, SourceFindings>,
    pub asts: BTreeMap<String, Value>,
    pub slither: Option<Value>,
}

/// Recursively gather `.sol` files under the staging root, sorted for
/// stable report ordering.
#[must_use]
pub fn gather_sources(root: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    collect_sol(root, &mut files);
    files.sort();
    files
}

fn collect_sol(dir: &Path, out: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_sol(&path, out);
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e == "sol")
        {
            out.push(path);
        }
    }
}

/// Regex heuristics over one source body.
#[must_use]
pub fn scan_source(text: &str) -> SourceFindings {
    let mut findings = SourceFindings::default();

    for pattern in EXTERNAL_CALL_PATTERNS.iter() {
        for m in pattern.find_iter(text) {
            findings
                .external_calls
                .push(snippet(text, m.start(), m.end()));
        }
    }

    for caps in MODIFIER_DECL.captures_iter(text) {
        findings.modifier_usage.push(caps[1].to_string());
    }

    for (name, patterns) in ERC_PATTERNS.iter() {
        if patterns.iter().any(|p| p.is_match(text)) {
            findings.erc_standards.push((*name).to_string());
        }
    }

    if REENTRANCY_MARKERS.iter().any(|m| text.contains(m)) {
        findings
            .reentrancy_candidates
            .push("external_call_present".to_string());
    }

    findings
}

fn snippet(text: &str, start: usize, end: usize) -> String {
    let mut from = start.saturating_sub(SNIPPET_CONTEXT);
    while !text.is_char_boundary(from) {
        from -= 1;
    }
    let mut to = (end + SNIPPET_CONTEXT).min(text.len());
    while !text.is_char_boundary(to) {
        to -= 1;
    }
    text[from..to].to_string()
}

/// Scan every staged source and write `analysis_summary.json` into the
/// run's analysis directory.
pub fn run_scan(out_dir: &Path, sources_root: &Path) -> Result<ScanReport> {
    std::fs::create_dir_all(out_dir)?;
    let files = gather_sources(sources_root);

    let mut findings = BTreeMap::new();
    for file in &files {
        let Ok(bytes) = std::fs::read(file) else {
            continue;
        };
        let text = String::from_utf8_lossy(&bytes);
        findings.insert(file.to_string_lossy().into_owned(), scan_source(&text));
    }

    let report = ScanReport {
        solidity_sources: files
            .iter()
            .map(|f| f.to_string_lossy().into_owned())
            .collect(),
        findings,
        asts: try_solc_asts(&files),
        slither: try_slither(sources_root, &out_dir.join("slither.json")),
    };

    std::fs::write(
        out_dir.join("analysis_summary.json"),
        serde_json::to_string_pretty(&report)?,
    )?;
    Ok(report)
}

/// Per-file compact AST via `solc`, skipped when the compiler is absent.
fn try_solc_asts(files: &[PathBuf]) -> BTreeMap<String, Value> {
    let mut asts = BTreeMap::new();
    if files.is_empty() {
        return asts;
    }
    if which::which("solc").is_err() {
        info!("solc not found in PATH; skipping AST generation");
        return asts;
    }

    for file in files {
        let output = Command::new("solc")
            .arg("--ast-compact-json")
            .arg(file)
            .output();
        let output = match output {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                debug!(
                    "solc failed for {}: {}",
                    file.display(),
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                continue;
            }
            Err(e) => {
                debug!("solc exception for {}: {e}", file.display());
                continue;
            }
        };

        // solc prints the file name before the JSON body; slice out the
        // outermost object.
        let stdout = String::from_utf8_lossy(&output.stdout);
        if let Some(ast) = extract_json_object(&stdout) {
            asts.insert(file.to_string_lossy().into_owned(), ast);
        }
    }
    asts
}

fn extract_json_object(output: &str) -> Option<Value> {
    let start = output.find('{')?;
    let end = output.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&output[start..=end]).ok()
}

/// Whole-tree `slither --json` report, skipped when slither is absent.
fn try_slither(target_dir: &Path, out_json: &Path) -> Option<Value> {
    if which::which("slither").is_err() {
        info!("slither not found in PATH; skipping slither analysis");
        return None;
    }

    let output = Command::new("slither")
        .arg(target_dir)
        .arg("--json")
        .arg(out_json)
        .output();
    match output {
        Ok(output) if output.status.success() => {}
        Ok(output) => {
            warn!(
                "slither failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
            return None;
        }
        Err(e) => {
            warn!("slither failed to start: {e}");
            return None;
        }
    }

    let data = std::fs::read_to_string(out_json).ok()?;
    serde_json::from_str(&data).ok()
}

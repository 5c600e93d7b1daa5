use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::strategy::{IngestContext, RetrievalStrategy};
use crate::artifact::{Artifact, ContentKind};
use crate::classify::{classify, Classification, GitHubLocator};
use crate::error::{Error, Result};

const TREE_TIMEOUT: Duration = Duration::from_secs(30);
const RAW_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct RepoInfo {
    default_branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TreeResponse {
    #[serde(default)]
    tree: Vec<TreeEntry>,
}

#[derive(Debug, Deserialize)]
struct TreeEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Stages a repository's `.sol` blobs under the local staging root so the
/// downstream scanner can read them off disk.
///
/// Staging paths are derived from `owner/repo/branch/<blob dir>`, so a
/// repeated run overwrites rather than duplicates.
pub struct GitHubStrategy;

#[async_trait]
impl RetrievalStrategy for GitHubStrategy {
    fn name(&self) -> &'static str {
        "github"
    }

    fn matches(&self, input: &str) -> bool {
        matches!(classify(input), Classification::GitHub(_))
    }

    async fn retrieve(&self, input: &str, ctx: &IngestContext) -> Artifact {
        let Classification::GitHub(locator) = classify(input) else {
            return Artifact::failure(input, "Unrecognized GitHub URL");
        };

        let repo_api = format!(
            "https://api.github.com/repos/{}/{}",
            locator.owner, locator.repo
        );
        let branch = match locator.branch.clone() {
            Some(branch) => branch,
            None => default_branch(&repo_api, ctx)
                .await
                .unwrap_or_else(|| "main".to_string()),
        };

        let blob_paths = match sol_blob_paths(&repo_api, &branch, locator.subpath.as_deref(), ctx)
            .await
        {
            Ok(paths) => paths,
            Err(e) => {
                return Artifact::new(input, ContentKind::Github)
                    .with_title(format!("{}/{}", locator.owner, locator.repo))
                    .with_error(e.to_string());
            }
        };

        let mut downloaded = Vec::new();
        for blob_path in &blob_paths {
            match stage_blob(&locator, &branch, blob_path, ctx).await {
                Ok(local_path) => downloaded.push(local_path),
                Err(e) => warn!("download failed for {blob_path}: {e}"),
            }
        }

        let mut metadata = Map::new();
        metadata.insert("owner".into(), Value::from(locator.owner.clone()));
        metadata.insert("repo".into(), Value::from(locator.repo.clone()));
        metadata.insert("branch".into(), Value::from(branch.clone()));
        metadata.insert("downloaded_count".into(), Value::from(downloaded.len()));

        Artifact::new(input, ContentKind::Github)
            .with_title(format!("{}/{}@{}", locator.owner, locator.repo, branch))
            .with_metadata(metadata)
            .with_raw_text(format!("Downloaded {} Solidity files.", downloaded.len()))
            .with_downloads(downloaded)
    }
}

/// Ask the repository metadata endpoint for the default branch. Any
/// failure falls back to the caller's `"main"` default.
async fn default_branch(repo_api: &str, ctx: &IngestContext) -> Option<String> {
    let response = ctx.client.get(repo_api).await.ok()?;
    if response.status().as_u16() != 200 {
        return None;
    }
    let info: RepoInfo = response.json().await.ok()?;
    info.default_branch
}

async fn sol_blob_paths(
    repo_api: &str,
    branch: &str,
    subpath: Option<&str>,
    ctx: &IngestContext,
) -> Result<Vec<String>> {
    let tree_url = format!("{repo_api}/git/trees/{branch}?recursive=1");
    let response = ctx.client.get_with_timeout(&tree_url, TREE_TIMEOUT).await?;
    let status = response.status().as_u16();
    if status != 200 {
        return Err(Error::HttpStatus(status));
    }
    let tree: TreeResponse = response
        .json()
        .await
        .map_err(|e| Error::Parse(e.to_string()))?;

    Ok(tree
        .tree
        .into_iter()
        .filter(|entry| entry.kind == "blob" && entry.path.ends_with(".sol"))
        .map(|entry| entry.path)
        .filter(|path| subpath.is_none_or(|prefix| path.starts_with(prefix)))
        .collect())
}

async fn stage_blob(
    locator: &GitHubLocator,
    branch: &str,
    blob_path: &str,
    ctx: &IngestContext,
) -> Result<String> {
    let raw_url = format!(
        "https://raw.githubusercontent.com/{}/{}/{}/{}",
        locator.owner, locator.repo, branch, blob_path
    );
    let response = ctx.client.get_with_timeout(&raw_url, RAW_TIMEOUT).await?;
    let status = response.status().as_u16();
    if status != 200 {
        return Err(Error::HttpStatus(status));
    }
    let bytes = response.bytes().await?;

    let out_path = staging_path(&ctx.staging_dir, locator, branch, blob_path);
    if let Some(parent) = out_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&out_path, &bytes).await?;

    let resolved = out_path.canonicalize().unwrap_or(out_path);
    Ok(resolved.to_string_lossy().into_owned())
}

fn staging_path(
    staging_dir: &Path,
    locator: &GitHubLocator,
    branch: &str,
    blob_path: &str,
) -> PathBuf {
    staging_dir
        .join(&locator.owner)
        .join(&locator.repo)
        .join(branch)
        .join(blob_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_staging_path_is_deterministic() {
        let locator = GitHubLocator {
            owner: "acme".into(),
            repo: "widgets".into(),
            branch: Some("dev".into()),
            subpath: Some("contracts".into()),
        };
        let path = staging_path(
            Path::new("/cache/solidity"),
            &locator,
            "dev",
            "contracts/Vault.sol",
        );
        assert_eq!(
            path,
            PathBuf::from("/cache/solidity/acme/widgets/dev/contracts/Vault.sol")
        );
    }

    #[test]
    fn test_tree_response_filters() {
        let body = r#"{"tree":[
            {"path":"contracts/Vault.sol","type":"blob"},
            {"path":"contracts","type":"tree"},
            {"path":"README.md","type":"blob"},
            {"path":"test/Mock.sol","type":"blob"}
        ]}"#;
        let tree: TreeResponse = serde_json::from_str(body).unwrap();
        let paths: Vec<String> = tree
            .tree
            .into_iter()
            .filter(|e| e.kind == "blob" && e.path.ends_with(".sol"))
            .map(|e| e.path)
            .filter(|p| p.starts_with("contracts"))
            .collect();
        assert_eq!(paths, ["contracts/Vault.sol"]);
    }

    #[test]
    fn test_matches_github_urls_only() {
        assert!(GitHubStrategy.matches("https://github.com/acme/widgets"));
        assert!(!GitHubStrategy.matches("https://gitlab.com/acme/widgets"));
    }
}

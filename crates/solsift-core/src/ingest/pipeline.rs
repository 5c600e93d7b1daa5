use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::strategy::{default_strategies, IngestContext, RetrievalStrategy};
use crate::artifact::Artifact;
use crate::error::Result;
use crate::network::{ClientConfig, IngestClient};
use crate::persist::ArtifactStore;

/// Drives a batch of ingestion requests: classify, retrieve, extract,
/// persist, one URL at a time.
///
/// The HTTP client is built once here and shared by every strategy for
/// the lifetime of the batch; a client build failure is the only fatal
/// error, raised before any per-URL processing begins. Everything after
/// that is represented as an artifact, never thrown.
pub struct Ingestor {
    ctx: IngestContext,
    strategies: Vec<Box<dyn RetrievalStrategy>>,
    store: ArtifactStore,
}

impl Ingestor {
    pub fn new(ingest_dir: impl Into<PathBuf>, staging_dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_config(ingest_dir, staging_dir, ClientConfig::default())
    }

    pub fn with_config(
        ingest_dir: impl Into<PathBuf>,
        staging_dir: impl Into<PathBuf>,
        config: ClientConfig,
    ) -> Result<Self> {
        let client = IngestClient::new(config)?;
        let store = ArtifactStore::new(ingest_dir)?;
        let staging_dir = staging_dir.into();
        std::fs::create_dir_all(&staging_dir)?;

        Ok(Self {
            ctx: IngestContext {
                client,
                staging_dir,
            },
            strategies: default_strategies(),
            store,
        })
    }

    /// Ingest each input in order, persisting every artifact as it is
    /// assembled. One artifact comes back per input, failures included.
    pub async fn ingest_urls(&self, urls: &[String]) -> Vec<Artifact> {
        let mut artifacts = Vec::with_capacity(urls.len());
        for url in urls {
            let artifact = self.ingest_url(url).await;
            if let Err(e) = self.store.persist(&artifact) {
                warn!("failed to persist artifact for {url}: {e}");
            }
            artifacts.push(artifact);
        }
        artifacts
    }

    /// Dispatch one input to the first strategy that claims it.
    pub async fn ingest_url(&self, input: &str) -> Artifact {
        for strategy in &self.strategies {
            if strategy.matches(input) {
                debug!(strategy = strategy.name(), input, "dispatching");
                return strategy.retrieve(input, &self.ctx).await;
            }
        }
        // The web strategy matches everything, so this is unreachable in
        // the default registry.
        Artifact::failure(input, "no retrieval strategy matched")
    }

    pub fn staging_dir(&self) -> &Path {
        &self.ctx.staging_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ContentKind;
    use std::fs;

    fn ingestor(tmp: &Path) -> Ingestor {
        Ingestor::new(tmp.join("ingest"), tmp.join("staging")).unwrap()
    }

    #[tokio::test]
    async fn test_local_markdown_end_to_end() {
        let tmp = tempfile::tempdir().unwrap();
        let doc = tmp.path().join("protocol.md");
        fs::write(
            &doc,
            "# Protocol\n\n```solidity\npragma solidity ^0.8.0;\ncontract Vault {}\n```\n",
        )
        .unwrap();

        let ingestor = ingestor(tmp.path());
        let urls = vec![doc.to_string_lossy().into_owned()];
        let artifacts = ingestor.ingest_urls(&urls).await;

        assert_eq!(artifacts.len(), 1);
        assert_eq!(artifacts[0].kind, ContentKind::Markdown);
        assert_eq!(artifacts[0].extracted_code.len(), 1);

        // The persistence sink ran exactly once per artifact.
        let written: Vec<_> = fs::read_dir(tmp.path().join("ingest"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert!(written.iter().any(|name| name.ends_with(".json")));
        assert!(written.iter().any(|name| name.ends_with(".txt")));
    }

    #[tokio::test]
    async fn test_one_artifact_per_input_even_on_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let good = tmp.path().join("notes.md");
        fs::write(&good, "plain notes, no code\n").unwrap();

        // An unreadable "local-looking" path that does not exist falls
        // through to the web strategy and fails fast on the bad scheme.
        let urls = vec![
            good.to_string_lossy().into_owned(),
            "not-a-scheme://nowhere".to_string(),
        ];

        let ingestor = ingestor(tmp.path());
        let artifacts = ingestor.ingest_urls(&urls).await;

        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].kind, ContentKind::Markdown);
        assert_eq!(artifacts[1].kind, ContentKind::Error);
        assert!(artifacts[1].error.is_some());
    }

    #[test]
    fn test_client_is_built_before_any_url_work() {
        let tmp = tempfile::tempdir().unwrap();
        // Construction either yields a working session or fails fast; no
        // per-URL lazy surprises.
        let ingestor = ingestor(tmp.path());
        assert!(ingestor.staging_dir().exists());
    }
}

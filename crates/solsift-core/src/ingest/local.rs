use std::path::Path;

use async_trait::async_trait;

use super::strategy::{IngestContext, RetrievalStrategy};
use crate::artifact::{metadata_entry, Artifact, ContentKind};
use crate::classify::{classify, Classification, LocalFormat};
use crate::error::Result;
use crate::extract::{extract_from_html, extract_from_text, HtmlNormalizer};

/// Reads files straight off the filesystem, branching by extension the
/// same way the classifier does.
pub struct LocalStrategy;

#[async_trait]
impl RetrievalStrategy for LocalStrategy {
    fn name(&self) -> &'static str {
        "local"
    }

    fn matches(&self, input: &str) -> bool {
        matches!(classify(input), Classification::Local { .. })
    }

    async fn retrieve(&self, input: &str, _ctx: &IngestContext) -> Artifact {
        let Classification::Local { path, format } = classify(input) else {
            return Artifact::failure(input, "not an existing local path");
        };
        match read_local(&path, format).await {
            Ok(artifact) => artifact,
            Err(e) => Artifact::failure(path.to_string_lossy(), e.to_string()),
        }
    }
}

async fn read_local(path: &Path, format: LocalFormat) -> Result<Artifact> {
    let source = path.to_string_lossy().to_string();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| source.clone());

    match format {
        LocalFormat::Markdown => {
            let raw = read_lossy(path).await?;
            Ok(Artifact::new(source, ContentKind::Markdown)
                .with_title(file_name)
                .with_metadata(metadata_entry("source", "local"))
                .with_code(extract_from_text(&raw))
                .with_raw_text(raw))
        }
        LocalFormat::Html => {
            let raw = read_lossy(path).await?;
            let (text, title) = HtmlNormalizer::new().normalize(&raw);
            let mut artifact = Artifact::new(source, ContentKind::Html)
                .with_metadata(metadata_entry("source", "local"))
                .with_code(extract_from_html(&raw))
                .with_raw_text(text);
            if let Some(title) = title {
                artifact = artifact.with_title(title);
            }
            Ok(artifact)
        }
        LocalFormat::Pdf => {
            let bytes = tokio::fs::read(path).await?;
            match pdf_extract::extract_text_from_mem(&bytes) {
                Ok(text) => Ok(Artifact::new(source, ContentKind::Pdf)
                    .with_title(file_name)
                    .with_metadata(metadata_entry("source", "local"))
                    .with_code(extract_from_text(&text))
                    .with_raw_text(text)),
                Err(e) => Ok(Artifact::new(source, ContentKind::Pdf)
                    .with_title(file_name)
                    .with_error(e.to_string())),
            }
        }
        LocalFormat::PlainText => {
            let raw = read_lossy(path).await?;
            Ok(Artifact::new(source, ContentKind::Local)
                .with_title(file_name)
                .with_metadata(metadata_entry("source", "local"))
                .with_code(extract_from_text(&raw))
                .with_raw_text(raw))
        }
    }
}

async fn read_lossy(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn ctx() -> IngestContext {
        IngestContext {
            client: crate::network::IngestClient::new(crate::network::ClientConfig::default())
                .unwrap(),
            staging_dir: std::env::temp_dir(),
        }
    }

    #[tokio::test]
    async fn test_local_markdown_with_fenced_solidity() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("design.md");
        fs::write(
            &path,
            "# Design\n\n```solidity\npragma solidity ^0.8.0;\ncontract Vault {}\n```\n",
        )
        .unwrap();

        let artifact = LocalStrategy
            .retrieve(path.to_str().unwrap(), &ctx())
            .await;

        assert_eq!(artifact.kind, ContentKind::Markdown);
        assert_eq!(artifact.title.as_deref(), Some("design.md"));
        assert_eq!(artifact.extracted_code.len(), 1);
        assert_eq!(
            artifact.extracted_code[0].language.as_deref(),
            Some("solidity")
        );
        assert_eq!(
            artifact.extracted_code[0].code,
            "pragma solidity ^0.8.0;\ncontract Vault {}"
        );
    }

    #[tokio::test]
    async fn test_local_html_extracts_markup_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.html");
        fs::write(
            &path,
            "<html><head><title>Audit Notes</title></head><body>\
             <pre class=\"language-solidity\">contract A {}</pre></body></html>",
        )
        .unwrap();

        let artifact = LocalStrategy
            .retrieve(path.to_str().unwrap(), &ctx())
            .await;

        assert_eq!(artifact.kind, ContentKind::Html);
        assert_eq!(artifact.extracted_code.len(), 1);
        assert_eq!(
            artifact.extracted_code[0].language.as_deref(),
            Some("solidity")
        );
    }

    #[tokio::test]
    async fn test_unknown_extension_is_plain_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.rst");
        fs::write(&path, "pragma solidity ^0.8.0;\ncontract C {}").unwrap();

        let artifact = LocalStrategy
            .retrieve(path.to_str().unwrap(), &ctx())
            .await;

        assert_eq!(artifact.kind, ContentKind::Local);
        assert_eq!(artifact.extracted_code.len(), 1);
        assert_eq!(
            artifact.extracted_code[0].language.as_deref(),
            Some("solidity")
        );
    }
}

use async_trait::async_trait;

use super::strategy::{IngestContext, RetrievalStrategy};
use crate::artifact::{Artifact, ContentKind};
use crate::classify::{classify, google_doc_id, Classification};
use crate::extract::extract_from_text;

/// Fetches a Google Doc through its plain-text export endpoint. Private
/// documents answer with a non-200 status, which is surfaced as a
/// restriction hint rather than a bare failure.
pub struct GoogleDocStrategy;

#[async_trait]
impl RetrievalStrategy for GoogleDocStrategy {
    fn name(&self) -> &'static str {
        "google_doc"
    }

    fn matches(&self, input: &str) -> bool {
        matches!(classify(input), Classification::GoogleDoc { .. })
    }

    async fn retrieve(&self, input: &str, ctx: &IngestContext) -> Artifact {
        let Some(doc_id) = google_doc_id(input) else {
            return Artifact::new(input, ContentKind::GoogleDoc)
                .with_error("Invalid Google Doc URL");
        };
        let title = format!("Google Doc {doc_id}");
        let export_url =
            format!("https://docs.google.com/document/d/{doc_id}/export?format=txt");

        let response = match ctx.client.get(&export_url).await {
            Ok(response) => response,
            Err(e) => {
                return Artifact::new(input, ContentKind::GoogleDoc)
                    .with_title(title)
                    .with_error(e.to_string());
            }
        };

        let status = response.status().as_u16();
        if status != 200 {
            return Artifact::new(input, ContentKind::GoogleDoc)
                .with_title(title)
                .with_error(format!(
                    "Export failed: HTTP {status} (likely private/restricted)"
                ));
        }

        let text = match response.bytes().await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                return Artifact::new(input, ContentKind::GoogleDoc)
                    .with_title(title)
                    .with_error(e.to_string());
            }
        };

        Artifact::new(input, ContentKind::GoogleDoc)
            .with_title(title)
            .with_code(extract_from_text(&text))
            .with_raw_text(text)
    }
}

use std::time::Duration;

use async_trait::async_trait;

use super::strategy::{IngestContext, RetrievalStrategy};
use crate::artifact::{Artifact, ContentKind};
use crate::classify::{classify, Classification};
use crate::extract::extract_from_text;

const PDF_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches a remote PDF and extracts its text. HTTP failures never reach
/// the `pdf` kind; extraction failures do, since the fetch succeeded.
pub struct PdfUrlStrategy;

#[async_trait]
impl RetrievalStrategy for PdfUrlStrategy {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn matches(&self, input: &str) -> bool {
        matches!(classify(input), Classification::PdfUrl)
    }

    async fn retrieve(&self, input: &str, ctx: &IngestContext) -> Artifact {
        let response = match ctx.client.get_with_timeout(input, PDF_TIMEOUT).await {
            Ok(response) => response,
            Err(e) => return Artifact::failure(input, e.to_string()),
        };

        let status = response.status().as_u16();
        if status != 200 {
            return Artifact::failure(input, format!("HTTP {status}"));
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return Artifact::failure(input, e.to_string()),
        };

        match pdf_extract::extract_text_from_mem(&bytes) {
            Ok(text) => Artifact::new(input, ContentKind::Pdf)
                .with_title(input)
                .with_code(extract_from_text(&text))
                .with_raw_text(text),
            Err(e) => Artifact::new(input, ContentKind::Pdf).with_error(e.to_string()),
        }
    }
}

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;

use super::strategy::{IngestContext, RetrievalStrategy};
use crate::artifact::{Artifact, ContentKind};
use crate::classify::{classify, Classification};
use crate::extract::{extract_from_html, extract_from_text, HtmlNormalizer};

/// Generic HTTP fetch for anything no specific strategy claims. The
/// html-vs-markdown decision happens here, once the response's content
/// type is known; absent or ambiguous content types default to html.
pub struct WebPageStrategy;

#[async_trait]
impl RetrievalStrategy for WebPageStrategy {
    fn name(&self) -> &'static str {
        "web"
    }

    fn matches(&self, input: &str) -> bool {
        matches!(classify(input), Classification::Web)
    }

    async fn retrieve(&self, input: &str, ctx: &IngestContext) -> Artifact {
        fetch_page(input, ctx).await
    }
}

/// Fetch and extract one page. Shared with the restricted-wiki strategy,
/// which defers here when a wiki page turns out to be readable.
pub(super) async fn fetch_page(url: &str, ctx: &IngestContext) -> Artifact {
    let response = match ctx.client.get(url).await {
        Ok(response) => response,
        Err(e) => return Artifact::failure(url, e.to_string()),
    };

    let status = response.status();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_lowercase();

    if status.as_u16() != 200 {
        return Artifact::failure(url, format!("HTTP {}", status.as_u16()));
    }

    let body = match response.bytes().await {
        Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        Err(e) => return Artifact::failure(url, e.to_string()),
    };

    let lower_url = url.to_lowercase();
    if content_type.contains("/markdown")
        || lower_url.ends_with(".md")
        || lower_url.ends_with(".markdown")
    {
        let fragments = extract_from_text(&body);
        return Artifact::new(url, ContentKind::Markdown)
            .with_title(url)
            .with_code(fragments)
            .with_raw_text(body);
    }

    let (text, title) = HtmlNormalizer::new().normalize(&body);
    let mut artifact = Artifact::new(url, ContentKind::Html)
        .with_code(extract_from_html(&body))
        .with_raw_text(text);
    if let Some(title) = title {
        artifact = artifact.with_title(title);
    }
    artifact
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_only_generic_inputs() {
        assert!(WebPageStrategy.matches("https://example.com/docs"));
        assert!(!WebPageStrategy.matches("https://github.com/acme/widgets"));
        assert!(!WebPageStrategy.matches("https://example.com/report.pdf"));
    }
}

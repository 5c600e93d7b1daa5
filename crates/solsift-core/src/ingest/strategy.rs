use std::path::PathBuf;

use async_trait::async_trait;

use crate::artifact::Artifact;
use crate::network::IngestClient;

/// Shared state handed to every strategy: the pooled HTTP client and the
/// staging root for downloaded source files.
pub struct IngestContext {
    pub client: IngestClient,
    pub staging_dir: PathBuf,
}

/// One retrieval strategy per content kind.
///
/// `retrieve` must return exactly one artifact and never let an error
/// escape its boundary; failures become `error`- or `restricted`-kind
/// artifacts carrying a short message.
#[async_trait]
pub trait RetrievalStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether this strategy applies to the input. Strategies are probed
    /// in registry order, first match wins.
    fn matches(&self, input: &str) -> bool;

    async fn retrieve(&self, input: &str, ctx: &IngestContext) -> Artifact;
}

/// The default ordered registry. The web strategy matches everything, so
/// dispatch is total.
#[must_use]
pub fn default_strategies() -> Vec<Box<dyn RetrievalStrategy>> {
    vec![
        Box::new(super::LocalStrategy),
        Box::new(super::GitHubStrategy),
        Box::new(super::GoogleDocStrategy),
        Box::new(super::RestrictedWikiStrategy),
        Box::new(super::PdfUrlStrategy),
        Box::new(super::WebPageStrategy),
    ]
}

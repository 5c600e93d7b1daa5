use std::time::Duration;

use async_trait::async_trait;

use super::strategy::{IngestContext, RetrievalStrategy};
use super::web::fetch_page;
use crate::artifact::{Artifact, ContentKind};
use crate::classify::{classify, Classification};

const WIKI_TIMEOUT: Duration = Duration::from_secs(15);

/// Body substrings that, together with the platform marker, identify a
/// login wall served with a 200 status.
const LOGIN_MARKERS: &[&str] = &["login", "sign in", "sign-in"];
const PLATFORM_MARKER: &str = "slite";

/// Probes a restricted-wiki host. Pages behind the login wall produce a
/// `restricted` artifact with an explanatory error; readable pages defer
/// to the generic web strategy.
pub struct RestrictedWikiStrategy;

#[async_trait]
impl RetrievalStrategy for RestrictedWikiStrategy {
    fn name(&self) -> &'static str {
        "wiki"
    }

    fn matches(&self, input: &str) -> bool {
        matches!(classify(input), Classification::Restricted)
    }

    async fn retrieve(&self, input: &str, ctx: &IngestContext) -> Artifact {
        let response = match ctx.client.get_with_timeout(input, WIKI_TIMEOUT).await {
            Ok(response) => response,
            Err(e) => {
                return Artifact::new(input, ContentKind::Restricted).with_error(e.to_string());
            }
        };

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Artifact::new(input, ContentKind::Restricted)
                .with_error(format!("Restricted: HTTP {status}"));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                return Artifact::new(input, ContentKind::Restricted).with_error(e.to_string());
            }
        };

        if is_login_wall(&body) {
            return Artifact::new(input, ContentKind::Restricted)
                .with_error("Restricted (login page)");
        }

        fetch_page(input, ctx).await
    }
}

fn is_login_wall(body: &str) -> bool {
    let lower = body.to_lowercase();
    lower.contains(PLATFORM_MARKER) && LOGIN_MARKERS.iter().any(|marker| lower.contains(marker))
}

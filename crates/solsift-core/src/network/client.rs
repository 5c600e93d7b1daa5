use std::time::Duration;

use reqwest::{Client, Response};

use super::config::ClientConfig;
use crate::error::Result;

/// HTTP client shared by every retrieval strategy in a batch run.
///
/// Built once per run so connections are pooled and the user-agent stays
/// stable; requests are never retried. Dropping the client at the end of
/// the run releases the pool.
pub struct IngestClient {
    inner: Client,
    config: ClientConfig,
}

impl IngestClient {
    /// Build the underlying client. A failure here is a fatal
    /// precondition: without a client no network strategy can run.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let inner = Client::builder()
            .user_agent(config.user_agent.clone())
            .connect_timeout(Duration::from_secs(u64::from(config.connect_timeout_seconds)))
            .timeout(Duration::from_secs(u64::from(config.request_timeout_seconds)))
            .build()?;
        Ok(Self { inner, config })
    }

    /// GET with the configured default request timeout.
    pub async fn get(&self, url: &str) -> Result<Response> {
        let response = self.inner.get(url).send().await?;
        Ok(response)
    }

    /// GET with a per-call timeout override, for strategies whose sources
    /// warrant longer or shorter bounds than the default.
    pub async fn get_with_timeout(&self, url: &str, timeout: Duration) -> Result<Response> {
        let response = self.inner.get(url).timeout(timeout).send().await?;
        Ok(response)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

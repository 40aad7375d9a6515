use std::fmt;

use async_trait::async_trait;
use gridplace_model::SourceUrl;
use reqwest::Client;
use tracing::debug;

use super::{ImageSource, RetryPolicy};
use crate::error::{FetchError, PlacementError, Result};

/// HTTP-based image fetcher with connection pooling and retry logic.
#[derive(Clone)]
pub struct HttpImageFetcher {
    client: Client,
    policy: RetryPolicy,
}

impl fmt::Debug for HttpImageFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpImageFetcher")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl HttpImageFetcher {
    pub fn new(policy: RetryPolicy, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(4)
            .user_agent(user_agent)
            .build()
            .map_err(|err| PlacementError::HttpClient(err.to_string()))?;

        Ok(Self { client, policy })
    }

    /// Reuse an existing client, e.g. one shared with other host code.
    pub fn with_client(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn fetch_once(
        &self,
        url: &str,
    ) -> std::result::Result<Vec<u8>, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let bytes = response.bytes().await?;
        debug!("[fetch] {} bytes from {}", bytes.len(), url);
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl ImageSource for HttpImageFetcher {
    async fn fetch(
        &self,
        url: &SourceUrl,
    ) -> std::result::Result<Vec<u8>, FetchError> {
        let target = url.as_str();
        self.policy
            .execute(
                target,
                |_| self.fetch_once(target),
                |after| FetchError::Timeout {
                    url: target.to_string(),
                    after,
                },
            )
            .await
    }
}

// ABOUTME: Sandbox-cluster status calls using the provisioning retry policy.
// ABOUTME: A freshly created cluster answers 404 until it materializes.

use super::client::{ApiClient, read_body};
use super::error::ApiError;
use super::retry::{RetryPolicy, with_retry};
use crate::cancel::CancelToken;
use crate::types::SandboxId;
use serde::Deserialize;
use tracing::debug;

/// Provisioning state of an ephemeral sandbox cluster.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SandboxCluster {
    pub id: SandboxId,
    pub status: String,
    #[serde(default)]
    pub percent_complete: Option<u8>,
}

impl ApiClient {
    /// Fetch sandbox-cluster status, retrying while the cluster record has
    /// not materialized yet (404) or the service is unreachable.
    pub async fn fetch_sandbox_cluster(
        &self,
        id: &SandboxId,
        policy: &RetryPolicy,
        cancel: &mut CancelToken,
    ) -> Result<SandboxCluster, ApiError> {
        with_retry(policy, cancel, || self.fetch_sandbox_once(id)).await
    }

    async fn fetch_sandbox_once(&self, id: &SandboxId) -> Result<SandboxCluster, ApiError> {
        let url = format!(
            "{}/sandbox/clusters/{}",
            self.base_url(),
            urlencoding::encode(id.as_str())
        );
        debug!("GET {url}");

        let response = self
            .get(&url)
            .send()
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;

        read_body(url, response).await
    }
}

// ABOUTME: Sandbox command implementation.
// ABOUTME: Polls provisioning status under the bounded retry policy.

use caravel::api::{ApiClient, RetryPolicy};
use caravel::cancel::CancelToken;
use caravel::error::Result;
use caravel::output::Output;
use caravel::types::SandboxId;

pub async fn sandbox(
    id: String,
    client: &ApiClient,
    output: &Output,
    cancel: &mut CancelToken,
) -> Result<()> {
    let id = SandboxId::new(id);
    let cluster = client
        .fetch_sandbox_cluster(&id, &RetryPolicy::default(), cancel)
        .await?;

    let line = match cluster.percent_complete {
        Some(percent) => format!("sandbox {}: {} ({percent}%)", cluster.id, cluster.status),
        None => format!("sandbox {}: {}", cluster.id, cluster.status),
    };
    output.success(&line);
    Ok(())
}

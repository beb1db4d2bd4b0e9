// ABOUTME: Status command implementation.
// ABOUTME: One-shot pipeline lookup rendered through the output presenter.

use caravel::api::{ApiClient, ApiError};
use caravel::error::Result;
use caravel::output::Output;
use caravel::types::PipelineId;

pub async fn status(pipeline: String, client: &ApiClient, output: &Output) -> Result<()> {
    let id = PipelineId::new(pipeline);

    match client.fetch_pipeline(&id).await {
        Ok(pipeline) => {
            output.pipeline_status(&pipeline);
            Ok(())
        }
        // Legacy pipelines predate the status model; report rather than fail.
        Err(ApiError::PipelineNotFound { .. }) => {
            output.progress(&format!("no status available for pipeline {id}"));
            Ok(())
        }
        Err(error) => Err(error.into()),
    }
}

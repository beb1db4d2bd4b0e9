// ABOUTME: Watch command implementation.
// ABOUTME: Streams pipeline events through the waiter until a terminal state.

use caravel::api::ApiClient;
use caravel::cancel::CancelToken;
use caravel::error::{Error, Result};
use caravel::output::Output;
use caravel::types::PipelineId;
use caravel::waiter::{PipelineWaiter, WaitOutcome, WaitSettings};

pub async fn watch(
    pipeline: String,
    console_url: Option<String>,
    client: &ApiClient,
    output: &mut Output,
    cancel: &mut CancelToken,
) -> Result<()> {
    let id = PipelineId::new(pipeline);
    let waiter = PipelineWaiter::new(
        client,
        WaitSettings {
            console_base_url: console_url,
            ..WaitSettings::default()
        },
    );

    match waiter.track(&id, cancel, output).await? {
        WaitOutcome::Completed(status) if status.is_successful() => {
            output.success("Pipeline succeeded");
            Ok(())
        }
        WaitOutcome::Completed(status) => Err(Error::PipelineFailed(status)),
        WaitOutcome::Untracked => {
            output.progress(&format!("no status available for pipeline {id}"));
            Ok(())
        }
        WaitOutcome::Started => Ok(()),
    }
}

// ABOUTME: Pipeline status tracking: polls the backend until start or completion.
// ABOUTME: One loop per call, cancel-aware at every suspension point, deadline mandatory.

use crate::api::{ApiError, Event, PipelineBackend, PipelineStatus};
use crate::cancel::CancelToken;
use crate::types::PipelineId;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tracing::warn;

/// Tuning for a wait. The timeout is mandatory in effect: a zero value is a
/// configuration error, never an unbounded poll.
#[derive(Debug, Clone)]
pub struct WaitSettings {
    pub interval: Duration,
    pub timeout: Duration,
    /// Base URL of the operator console, used for deep links in conflict
    /// errors.
    pub console_base_url: Option<String>,
}

impl Default for WaitSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(4),
            timeout: Duration::from_secs(600),
            console_base_url: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum WaitError {
    #[error("waiting on a pipeline requires a deadline; configure a non-zero timeout")]
    MissingDeadline,

    #[error("timed out after {0:?} waiting for the pipeline")]
    DeadlineExceeded(Duration),

    /// Pass-through cancellation, never wrapped into a domain error.
    #[error("wait cancelled")]
    Cancelled,

    /// Another in-progress pipeline must finish first.
    #[error("{}", blocked_message(.pipeline, .blocked_by, .console_url))]
    Blocked {
        pipeline: PipelineId,
        blocked_by: PipelineId,
        console_url: Option<String>,
    },
}

fn blocked_message(
    pipeline: &PipelineId,
    blocked_by: &PipelineId,
    console_url: &Option<String>,
) -> String {
    let mut message =
        format!("pipeline {pipeline} is blocked by in-progress pipeline {blocked_by}");
    if let Some(url) = console_url {
        message.push_str(&format!("\nsee {url}"));
    }
    message
}

/// How a wait ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "wait outcomes must be checked"]
pub enum WaitOutcome {
    /// The pipeline left the queued phase and is executing.
    Started,
    /// The pipeline reached a terminal backend status.
    Completed(PipelineStatus),
    /// The backend does not know this pipeline; older pipelines predate this
    /// status model, so there is nothing to track and nothing failed.
    Untracked,
}

/// Receives intermediate progress while tracking a pipeline to completion.
pub trait ProgressSink {
    fn pipeline_event(&mut self, event: &Event);
    fn status_changed(&mut self, status: PipelineStatus);
}

/// What a single status fetch told us.
enum PollResult {
    Snapshot(crate::api::Pipeline),
    /// Dedicated not-found sentinel from the backend.
    Untracked,
    /// Transport failure; logged, retried on the next tick.
    Transient,
}

/// Classification of a pipeline snapshot against the wait state machine.
enum Observation {
    KeepPolling,
    Started,
    Terminal(PipelineStatus),
    Blocked(PipelineId),
}

fn classify(pipeline: &crate::api::Pipeline) -> Observation {
    match pipeline.status {
        // A blocker may surface on a queued pipeline before rejection, or on
        // a rejected one once the relation materializes server-side. Without
        // one, REJECTED is transient and QUEUED is simply still waiting.
        PipelineStatus::Queued | PipelineStatus::Rejected => {
            match &pipeline.blocked_by_pipeline {
                Some(blocker) => Observation::Blocked(blocker.id.clone()),
                None => Observation::KeepPolling,
            }
        }
        status if status.is_terminal() => Observation::Terminal(status),
        PipelineStatus::Running | PipelineStatus::Paused | PipelineStatus::AwaitingApproval => {
            Observation::Started
        }
        // Unknown statuses: assume still in flight.
        _ => Observation::KeepPolling,
    }
}

/// Polls a single pipeline until it starts, completes, or is blocked.
///
/// The waiter owns its snapshot and event cursor exclusively; there is no
/// concurrent writer and no locking.
pub struct PipelineWaiter<'a, B: PipelineBackend + ?Sized> {
    backend: &'a B,
    settings: WaitSettings,
}

impl<'a, B: PipelineBackend + ?Sized> PipelineWaiter<'a, B> {
    pub fn new(backend: &'a B, settings: WaitSettings) -> Self {
        Self { backend, settings }
    }

    /// Console deep link for a pipeline, when a console base URL is known.
    pub fn console_url(&self, id: &PipelineId) -> Option<String> {
        self.settings.console_base_url.as_ref().map(|base| {
            format!(
                "{}/pipelines/{}",
                base.trim_end_matches('/'),
                urlencoding::encode(id.as_str())
            )
        })
    }

    /// Poll until the pipeline leaves the queued phase.
    ///
    /// Returns `Started` once the pipeline is executing, `Completed` if it
    /// reached a terminal status while still being watched, and `Untracked`
    /// for an id the backend does not know. A populated blocked-by relation
    /// (on QUEUED or REJECTED) surfaces as [`WaitError::Blocked`].
    pub async fn wait_until_started(
        &self,
        id: &PipelineId,
        cancel: &mut CancelToken,
    ) -> Result<WaitOutcome, WaitError> {
        let deadline = self.deadline()?;

        loop {
            match self.poll(id, cancel).await? {
                PollResult::Untracked => return Ok(WaitOutcome::Untracked),
                PollResult::Transient => {}
                PollResult::Snapshot(pipeline) => match classify(&pipeline) {
                    Observation::KeepPolling => {}
                    Observation::Started => return Ok(WaitOutcome::Started),
                    Observation::Terminal(status) => {
                        return Ok(WaitOutcome::Completed(status));
                    }
                    Observation::Blocked(blocker) => return Err(self.blocked(id, blocker)),
                },
            }

            self.tick(deadline, cancel).await?;
        }
    }

    /// Drive the pipeline to a terminal outcome, feeding events and status
    /// changes to `sink`.
    ///
    /// Events are consumed through a monotonic cursor: repeated polls never
    /// re-deliver already-seen events and never skip ahead.
    pub async fn track<P: ProgressSink + ?Sized>(
        &self,
        id: &PipelineId,
        cancel: &mut CancelToken,
        sink: &mut P,
    ) -> Result<WaitOutcome, WaitError> {
        let deadline = self.deadline()?;
        let mut cursor = 0u64;
        let mut last_status: Option<PipelineStatus> = None;

        loop {
            cursor = self.deliver_events(id, cursor, cancel, sink).await?;

            match self.poll(id, cancel).await? {
                PollResult::Untracked => return Ok(WaitOutcome::Untracked),
                PollResult::Transient => {}
                PollResult::Snapshot(pipeline) => {
                    if last_status != Some(pipeline.status) {
                        last_status = Some(pipeline.status);
                        sink.status_changed(pipeline.status);
                    }

                    match classify(&pipeline) {
                        Observation::KeepPolling | Observation::Started => {}
                        Observation::Terminal(status) => {
                            // Pick up the event tail written at completion.
                            self.deliver_events(id, cursor, cancel, sink).await?;
                            return Ok(WaitOutcome::Completed(status));
                        }
                        Observation::Blocked(blocker) => return Err(self.blocked(id, blocker)),
                    }
                }
            }

            self.tick(deadline, cancel).await?;
        }
    }

    fn deadline(&self) -> Result<Instant, WaitError> {
        if self.settings.timeout.is_zero() {
            return Err(WaitError::MissingDeadline);
        }
        Ok(Instant::now() + self.settings.timeout)
    }

    fn blocked(&self, id: &PipelineId, blocker: PipelineId) -> WaitError {
        let console_url = self.console_url(&blocker);
        WaitError::Blocked {
            pipeline: id.clone(),
            blocked_by: blocker,
            console_url,
        }
    }

    async fn poll(
        &self,
        id: &PipelineId,
        cancel: &mut CancelToken,
    ) -> Result<PollResult, WaitError> {
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WaitError::Cancelled),
            fetched = self.backend.fetch_pipeline(id) => fetched,
        };

        match fetched {
            Ok(pipeline) => Ok(PollResult::Snapshot(pipeline)),
            Err(ApiError::PipelineNotFound { .. }) => Ok(PollResult::Untracked),
            Err(error) => {
                warn!("pipeline status fetch failed, retrying on next tick: {error}");
                Ok(PollResult::Transient)
            }
        }
    }

    /// Fetch and deliver events strictly after `cursor`; returns the
    /// advanced cursor. Transport failures are logged and skipped.
    async fn deliver_events<P: ProgressSink + ?Sized>(
        &self,
        id: &PipelineId,
        cursor: u64,
        cancel: &mut CancelToken,
        sink: &mut P,
    ) -> Result<u64, WaitError> {
        let fetched = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(WaitError::Cancelled),
            fetched = self.backend.fetch_events(id, cursor) => fetched,
        };

        match fetched {
            Ok(page) => {
                for event in page.events.iter().filter(|event| event.cursor > cursor) {
                    sink.pipeline_event(event);
                }
                // The cursor only ever advances.
                Ok(cursor.max(page.cursor))
            }
            Err(error) => {
                warn!("event fetch failed, retrying on next tick: {error}");
                Ok(cursor)
            }
        }
    }

    async fn tick(&self, deadline: Instant, cancel: &mut CancelToken) -> Result<(), WaitError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(WaitError::Cancelled),
            _ = tokio::time::sleep_until(deadline) => {
                Err(WaitError::DeadlineExceeded(self.settings.timeout))
            }
            _ = tokio::time::sleep(self.settings.interval) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Pipeline;

    fn pipeline(status: PipelineStatus, blocker: Option<&str>) -> Pipeline {
        Pipeline {
            id: PipelineId::new("p-1"),
            status,
            application: None,
            blocked_by_pipeline: blocker.map(|id| {
                Box::new(Pipeline {
                    id: PipelineId::new(id),
                    status: PipelineStatus::Running,
                    application: None,
                    blocked_by_pipeline: None,
                    replaced_by_pipeline: None,
                })
            }),
            replaced_by_pipeline: None,
        }
    }

    #[test]
    fn queued_without_blocker_keeps_polling() {
        assert!(matches!(
            classify(&pipeline(PipelineStatus::Queued, None)),
            Observation::KeepPolling
        ));
    }

    #[test]
    fn rejected_without_blocker_is_transient() {
        assert!(matches!(
            classify(&pipeline(PipelineStatus::Rejected, None)),
            Observation::KeepPolling
        ));
    }

    #[test]
    fn blocker_wins_for_queued_and_rejected() {
        for status in [PipelineStatus::Queued, PipelineStatus::Rejected] {
            match classify(&pipeline(status, Some("other"))) {
                Observation::Blocked(id) => assert_eq!(id, PipelineId::new("other")),
                _ => panic!("expected blocked observation for {status}"),
            }
        }
    }

    #[test]
    fn in_flight_statuses_count_as_started() {
        for status in [
            PipelineStatus::Running,
            PipelineStatus::Paused,
            PipelineStatus::AwaitingApproval,
        ] {
            assert!(matches!(
                classify(&pipeline(status, None)),
                Observation::Started
            ));
        }
    }

    #[test]
    fn terminal_statuses_classify_as_terminal() {
        for status in [
            PipelineStatus::Succeeded,
            PipelineStatus::Failed,
            PipelineStatus::Cancelled,
            PipelineStatus::Aborted,
        ] {
            assert!(matches!(
                classify(&pipeline(status, None)),
                Observation::Terminal(s) if s == status
            ));
        }
    }

    #[test]
    fn unknown_status_keeps_polling() {
        assert!(matches!(
            classify(&pipeline(PipelineStatus::Unknown, None)),
            Observation::KeepPolling
        ));
    }
}

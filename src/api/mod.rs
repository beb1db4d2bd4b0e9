// ABOUTME: Orchestration service API: submission, status/event fetching, retries.
// ABOUTME: Exposes the injectable client and the PipelineBackend seam for doubles.

mod client;
mod error;
mod pipeline;
mod retry;
mod sandbox;

pub use client::ApiClient;
pub use error::{ApiError, ApiErrorDetail, ApiErrorKind};
pub use pipeline::{
    CONFIG_LOCATION_HEADER, ConfigLocation, EnvironmentSummary, Event, EventPage,
    MEDIA_TYPE_PIPELINE_V2, MEDIA_TYPE_PIPELINE_V2_LINK, PIPELINE_REF_PREFIX, Pipeline,
    PipelineBackend, PipelineDescriptor, PipelineStatus, ReferenceOverrides, Submission,
};
pub use retry::{RetryPolicy, with_retry};
pub use sandbox::SandboxCluster;

// ABOUTME: Pipeline wire types, media types, and the submission/backend contracts.
// ABOUTME: Pipelines carry a depth-bounded blocked-by relation pruned after each fetch.

use super::error::ApiError;
use crate::request::{AssembleError, DeploymentRequest, Overrides};
use crate::types::PipelineId;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Media type for a structured pipeline body.
pub const MEDIA_TYPE_PIPELINE_V2: &str = "application/vnd.caravel.pipeline.v2+json";
/// Media type signaling a reference submission (config lives elsewhere).
pub const MEDIA_TYPE_PIPELINE_V2_LINK: &str = "application/vnd.caravel.pipeline.link.v2+json";
/// Header naming the external config source for reference submissions.
pub const CONFIG_LOCATION_HEADER: &str = "X-Caravel-Config-Location";
/// Prefix marking a config reference to an existing pipeline's config.
pub const PIPELINE_REF_PREFIX: &str = "caravel::";

/// Server-issued identity for a created pipeline. Read-only to the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDescriptor {
    pub id: PipelineId,
    pub started_at: DateTime<Utc>,
    pub status: PipelineStatus,
    pub application: String,
    #[serde(default)]
    pub initiated_by: Option<String>,
    #[serde(default)]
    pub environment: Option<EnvironmentSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentSummary {
    pub provider: String,
    pub account: String,
}

/// Status-tracking view of a pipeline, fetched fresh on every poll.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pipeline {
    pub id: PipelineId,
    pub status: PipelineStatus,
    #[serde(default)]
    pub application: Option<String>,
    #[serde(default)]
    pub blocked_by_pipeline: Option<Box<Pipeline>>,
    #[serde(default)]
    pub replaced_by_pipeline: Option<Box<Pipeline>>,
}

impl Pipeline {
    /// Bound the self-referential relations to `depth` hops. The protocol
    /// only ever populates one hop, but nothing enforces acyclicity, so the
    /// client truncates instead of trusting it.
    pub fn pruned(mut self, depth: usize) -> Self {
        if depth == 0 {
            self.blocked_by_pipeline = None;
            self.replaced_by_pipeline = None;
        } else {
            self.blocked_by_pipeline = self
                .blocked_by_pipeline
                .map(|p| Box::new(p.pruned(depth - 1)));
            self.replaced_by_pipeline = self
                .replaced_by_pipeline
                .map(|p| Box::new(p.pruned(depth - 1)));
        }
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineStatus {
    Queued,
    Running,
    Paused,
    AwaitingApproval,
    Rejected,
    Succeeded,
    Failed,
    Cancelled,
    Aborted,
    /// Statuses this client does not know yet; treated as still in flight.
    #[serde(other)]
    Unknown,
}

impl PipelineStatus {
    /// Final backend outcomes. REJECTED is not terminal by itself: it only
    /// resolves once the blocking pipeline is known.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PipelineStatus::Succeeded
                | PipelineStatus::Failed
                | PipelineStatus::Cancelled
                | PipelineStatus::Aborted
        )
    }

    pub fn is_successful(&self) -> bool {
        matches!(self, PipelineStatus::Succeeded)
    }
}

impl std::fmt::Display for PipelineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStatus::Queued => "QUEUED",
            PipelineStatus::Running => "RUNNING",
            PipelineStatus::Paused => "PAUSED",
            PipelineStatus::AwaitingApproval => "AWAITING_APPROVAL",
            PipelineStatus::Rejected => "REJECTED",
            PipelineStatus::Succeeded => "SUCCEEDED",
            PipelineStatus::Failed => "FAILED",
            PipelineStatus::Cancelled => "CANCELLED",
            PipelineStatus::Aborted => "ABORTED",
            PipelineStatus::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// One append-only pipeline event, addressed by a monotonic cursor.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub message: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub status: Option<PipelineStatus>,
    pub occurred_at: DateTime<Utc>,
    pub cursor: u64,
}

/// A page of events plus the cursor to resume from.
#[derive(Debug, Clone)]
pub struct EventPage {
    pub events: Vec<Event>,
    pub cursor: u64,
}

/// What to send to the pipeline-creation endpoint.
#[derive(Debug, Clone)]
pub enum Submission {
    /// Full request body, structured media type.
    Structured(DeploymentRequest),
    /// Config lives elsewhere; only override fields travel in the body.
    Reference {
        location: ConfigLocation,
        overrides: ReferenceOverrides,
    },
}

impl Submission {
    /// Build a reference submission, rejecting overrides that would conflict
    /// with the referenced config. Overriding the account is permitted;
    /// overriding the application is not.
    pub fn by_reference(
        location: ConfigLocation,
        overrides: &Overrides,
    ) -> Result<Self, AssembleError> {
        if overrides.application.is_some() {
            return Err(AssembleError::ApplicationOverrideWithReference);
        }
        Ok(Submission::Reference {
            location,
            overrides: ReferenceOverrides {
                account: overrides.account.clone(),
            },
        })
    }
}

/// Where a referenced deployment config lives.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigLocation {
    /// A hosted deployment descriptor, fetched by the backend.
    Hosted(String),
    /// The config of an existing pipeline, in `caravel::<id>` form.
    Pipeline(PipelineId),
}

impl ConfigLocation {
    /// Parse a raw flag value: the `caravel::` prefix selects a pipeline
    /// reference, anything else is a hosted URL.
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix(PIPELINE_REF_PREFIX) {
            Some(id) => ConfigLocation::Pipeline(PipelineId::new(id)),
            None => ConfigLocation::Hosted(raw.to_string()),
        }
    }

    pub fn header_value(&self) -> String {
        match self {
            ConfigLocation::Hosted(url) => url.clone(),
            ConfigLocation::Pipeline(id) => format!("{PIPELINE_REF_PREFIX}{id}"),
        }
    }
}

/// Override fields a reference submission may carry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReferenceOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

/// The narrow contract the waiter depends on, implemented by [`super::ApiClient`]
/// and by scripted test doubles.
#[async_trait]
pub trait PipelineBackend: Send + Sync {
    /// Fetch a fresh pipeline snapshot. A missing pipeline surfaces as the
    /// dedicated [`ApiError::PipelineNotFound`] sentinel, never as a generic
    /// HTTP error.
    async fn fetch_pipeline(&self, id: &PipelineId) -> Result<Pipeline, ApiError>;

    /// Fetch events strictly after `after`, plus the cursor to resume from.
    async fn fetch_events(&self, id: &PipelineId, after: u64) -> Result<EventPage, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_location_roundtrip() {
        let hosted = ConfigLocation::parse("https://configs.example.com/app.yml");
        assert_eq!(
            hosted.header_value(),
            "https://configs.example.com/app.yml"
        );

        let by_pipeline = ConfigLocation::parse("caravel::pipe-123");
        assert_eq!(
            by_pipeline,
            ConfigLocation::Pipeline(PipelineId::new("pipe-123"))
        );
        assert_eq!(by_pipeline.header_value(), "caravel::pipe-123");
    }

    #[test]
    fn reference_submission_rejects_application_override() {
        let overrides = Overrides {
            application: Some("other-app".to_string()),
            account: None,
        };
        let err = Submission::by_reference(
            ConfigLocation::parse("caravel::pipe-123"),
            &overrides,
        )
        .unwrap_err();
        assert_eq!(err, AssembleError::ApplicationOverrideWithReference);
    }

    #[test]
    fn reference_submission_allows_account_override() {
        let overrides = Overrides {
            application: None,
            account: Some("staging-cluster".to_string()),
        };
        let submission = Submission::by_reference(
            ConfigLocation::parse("https://configs.example.com/app.yml"),
            &overrides,
        )
        .unwrap();
        let Submission::Reference { overrides, .. } = submission else {
            panic!("expected reference submission");
        };
        assert_eq!(overrides.account.as_deref(), Some("staging-cluster"));
    }

    #[test]
    fn unknown_status_deserializes_without_error() {
        let status: PipelineStatus = serde_json::from_str("\"SOMETHING_NEW\"").unwrap();
        assert_eq!(status, PipelineStatus::Unknown);
        assert!(!status.is_terminal());
    }

    #[test]
    fn pruning_caps_relation_depth() {
        let nested = r#"{
            "id": "a",
            "status": "QUEUED",
            "blockedByPipeline": {
                "id": "b",
                "status": "RUNNING",
                "blockedByPipeline": {"id": "c", "status": "RUNNING"}
            }
        }"#;
        let pipeline: Pipeline = serde_json::from_str(nested).unwrap();
        let pruned = pipeline.pruned(1);
        let blocker = pruned.blocked_by_pipeline.expect("one hop kept");
        assert_eq!(blocker.id, PipelineId::new("b"));
        assert!(blocker.blocked_by_pipeline.is_none(), "second hop dropped");
    }
}

// ABOUTME: Rollout strategy model: closed variant types for strategies and canary steps.
// ABOUTME: The compile submodule turns descriptor step tokens into these values.

mod compile;

pub use compile::{StrategyError, compile_strategy};

use serde::{Deserialize, Serialize};

/// Default service names for a blue/green strategy. The descriptor may
/// override both via `activeService`/`previewService`.
pub const DEFAULT_ACTIVE_SERVICE: &str = "active";
pub const DEFAULT_PREVIEW_SERVICE: &str = "preview";

/// A rollout strategy as submitted to the orchestrator.
///
/// Exactly one shape per strategy; callers match exhaustively instead of
/// probing optional fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Strategy {
    /// Replace the running version in place.
    Update {},

    /// Run the new version next to the old one behind a preview service,
    /// then swap.
    #[serde(rename_all = "camelCase")]
    BlueGreen {
        active_service: String,
        preview_service: String,
    },

    /// Shift traffic progressively through an ordered list of steps.
    Canary { steps: Vec<CanaryStep> },
}

/// One ordered action in a canary rollout. Order is execution order and is
/// preserved exactly as declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CanaryStep {
    Pause(PauseStep),
    SetWeight { percent: u8 },
    Wait { duration: WaitDuration },
}

/// A pause, either for a fixed duration or until a human approves.
///
/// The same shape is used for `beforeDeployment` constraint steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PauseStep {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<TimeUnit>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until_approved: Option<bool>,
}

impl PauseStep {
    /// A judgment-style pause that waits for manual approval.
    pub fn until_approved() -> Self {
        Self {
            until_approved: Some(true),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Seconds,
    Minutes,
    Hours,
}

/// Wait step payload: either a bare integer (seconds) or a duration
/// string like `"10m"`, matching how the token was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WaitDuration {
    Seconds(u64),
    Spec(String),
}

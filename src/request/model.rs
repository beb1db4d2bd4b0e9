// ABOUTME: Wire-level deployment request model submitted to the orchestrator.
// ABOUTME: BTreeMap keys and fixed field order keep serialization deterministic.

use crate::strategy::{CanaryStep, Strategy};
use nonempty::NonEmpty;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The complete deployment request. Built client-side, immutable once
/// submitted. Identical inputs serialize to byte-identical JSON bodies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRequest {
    pub application: String,
    pub environment: Environment,
    pub artifacts: NonEmpty<Artifact>,
    pub strategies: BTreeMap<String, Strategy>,
    pub targets: BTreeMap<String, TargetPlan>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Environment {
    pub provider: String,
    pub account: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// Per-target rollout plan: the named strategy plus optional gating
/// constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetPlan {
    pub strategy: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Constraint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,

    /// Pause steps sharing the canary pause shape.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub before_deployment: Vec<CanaryStep>,
}

/// A deployable artifact: plain manifests or a kustomization, sourced either
/// by URL (resolved by the backend) or as inline content (resolved locally).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Artifact {
    Manifests(ArtifactSpec),
    Kustomize(ArtifactSpec),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSpec {
    #[serde(flatten)]
    pub source: ArtifactSource,

    /// Per-image version overrides applied by whoever resolves the source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub versions: Option<BTreeMap<String, String>>,

    /// Absent: applies to every target. Present: must name at least one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArtifactSource {
    Url(String),
    Inline(String),
}

impl Artifact {
    pub fn spec(&self) -> &ArtifactSpec {
        match self {
            Artifact::Manifests(spec) | Artifact::Kustomize(spec) => spec,
        }
    }

    fn spec_mut(&mut self) -> &mut ArtifactSpec {
        match self {
            Artifact::Manifests(spec) | Artifact::Kustomize(spec) => spec,
        }
    }

    pub fn targets(&self) -> Option<&[String]> {
        self.spec().targets.as_deref()
    }

    /// Attach the target filter from the descriptor entry that produced this
    /// artifact. A `None` filter leaves any existing filter untouched.
    pub fn with_targets(mut self, targets: Option<Vec<String>>) -> Self {
        if targets.is_some() {
            self.spec_mut().targets = targets;
        }
        self
    }

    /// Short human label for error messages.
    pub fn source_label(&self) -> String {
        match &self.spec().source {
            ArtifactSource::Url(url) => url.clone(),
            ArtifactSource::Inline(_) => "inline manifest".to_string(),
        }
    }
}

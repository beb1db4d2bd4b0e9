// ABOUTME: Deployment descriptor types and parsing for caravel.yml.
// ABOUTME: Handles YAML parsing, file discovery, and starter-file scaffolding.

use crate::error::{Error, Result};
use crate::strategy::PauseStep;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DESCRIPTOR_FILENAME: &str = "caravel.yml";
pub const DESCRIPTOR_FILENAME_ALT: &str = "caravel.yaml";

/// The operator-authored description of a deployment: what to deploy, where,
/// and how to roll it out. Parsed from YAML; never sent over the wire as-is.
#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentDescriptor {
    #[serde(default)]
    pub version: Option<String>,

    /// Application name. May be omitted when the caller overrides it.
    #[serde(default)]
    pub application: Option<String>,

    pub environment: EnvironmentSpec,

    #[serde(default)]
    pub targets: BTreeMap<String, TargetSpec>,

    #[serde(default)]
    pub manifests: Vec<ManifestEntry>,

    #[serde(default)]
    pub strategies: BTreeMap<String, StrategySpec>,

    #[serde(default)]
    pub wait: WaitConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentSpec {
    pub provider: String,
    pub account: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TargetSpec {
    /// Name of an entry in the top-level `strategies` map.
    pub strategy: String,

    #[serde(default)]
    pub constraints: Option<ConstraintSpec>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintSpec {
    /// Targets that must finish before this one may start.
    #[serde(default)]
    pub depends_on: Vec<String>,

    /// Pause steps executed before the deployment to this target begins.
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub before_deployment: Vec<BeforeStep>,
}

/// A pre-deployment constraint step. Only pauses exist today; the enum keeps
/// the YAML shape (`- pause: {...}`) open for more step kinds.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BeforeStep {
    Pause(PauseStep),
}

/// One manifest source: a local file or directory, a remote URL, or a
/// kustomize directory, with an optional list of targets it applies to.
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestEntry {
    #[serde(flatten)]
    pub source: ManifestSource,

    /// Absent: the manifest applies to every target. Present: must name at
    /// least one target (validated at request assembly).
    #[serde(default)]
    pub targets: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ManifestSource {
    Path(PathBuf),
    Url(String),
    Kustomize(String),
}

/// A named strategy as written in the descriptor: a kind plus, for canary,
/// free-text step tokens compiled by the strategy compiler.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategySpec {
    pub kind: String,

    #[serde(default)]
    pub steps: Vec<String>,

    #[serde(default)]
    pub active_service: Option<String>,

    #[serde(default)]
    pub preview_service: Option<String>,
}

/// Waiter tuning. The timeout is mandatory in effect: a zero value is
/// rejected by the waiter rather than polling unboundedly.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaitConfig {
    #[serde(default = "default_wait_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    #[serde(default = "default_poll_interval", with = "humantime_serde")]
    pub interval: Duration,
}

fn default_wait_timeout() -> Duration {
    Duration::from_secs(600)
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(4)
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            timeout: default_wait_timeout(),
            interval: default_poll_interval(),
        }
    }
}

impl DeploymentDescriptor {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(Error::from)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(DESCRIPTOR_FILENAME),
            dir.join(DESCRIPTOR_FILENAME_ALT),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::DescriptorNotFound(dir.to_path_buf()))
    }
}

/// Write a starter descriptor into `dir`, optionally seeding the application
/// name. Refuses to overwrite unless `force` is set.
pub fn init_descriptor(dir: &Path, application: Option<&str>, force: bool) -> Result<()> {
    let path = dir.join(DESCRIPTOR_FILENAME);

    if path.exists() && !force {
        return Err(Error::AlreadyExists(path));
    }

    let yaml = starter_yaml(application.unwrap_or("my-app"));

    // Parse what we are about to write so the scaffold can never go stale.
    DeploymentDescriptor::from_yaml(&yaml)?;

    std::fs::write(&path, yaml)?;
    Ok(())
}

fn starter_yaml(application: &str) -> String {
    format!(
        r#"application: {application}

environment:
  provider: kubernetes
  account: my-cluster
  namespace: default

targets:
  production:
    strategy: rolling

strategies:
  rolling:
    kind: canary
    steps:
      - ratio{{25}}
      - pause
      - ratio{{100}}

manifests:
  - path: manifests/
"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starter_descriptor_parses() {
        let descriptor = DeploymentDescriptor::from_yaml(&starter_yaml("demo")).unwrap();
        assert_eq!(descriptor.application.as_deref(), Some("demo"));
        assert_eq!(descriptor.environment.provider, "kubernetes");
        assert_eq!(descriptor.targets.len(), 1);
        assert!(descriptor.strategies.contains_key("rolling"));
        assert_eq!(descriptor.manifests.len(), 1);
    }

    #[test]
    fn wait_defaults_apply() {
        let descriptor = DeploymentDescriptor::from_yaml(&starter_yaml("demo")).unwrap();
        assert_eq!(descriptor.wait.timeout, Duration::from_secs(600));
        assert_eq!(descriptor.wait.interval, Duration::from_secs(4));
    }
}

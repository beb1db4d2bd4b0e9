// ABOUTME: Assembles a submittable deployment request from descriptor, artifacts, and overrides.
// ABOUTME: Pure data transformation; every failure here is a pre-submission validation error.

use super::error::AssembleError;
use super::model::{Artifact, Constraint, DeploymentRequest, Environment, TargetPlan};
use crate::descriptor::{BeforeStep, ConstraintSpec, DeploymentDescriptor, EnvironmentSpec};
use crate::strategy::{CanaryStep, Strategy, compile_strategy};
use nonempty::NonEmpty;
use std::collections::BTreeMap;

pub const SUPPORTED_PROVIDER: &str = "kubernetes";

/// Caller-supplied overrides, normally from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    /// Wins over the descriptor's application name when present.
    pub application: Option<String>,
    /// Replaces the descriptor's account when present.
    pub account: Option<String>,
}

/// Combine the descriptor, the resolved artifacts, and the overrides into
/// one deployment request.
pub fn assemble(
    descriptor: &DeploymentDescriptor,
    artifacts: Vec<Artifact>,
    overrides: &Overrides,
) -> Result<DeploymentRequest, AssembleError> {
    let environment = resolve_environment(&descriptor.environment, overrides)?;
    let application = resolve_application(descriptor, overrides)?;
    let strategies = compile_strategies(descriptor)?;
    let targets = plan_targets(descriptor, &strategies)?;

    for artifact in &artifacts {
        validate_artifact_targets(artifact, &targets)?;
    }

    let artifacts = NonEmpty::from_vec(artifacts).ok_or(AssembleError::NoArtifacts)?;

    Ok(DeploymentRequest {
        application,
        environment,
        artifacts,
        strategies,
        targets,
    })
}

fn resolve_environment(
    spec: &EnvironmentSpec,
    overrides: &Overrides,
) -> Result<Environment, AssembleError> {
    if spec.provider != SUPPORTED_PROVIDER {
        return Err(AssembleError::UnsupportedProvider(spec.provider.clone()));
    }

    Ok(Environment {
        provider: spec.provider.clone(),
        account: overrides
            .account
            .clone()
            .unwrap_or_else(|| spec.account.clone()),
        namespace: spec.namespace.clone(),
    })
}

/// Precedence: explicit override > descriptor value > error.
/// Empty strings count as absent.
fn resolve_application(
    descriptor: &DeploymentDescriptor,
    overrides: &Overrides,
) -> Result<String, AssembleError> {
    overrides
        .application
        .clone()
        .filter(|name| !name.is_empty())
        .or_else(|| {
            descriptor
                .application
                .clone()
                .filter(|name| !name.is_empty())
        })
        .ok_or(AssembleError::NoApplicationName)
}

fn compile_strategies(
    descriptor: &DeploymentDescriptor,
) -> Result<BTreeMap<String, Strategy>, AssembleError> {
    let mut strategies = BTreeMap::new();

    for (name, spec) in &descriptor.strategies {
        let mut strategy =
            compile_strategy(&spec.kind, &spec.steps).map_err(|source| AssembleError::Strategy {
                name: name.clone(),
                source,
            })?;

        // Descriptor-level service names win over the compiled defaults.
        if let Strategy::BlueGreen {
            active_service,
            preview_service,
        } = &mut strategy
        {
            if let Some(active) = &spec.active_service {
                *active_service = active.clone();
            }
            if let Some(preview) = &spec.preview_service {
                *preview_service = preview.clone();
            }
        }

        strategies.insert(name.clone(), strategy);
    }

    Ok(strategies)
}

fn plan_targets(
    descriptor: &DeploymentDescriptor,
    strategies: &BTreeMap<String, Strategy>,
) -> Result<BTreeMap<String, TargetPlan>, AssembleError> {
    let mut targets = BTreeMap::new();

    for (name, spec) in &descriptor.targets {
        if !strategies.contains_key(&spec.strategy) {
            return Err(AssembleError::UnknownStrategy {
                target: name.clone(),
                strategy: spec.strategy.clone(),
            });
        }

        targets.insert(
            name.clone(),
            TargetPlan {
                strategy: spec.strategy.clone(),
                constraints: spec.constraints.as_ref().map(translate_constraints),
            },
        );
    }

    Ok(targets)
}

fn translate_constraints(spec: &ConstraintSpec) -> Constraint {
    Constraint {
        depends_on: spec.depends_on.clone(),
        before_deployment: spec
            .before_deployment
            .iter()
            .map(|step| match step {
                BeforeStep::Pause(pause) => CanaryStep::Pause(pause.clone()),
            })
            .collect(),
    }
}

/// An explicit empty target list is ambiguous: the caller must either omit
/// `targets` to mean "all targets" or name at least one.
fn validate_artifact_targets(
    artifact: &Artifact,
    targets: &BTreeMap<String, TargetPlan>,
) -> Result<(), AssembleError> {
    let Some(filter) = artifact.targets() else {
        return Ok(());
    };

    if filter.is_empty() {
        return Err(AssembleError::EmptyManifestTargets {
            artifact: artifact.source_label(),
        });
    }

    for target in filter {
        if !targets.contains_key(target) {
            return Err(AssembleError::UnknownManifestTarget {
                artifact: artifact.source_label(),
                target: target.clone(),
            });
        }
    }

    Ok(())
}

// ABOUTME: Validation errors raised while assembling a deployment request.
// ABOUTME: All are client-side and reported before any network call.

use crate::strategy::StrategyError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum AssembleError {
    #[error("unsupported provider: {0} (only kubernetes is supported)")]
    UnsupportedProvider(String),

    #[error("no application name defined: pass an override or set application in the descriptor")]
    NoApplicationName,

    #[error("target {target} references unknown strategy {strategy}")]
    UnknownStrategy { target: String, strategy: String },

    #[error("strategy {name}: {source}")]
    Strategy {
        name: String,
        source: StrategyError,
    },

    #[error("manifest {artifact}: must omit targets or list at least one")]
    EmptyManifestTargets { artifact: String },

    #[error("manifest {artifact}: unknown target {target}")]
    UnknownManifestTarget { artifact: String, target: String },

    #[error("no manifest artifacts resolved: a kubernetes deployment needs at least one manifest")]
    NoArtifacts,

    #[error("an application override cannot be combined with a referenced deployment config")]
    ApplicationOverrideWithReference,
}

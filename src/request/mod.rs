// ABOUTME: Deployment request assembly: wire model plus the assembler.
// ABOUTME: Turns descriptor + resolved artifacts + overrides into one request.

mod assemble;
mod error;
mod model;

pub use assemble::{Overrides, SUPPORTED_PROVIDER, assemble};
pub use error::AssembleError;
pub use model::{
    Artifact, ArtifactSource, ArtifactSpec, Constraint, DeploymentRequest, Environment, TargetPlan,
};

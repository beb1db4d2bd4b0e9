// ABOUTME: Core identifier types shared across the crate.
// ABOUTME: Exposes phantom-typed ids for pipelines and sandbox clusters.

mod id;

pub use id::{Id, PipelineId, PipelineMarker, SandboxId, SandboxMarker};

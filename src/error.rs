// ABOUTME: Application-wide error types for caravel.
// ABOUTME: Maps conflict errors to a dedicated exit code for automation.

use crate::api::{ApiError, PipelineStatus};
use crate::manifest::ManifestError;
use crate::request::AssembleError;
use crate::waiter::WaitError;
use std::path::PathBuf;
use thiserror::Error;

/// Exit code for "blocked by another pipeline", distinct from plain failure
/// so automation can tell the two apart.
pub const EXIT_CODE_BLOCKED: i32 = 3;

#[derive(Debug, Error)]
pub enum Error {
    #[error("file already exists: {0}")]
    AlreadyExists(PathBuf),

    #[error("deployment descriptor not found in {0}")]
    DescriptorNotFound(PathBuf),

    #[error("invalid --image-version value: {0} (expected IMAGE=VERSION)")]
    InvalidImageVersion(String),

    #[error("pipeline finished with status {0}")]
    PipelineFailed(PipelineStatus),

    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Wait(#[from] WaitError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Wait(WaitError::Blocked { .. }) => EXIT_CODE_BLOCKED,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

// ABOUTME: Error types for manifest resolution.
// ABOUTME: Any failure aborts the whole resolution pass; no partial results leak.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to list directory {path}: {source}")]
    ListDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path} is not a recognized manifest file (expected .yaml, .yml, or .json)")]
    UnsupportedExtension { path: PathBuf },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("failed to download {url}: {message}")]
    Download { url: String, message: String },

    #[error("kustomize build failed for {dir}: {stderr}")]
    Kustomize { dir: String, stderr: String },
}

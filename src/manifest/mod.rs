// ABOUTME: Manifest resolution: local files and directories, remote URLs, kustomize.
// ABOUTME: Produces wire artifacts; any source failure fails the whole pass.

mod error;
mod kustomize;
mod resolver;

pub use error::ManifestError;
pub use resolver::{MANIFEST_EXTENSIONS, ManifestResolver};

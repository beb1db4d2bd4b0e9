// ABOUTME: Resolves manifest sources (files, directories, URLs, kustomize) into artifacts.
// ABOUTME: Local resolution stages remote content in a temp dir that is always cleaned up.

use super::error::ManifestError;
use super::kustomize;
use crate::descriptor::{ManifestEntry, ManifestSource};
use crate::request::{Artifact, ArtifactSource, ArtifactSpec};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::debug;

pub const MANIFEST_EXTENSIONS: &[&str] = &["yaml", "yml", "json"];

/// Locates manifest content and turns every source into artifacts.
///
/// With `resolve_locally` set, remote URLs are downloaded and kustomize
/// directories are built on this machine; otherwise both are passed to the
/// backend by reference.
pub struct ManifestResolver {
    resolve_locally: bool,
    versions: BTreeMap<String, String>,
    http: reqwest::Client,
}

impl ManifestResolver {
    pub fn new(resolve_locally: bool, versions: BTreeMap<String, String>) -> Self {
        Self {
            resolve_locally,
            versions,
            http: reqwest::Client::new(),
        }
    }

    /// Resolve every entry, preserving entry order. Any failure aborts the
    /// whole pass; partial results are never returned.
    pub async fn resolve(&self, entries: &[ManifestEntry]) -> Result<Vec<Artifact>, ManifestError> {
        let batches = futures::future::try_join_all(
            entries.iter().map(|entry| self.resolve_entry(entry)),
        )
        .await?;

        Ok(batches.into_iter().flatten().collect())
    }

    async fn resolve_entry(&self, entry: &ManifestEntry) -> Result<Vec<Artifact>, ManifestError> {
        let artifacts = match &entry.source {
            ManifestSource::Path(path) if path.is_dir() => self.resolve_dir(path)?,
            ManifestSource::Path(path) => self.resolve_file(path)?,
            ManifestSource::Url(url) => self.resolve_url(url).await?,
            ManifestSource::Kustomize(source) => self.resolve_kustomize(source).await?,
        };

        Ok(artifacts
            .into_iter()
            .map(|artifact| artifact.with_targets(entry.targets.clone()))
            .collect())
    }

    /// Every file with a recognized extension, in directory-listing order.
    fn resolve_dir(&self, dir: &Path) -> Result<Vec<Artifact>, ManifestError> {
        let entries = std::fs::read_dir(dir).map_err(|source| ManifestError::ListDir {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut artifacts = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| ManifestError::ListDir {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file() && has_manifest_extension(&path) {
                artifacts.extend(self.resolve_file(&path)?);
            }
        }

        Ok(artifacts)
    }

    /// A single JSON document, or a stream of one-or-more YAML documents,
    /// each becoming one inline artifact.
    fn resolve_file(&self, path: &Path) -> Result<Vec<Artifact>, ManifestError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase);

        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let documents = match extension.as_deref() {
            Some("json") => {
                serde_json::from_str::<serde_json::Value>(&content).map_err(|e| {
                    ManifestError::Parse {
                        path: path.to_path_buf(),
                        message: e.to_string(),
                    }
                })?;
                vec![content]
            }
            Some("yaml") | Some("yml") => split_yaml_documents(path, &content)?,
            _ => {
                return Err(ManifestError::UnsupportedExtension {
                    path: path.to_path_buf(),
                });
            }
        };

        Ok(documents
            .into_iter()
            .map(|doc| self.inline_artifact(doc))
            .collect())
    }

    async fn resolve_url(&self, url: &str) -> Result<Vec<Artifact>, ManifestError> {
        if !self.resolve_locally {
            // Resolution is deferred to the backend.
            return Ok(vec![Artifact::Manifests(ArtifactSpec {
                source: ArtifactSource::Url(url.to_string()),
                versions: self.versions_map(),
                targets: None,
            })]);
        }

        debug!("downloading manifest from {url}");
        let body = self.download(url).await?;

        // Staged in a scoped temp dir; removed on every exit path when the
        // guard drops.
        let staging = tempfile::tempdir().map_err(|e| ManifestError::Download {
            url: url.to_string(),
            message: format!("could not create staging directory: {e}"),
        })?;

        let file_name = if url.ends_with(".json") {
            "download.json"
        } else {
            "download.yaml"
        };
        let staged: PathBuf = staging.path().join(file_name);
        std::fs::write(&staged, &body).map_err(|source| ManifestError::Read {
            path: staged.clone(),
            source,
        })?;

        self.resolve_file(&staged)
    }

    async fn download(&self, url: &str) -> Result<String, ManifestError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ManifestError::Download {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ManifestError::Download {
                url: url.to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        response.text().await.map_err(|e| ManifestError::Download {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn resolve_kustomize(&self, source: &str) -> Result<Vec<Artifact>, ManifestError> {
        if !self.resolve_locally {
            return Ok(vec![Artifact::Kustomize(ArtifactSpec {
                source: ArtifactSource::Url(source.to_string()),
                versions: self.versions_map(),
                targets: None,
            })]);
        }

        debug!("building kustomization in {source}");
        let output = Command::new("kustomize")
            .arg("build")
            .arg(source)
            .output()
            .await
            .map_err(|e| ManifestError::Kustomize {
                dir: source.to_string(),
                stderr: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ManifestError::Kustomize {
                dir: source.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            });
        }

        let rendered = String::from_utf8_lossy(&output.stdout);
        kustomize::split_and_patch(Path::new(source), &rendered, &self.versions)
    }

    fn inline_artifact(&self, content: String) -> Artifact {
        Artifact::Manifests(ArtifactSpec {
            source: ArtifactSource::Inline(content),
            versions: self.versions_map(),
            targets: None,
        })
    }

    fn versions_map(&self) -> Option<BTreeMap<String, String>> {
        (!self.versions.is_empty()).then(|| self.versions.clone())
    }
}

fn has_manifest_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            MANIFEST_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Parse a YAML stream, skipping empty documents, and re-render each
/// document as its own blob.
fn split_yaml_documents(path: &Path, content: &str) -> Result<Vec<String>, ManifestError> {
    let mut documents = Vec::new();

    for document in serde_yaml::Deserializer::from_str(content) {
        let value =
            serde_yaml::Value::deserialize(document).map_err(|e| ManifestError::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        if value.is_null() {
            continue;
        }
        let rendered = serde_yaml::to_string(&value).map_err(|e| ManifestError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        documents.push(rendered);
    }

    Ok(documents)
}

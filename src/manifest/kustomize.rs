// ABOUTME: Kustomize build output handling: per-object splitting and image patching.
// ABOUTME: Rewrites image references whose name matches a version override.

use super::error::ManifestError;
use crate::request::{Artifact, ArtifactSource, ArtifactSpec};
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;

/// Split rendered kustomize output into one inline artifact per object,
/// patching per-image version overrides into each.
pub(crate) fn split_and_patch(
    dir: &Path,
    rendered: &str,
    versions: &BTreeMap<String, String>,
) -> Result<Vec<Artifact>, ManifestError> {
    let mut artifacts = Vec::new();

    for document in serde_yaml::Deserializer::from_str(rendered) {
        let mut value = Value::deserialize(document).map_err(|e| ManifestError::Parse {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        if value.is_null() {
            continue;
        }

        patch_image_versions(&mut value, versions);

        let content = serde_yaml::to_string(&value).map_err(|e| ManifestError::Parse {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;

        artifacts.push(Artifact::Manifests(ArtifactSpec {
            source: ArtifactSource::Inline(content),
            versions: None,
            targets: None,
        }));
    }

    Ok(artifacts)
}

/// Walk the object and rewrite every `image:` string whose name part matches
/// an override key.
pub(crate) fn patch_image_versions(value: &mut Value, versions: &BTreeMap<String, String>) {
    if versions.is_empty() {
        return;
    }

    match value {
        Value::Mapping(map) => {
            for (key, item) in map.iter_mut() {
                if key.as_str() == Some("image")
                    && let Some(image) = item.as_str()
                {
                    if let Some(patched) = patch_image(image, versions) {
                        *item = Value::String(patched);
                    }
                    continue;
                }
                patch_image_versions(item, versions);
            }
        }
        Value::Sequence(items) => {
            for item in items {
                patch_image_versions(item, versions);
            }
        }
        _ => {}
    }
}

fn patch_image(image: &str, versions: &BTreeMap<String, String>) -> Option<String> {
    let (name, _) = split_image(image);
    versions
        .get(name)
        .map(|version| format!("{name}:{version}"))
}

/// Split an image reference into name and tag/digest, tolerating registries
/// with ports (the colon before the first slash is not a tag separator).
fn split_image(image: &str) -> (&str, Option<&str>) {
    if let Some((name, digest)) = image.split_once('@') {
        return (name, Some(digest));
    }
    match image.rsplit_once(':') {
        Some((name, tag)) if !tag.contains('/') => (name, Some(tag)),
        _ => (image, None),
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Artifact loading from disk.
//!
//! The artifact is memory-mapped and parsed straight from the mapping, so a
//! large coefficient table is never copied into an intermediate `String`.
//! The sidecar is small and read normally.

use crate::{ArtifactError, ModelArtifact, ModelHandle, SidecarMeta};
use std::path::{Path, PathBuf};

/// An artifact read from disk, ready to serve.
#[derive(Debug, Clone)]
pub struct LoadedArtifact {
    /// The classifier.
    pub handle: ModelHandle,
    /// Sidecar metadata, if a `meta.json` was present.
    pub sidecar: Option<SidecarMeta>,
    /// Path the artifact was read from.
    pub path: PathBuf,
    /// Artifact file size in bytes.
    pub size_bytes: u64,
}

impl LoadedArtifact {
    /// Feature count declared by the sidecar, if any.
    pub fn declared_features(&self) -> Option<usize> {
        self.sidecar.as_ref().and_then(|s| s.n_features)
    }

    /// One-line description for logs and the CLI.
    pub fn summary(&self) -> String {
        format!(
            "Artifact '{}': {} model, {} classes, {} features, proba {}, {} bytes",
            self.path.display(),
            self.handle.kind(),
            self.handle.classes().len(),
            self.handle.n_features(),
            if self.handle.supports_proba() { "yes" } else { "no" },
            self.size_bytes,
        )
    }
}

/// Reads artifacts from the filesystem.
pub struct ArtifactLoader;

impl ArtifactLoader {
    /// Returns `true` if an artifact file exists at `path`.
    pub fn exists(path: &Path) -> bool {
        path.is_file()
    }

    /// Loads and validates the artifact at `path` plus its optional sidecar.
    ///
    /// Steps:
    /// 1. Memory-map the artifact and parse the JSON document.
    /// 2. Build the classifier (validates parameter shapes).
    /// 3. Read `meta.json` if present and check it agrees with the model.
    pub fn load(path: &Path) -> Result<LoadedArtifact, ArtifactError> {
        let file = std::fs::File::open(path)?;
        let size_bytes = file.metadata()?.len();
        if size_bytes == 0 {
            return Err(ArtifactError::Invalid(format!(
                "artifact '{}' is empty",
                path.display()
            )));
        }

        // SAFETY: the mapping is read-only and dropped before returning; the
        // artifact is treated as immutable input while the server runs.
        let mmap = unsafe { memmap2::Mmap::map(&file) }?;
        let artifact = ModelArtifact::from_slice(&mmap)?;
        drop(mmap);

        tracing::debug!(
            "parsed '{}' artifact from '{}' ({} bytes)",
            artifact.kind(),
            path.display(),
            size_bytes,
        );

        let handle = artifact.into_handle()?;
        let sidecar = SidecarMeta::read_optional(path)?;

        if let Some(declared) = sidecar.as_ref().and_then(|s| s.n_features) {
            if declared != handle.n_features() {
                return Err(ArtifactError::Invalid(format!(
                    "sidecar declares {declared} features but the model has {}",
                    handle.n_features()
                )));
            }
        }

        Ok(LoadedArtifact {
            handle,
            sidecar,
            path: path.to_path_buf(),
            size_bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTROID: &str =
        r#"{"kind": "nearest_centroid", "classes": [0, 1], "centroids": [[0.0, 0.0], [1.0, 1.0]]}"#;

    #[test]
    fn test_load_with_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, CENTROID).unwrap();
        std::fs::write(dir.path().join("meta.json"), r#"{"n_features": 2}"#).unwrap();

        let loaded = ArtifactLoader::load(&path).unwrap();
        assert_eq!(loaded.declared_features(), Some(2));
        assert_eq!(loaded.handle.kind(), "nearest_centroid");
        assert_eq!(loaded.size_bytes, CENTROID.len() as u64);
        assert!(loaded.summary().contains("nearest_centroid"));
    }

    #[test]
    fn test_load_without_sidecar() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, CENTROID).unwrap();

        let loaded = ArtifactLoader::load(&path).unwrap();
        assert!(loaded.sidecar.is_none());
        assert_eq!(loaded.declared_features(), None);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");
        assert!(!ArtifactLoader::exists(&path));
        assert!(matches!(ArtifactLoader::load(&path), Err(ArtifactError::Io(_))));
    }

    #[test]
    fn test_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "").unwrap();
        assert!(matches!(ArtifactLoader::load(&path), Err(ArtifactError::Invalid(_))));
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, b"\x80\x04\x95pickle").unwrap();
        assert!(matches!(ArtifactLoader::load(&path), Err(ArtifactError::Parse(_))));
    }

    #[test]
    fn test_sidecar_disagrees_with_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, CENTROID).unwrap();
        std::fs::write(dir.path().join("meta.json"), r#"{"n_features": 4}"#).unwrap();
        assert!(matches!(ArtifactLoader::load(&path), Err(ArtifactError::Invalid(_))));
    }
}

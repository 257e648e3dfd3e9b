// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Optional `meta.json` sidecar written next to the artifact.

use crate::ArtifactError;
use std::path::{Path, PathBuf};

/// Sidecar filename, resolved relative to the artifact's directory.
pub const SIDECAR_FILE: &str = "meta.json";

/// Training-time metadata stored beside the artifact.
///
/// Unknown keys are ignored so the training step can add fields freely.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SidecarMeta {
    /// Number of input features the model was trained on.
    #[serde(default)]
    pub n_features: Option<usize>,
}

impl SidecarMeta {
    /// Path of the sidecar for the given artifact path.
    pub fn path_for(artifact_path: &Path) -> PathBuf {
        artifact_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SIDECAR_FILE)
    }

    /// Parses a sidecar from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads the sidecar for `artifact_path`, if one exists.
    ///
    /// A missing sidecar is not an error. A present but malformed one is.
    pub fn read_optional(artifact_path: &Path) -> Result<Option<Self>, ArtifactError> {
        let path = Self::path_for(artifact_path);
        if !path.exists() {
            tracing::debug!("no sidecar at '{}'", path.display());
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Self::from_json(&content).map(Some)
    }
}

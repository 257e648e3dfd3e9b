// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! JSON artifact document.
//!
//! # Format
//! ```json
//! {
//!   "kind": "linear",
//!   "classes": [0, 1, 2],
//!   "coefficients": [[0.4, 1.3, -2.1, -0.9], ...],
//!   "intercepts": [9.1, 2.0, -11.1]
//! }
//! ```
//! or
//! ```json
//! {
//!   "kind": "nearest_centroid",
//!   "classes": [0, 1],
//!   "centroids": [[5.0, 3.4], [6.6, 2.9]]
//! }
//! ```

use crate::{ArtifactError, LinearClassifier, ModelHandle, NearestCentroid};

/// A serialised classifier, as written by the training step.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    /// Linear model with softmax / sigmoid probabilities.
    Linear {
        classes: Vec<i64>,
        coefficients: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
    },
    /// Euclidean nearest-centroid model, labels only.
    NearestCentroid {
        classes: Vec<i64>,
        centroids: Vec<Vec<f64>>,
    },
}

impl ModelArtifact {
    /// Parses an artifact from raw JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ArtifactError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Parses an artifact from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ArtifactError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialises the artifact to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, ArtifactError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Model kind tag as it appears in the document.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Linear { .. } => "linear",
            Self::NearestCentroid { .. } => "nearest_centroid",
        }
    }

    /// Class labels declared by the artifact.
    pub fn classes(&self) -> &[i64] {
        match self {
            Self::Linear { classes, .. } | Self::NearestCentroid { classes, .. } => classes,
        }
    }

    /// Checks internal consistency and returns the feature count.
    pub fn validate(&self) -> Result<usize, ArtifactError> {
        match self {
            Self::Linear {
                classes,
                coefficients,
                intercepts,
            } => LinearClassifier::validate(classes, coefficients, intercepts),
            Self::NearestCentroid { classes, centroids } => {
                NearestCentroid::validate(classes, centroids)
            }
        }
    }

    /// Builds the capability-typed handle for this artifact.
    pub fn into_handle(self) -> Result<ModelHandle, ArtifactError> {
        match self {
            Self::Linear {
                classes,
                coefficients,
                intercepts,
            } => Ok(ModelHandle::with_proba(LinearClassifier::new(
                classes,
                coefficients,
                intercepts,
            )?)),
            Self::NearestCentroid { classes, centroids } => Ok(ModelHandle::classifier_only(
                NearestCentroid::new(classes, centroids)?,
            )),
        }
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Capability-typed model handle.

use crate::{ArtifactError, Classifier, ProbabilisticClassifier};
use std::sync::Arc;

/// A loaded, immutable classifier.
///
/// The variant records whether the model can emit probabilities. It is
/// decided once, when the artifact is turned into a handle, so the request
/// path never has to probe for the capability.
///
/// Cloning is cheap: both variants share the model through an `Arc`.
#[derive(Debug, Clone)]
pub enum ModelHandle {
    /// Supports `predict` only.
    ClassifierOnly(Arc<dyn Classifier>),
    /// Supports `predict` and `predict_proba`.
    ClassifierWithProba(Arc<dyn ProbabilisticClassifier>),
}

impl ModelHandle {
    /// Wraps a labels-only classifier.
    pub fn classifier_only(model: impl Classifier + 'static) -> Self {
        Self::ClassifierOnly(Arc::new(model))
    }

    /// Wraps a classifier that also reports probabilities.
    pub fn with_proba(model: impl ProbabilisticClassifier + 'static) -> Self {
        Self::ClassifierWithProba(Arc::new(model))
    }

    /// Returns `true` if [`predict_proba`](Self::predict_proba) yields values.
    pub fn supports_proba(&self) -> bool {
        matches!(self, Self::ClassifierWithProba(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::ClassifierOnly(m) => m.kind(),
            Self::ClassifierWithProba(m) => m.kind(),
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Self::ClassifierOnly(m) => m.n_features(),
            Self::ClassifierWithProba(m) => m.n_features(),
        }
    }

    pub fn classes(&self) -> &[i64] {
        match self {
            Self::ClassifierOnly(m) => m.classes(),
            Self::ClassifierWithProba(m) => m.classes(),
        }
    }

    /// Predicts one label per row.
    pub fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<i64>, ArtifactError> {
        match self {
            Self::ClassifierOnly(m) => m.predict(rows),
            Self::ClassifierWithProba(m) => m.predict(rows),
        }
    }

    /// Per-row class probabilities, or `None` for labels-only models.
    pub fn predict_proba(
        &self,
        rows: &[Vec<f64>],
    ) -> Option<Result<Vec<Vec<f64>>, ArtifactError>> {
        match self {
            Self::ClassifierOnly(_) => None,
            Self::ClassifierWithProba(m) => Some(m.predict_proba(rows)),
        }
    }
}

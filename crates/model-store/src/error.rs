// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for artifact loading and classifier evaluation.

/// Errors that can occur when reading an artifact or running a classifier.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// The artifact or sidecar file could not be read.
    #[error("failed to read artifact: {0}")]
    Io(#[from] std::io::Error),

    /// The artifact or sidecar JSON is malformed.
    #[error("failed to parse artifact: {0}")]
    Parse(#[from] serde_json::Error),

    /// The artifact parsed but is internally inconsistent.
    #[error("invalid artifact: {0}")]
    Invalid(String),

    /// A row passed to the classifier has the wrong number of features.
    #[error("row {row} has {got} features, model expects {expected}")]
    FeatureMismatch {
        row: usize,
        expected: usize,
        got: usize,
    },

    /// Evaluating a row overflowed to a non-finite score.
    #[error("row {row} produced a non-finite score")]
    NonFiniteScore { row: usize },
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Error types for the serving runtime.
//!
//! Every failure on the prediction path maps to exactly one status family:
//!
//! | Error | Family |
//! |-------|--------|
//! | [`PredictError::Validation`] | client error (400) |
//! | [`PredictError::ServiceUnavailable`], [`PredictError::NotReady`] | retriable (503) |
//! | [`PredictError::Inference`] | server error (500) |

use std::path::PathBuf;

/// The model artifact could not be loaded.
///
/// `Clone` so that every caller waiting on the same in-flight load receives
/// the same error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot load model from '{}': {reason}", .path.display())]
pub struct LoadError {
    pub reason: String,
    pub path: PathBuf,
}

/// A handle was requested before the model was loaded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("model from '{}' is not loaded", .path.display())]
pub struct NotLoadedError {
    pub path: PathBuf,
}

/// Malformed or mismatched prediction input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A single-row request carried no features.
    #[error("features must not be empty")]
    EmptyFeatures,

    /// A batch request carried no rows.
    #[error("batch must contain at least one item")]
    EmptyBatch,

    /// A batch row carried no features.
    #[error("item {row} has no features")]
    EmptyRow { row: usize },

    /// A feature value is NaN or infinite.
    #[error("feature {index} of item {row} is not a finite number")]
    NonFinite { row: usize, index: usize },

    /// A single-row request has the wrong feature count.
    #[error("expected {expected} features, got {got}")]
    FeatureCount { expected: usize, got: usize },

    /// A batch row has the wrong feature count.
    #[error("expected {expected} features per item, got {got} in item {row}")]
    RowFeatureCount {
        row: usize,
        expected: usize,
        got: usize,
    },

    /// A batch row differs in length from the first row.
    #[error("item {row} has {got} features but item 0 has {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        got: usize,
    },

    /// Finite features whose magnitude overflows the model's scores.
    #[error("features are too large to score")]
    Overflow,

    /// A batch row whose magnitude overflows the model's scores.
    #[error("features of item {row} are too large to score")]
    RowOverflow { row: usize },
}

impl ValidationError {
    /// Offending batch row, when the error concerns one.
    pub fn row(&self) -> Option<usize> {
        match self {
            Self::EmptyRow { row }
            | Self::NonFinite { row, .. }
            | Self::RowFeatureCount { row, .. }
            | Self::RaggedRow { row, .. }
            | Self::RowOverflow { row } => Some(*row),
            Self::EmptyFeatures
            | Self::EmptyBatch
            | Self::FeatureCount { .. }
            | Self::Overflow => None,
        }
    }
}

/// Errors returned by [`PredictionPipeline`](crate::PredictionPipeline).
#[derive(Debug, thiserror::Error)]
pub enum PredictError {
    /// The request is malformed (client fault).
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The model could not be loaded; retry later.
    #[error("model unavailable: {0}")]
    ServiceUnavailable(#[from] LoadError),

    /// The model is not loaded; retry later.
    #[error("model not ready: {0}")]
    NotReady(#[from] NotLoadedError),

    /// The model failed for a reason other than input shape.
    #[error("inference failed: {0}")]
    Inference(#[source] model_store::ArtifactError),
}

impl PredictError {
    /// `true` for errors caused by the request itself.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// `true` for errors that may succeed if retried later.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::ServiceUnavailable(_) | Self::NotReady(_))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration could not be parsed or serialised.
    #[error("TOML error: {0}")]
    Toml(String),

    /// An environment override has an unusable value.
    #[error("invalid value '{value}' for {var}")]
    Env { var: &'static str, value: String },

    /// A setting is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The prediction request pipeline.
//!
//! Single row:
//! 1. Reject empty or non-finite features.
//! 2. `ensure_loaded` (503 on failure).
//! 3. Check the feature count against the sidecar.
//! 4. Time `predict`, plus `predict_proba` when requested and supported.
//! 5. Record the latency.
//!
//! A batch goes through the same steps with one model call, one latency
//! measurement and one recorded sample for the whole batch.

use crate::{ModelRegistry, NotLoadedError, PredictError, ValidationError};
use metrics_window::MetricsWindow;
use model_store::{ArtifactError, ModelHandle};
use std::sync::Arc;
use std::time::Instant;

/// Result of a single-row prediction.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct PredictionResult {
    pub label: i64,
    /// Class probabilities, present only when requested and supported.
    pub probabilities: Option<Vec<f64>>,
    pub latency_ms: f64,
}

/// Result of a batch prediction, one entry per input row.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BatchPrediction {
    pub labels: Vec<i64>,
    pub probabilities: Option<Vec<Vec<f64>>>,
    /// Latency of the whole batch.
    pub latency_ms: f64,
}

/// Runs predictions against the registry's model and records latency.
#[derive(Debug, Clone)]
pub struct PredictionPipeline {
    registry: Arc<ModelRegistry>,
    window: Arc<MetricsWindow>,
}

impl PredictionPipeline {
    pub fn new(registry: Arc<ModelRegistry>, window: Arc<MetricsWindow>) -> Self {
        Self { registry, window }
    }

    /// Predicts the label (and optionally probabilities) for one row.
    pub fn predict_one(
        &self,
        features: &[f64],
        return_proba: bool,
    ) -> Result<PredictionResult, PredictError> {
        if features.is_empty() {
            return Err(ValidationError::EmptyFeatures.into());
        }
        check_finite(0, features)?;

        let (expected, handle) = self.acquire()?;
        if let Some(expected) = expected {
            if features.len() != expected {
                return Err(ValidationError::FeatureCount {
                    expected,
                    got: features.len(),
                }
                .into());
            }
        }

        let rows = [features.to_vec()];
        let start = Instant::now();
        let labels = handle.predict(&rows).map_err(single_row_error)?;
        let probabilities = probabilities(&handle, &rows, return_proba, single_row_error)?
            .and_then(|p| p.into_iter().next());
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        let label = labels.into_iter().next().ok_or_else(|| {
            PredictError::Inference(ArtifactError::Invalid(
                "model returned no label".into(),
            ))
        })?;

        self.window.record(latency_ms);
        tracing::debug!("predicted label {label} in {latency_ms:.3}ms");

        Ok(PredictionResult {
            label,
            probabilities,
            latency_ms,
        })
    }

    /// Predicts labels for every row in one model call.
    ///
    /// All rows must have the same non-zero length, matching the sidecar
    /// count when one is declared. An empty batch is rejected. The first
    /// offending row is named in the error.
    pub fn predict_batch(
        &self,
        rows: &[Vec<f64>],
        return_proba: bool,
    ) -> Result<BatchPrediction, PredictError> {
        let width = validate_batch(rows)?;

        let (expected, handle) = self.acquire()?;
        if let Some(expected) = expected {
            if width != expected {
                return Err(ValidationError::RowFeatureCount {
                    row: 0,
                    expected,
                    got: width,
                }
                .into());
            }
        }

        let start = Instant::now();
        let labels = handle.predict(rows).map_err(model_error)?;
        let probabilities = probabilities(&handle, rows, return_proba, model_error)?;
        let latency_ms = start.elapsed().as_secs_f64() * 1000.0;

        if labels.len() != rows.len() {
            return Err(PredictError::Inference(ArtifactError::Invalid(format!(
                "model returned {} labels for {} rows",
                labels.len(),
                rows.len()
            ))));
        }

        self.window.record(latency_ms);
        tracing::debug!("predicted batch of {} in {latency_ms:.3}ms", rows.len());

        Ok(BatchPrediction {
            labels,
            probabilities,
            latency_ms,
        })
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn window(&self) -> &Arc<MetricsWindow> {
        &self.window
    }

    // ── Private helpers ────────────────────────────────────────

    /// Loads the model if needed; returns the declared feature count and
    /// the handle.
    fn acquire(&self) -> Result<(Option<usize>, ModelHandle), PredictError> {
        let metadata = self.registry.ensure_loaded()?;
        let handle = self.registry.get_handle().map_err(|e: NotLoadedError| {
            tracing::warn!("{e}");
            e
        })?;
        Ok((metadata.expected_feature_count, handle))
    }
}

/// Checks batch structure; returns the common row width.
fn validate_batch(rows: &[Vec<f64>]) -> Result<usize, ValidationError> {
    let first = rows.first().ok_or(ValidationError::EmptyBatch)?;
    let width = first.len();

    for (row, values) in rows.iter().enumerate() {
        if values.is_empty() {
            return Err(ValidationError::EmptyRow { row });
        }
        if values.len() != width {
            return Err(ValidationError::RaggedRow {
                row,
                expected: width,
                got: values.len(),
            });
        }
        check_finite(row, values)?;
    }
    Ok(width)
}

fn check_finite(row: usize, values: &[f64]) -> Result<(), ValidationError> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ValidationError::NonFinite { row, index }),
        None => Ok(()),
    }
}

fn probabilities(
    handle: &ModelHandle,
    rows: &[Vec<f64>],
    requested: bool,
    on_error: fn(ArtifactError) -> PredictError,
) -> Result<Option<Vec<Vec<f64>>>, PredictError> {
    if !requested {
        return Ok(None);
    }
    match handle.predict_proba(rows) {
        Some(result) => result.map(Some).map_err(on_error),
        None => {
            tracing::debug!("'{}' model has no probabilities; omitting", handle.kind());
            Ok(None)
        }
    }
}

/// Shape or magnitude problems found by the model itself are client errors;
/// anything else is an inference failure.
fn model_error(err: ArtifactError) -> PredictError {
    match err {
        ArtifactError::FeatureMismatch { row, expected, got } => {
            ValidationError::RowFeatureCount { row, expected, got }.into()
        }
        ArtifactError::NonFiniteScore { row } => ValidationError::RowOverflow { row }.into(),
        other => {
            tracing::error!("inference failed: {other}");
            PredictError::Inference(other)
        }
    }
}

/// [`model_error`] for a single-row request, where no row is named.
fn single_row_error(err: ArtifactError) -> PredictError {
    match err {
        ArtifactError::FeatureMismatch { expected, got, .. } => {
            ValidationError::FeatureCount { expected, got }.into()
        }
        ArtifactError::NonFiniteScore { .. } => ValidationError::Overflow.into(),
        other => model_error(other),
    }
}

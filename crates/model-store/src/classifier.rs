// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Classifier traits and the two supported model kinds.
//!
//! Every classifier predicts integer labels. Only some can also emit class
//! probabilities; that capability is a separate trait,
//! [`ProbabilisticClassifier`], so it can be resolved at load time instead
//! of probed per request.

use crate::ArtifactError;

/// A trained classifier that maps feature rows to integer labels.
pub trait Classifier: Send + Sync + std::fmt::Debug {
    /// Short model kind name (`"linear"`, `"nearest_centroid"`).
    fn kind(&self) -> &'static str;

    /// Number of features each row must have.
    fn n_features(&self) -> usize;

    /// Class labels, in the order probability vectors are reported.
    fn classes(&self) -> &[i64];

    /// Predicts one label per row.
    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<i64>, ArtifactError>;
}

/// A classifier that can also report per-class probabilities.
pub trait ProbabilisticClassifier: Classifier {
    /// Returns one probability vector per row, aligned with
    /// [`Classifier::classes`]. Each vector sums to 1.0.
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ArtifactError>;
}

/// Checks every row against the model's feature count.
fn check_rows(rows: &[Vec<f64>], n_features: usize) -> Result<(), ArtifactError> {
    for (row, values) in rows.iter().enumerate() {
        if values.len() != n_features {
            return Err(ArtifactError::FeatureMismatch {
                row,
                expected: n_features,
                got: values.len(),
            });
        }
    }
    Ok(())
}

/// Validates a list of class labels: non-empty, no duplicates.
pub(crate) fn validate_classes(classes: &[i64], min: usize) -> Result<(), ArtifactError> {
    if classes.len() < min {
        return Err(ArtifactError::Invalid(format!(
            "expected at least {min} classes, got {}",
            classes.len()
        )));
    }
    let mut seen = std::collections::HashSet::new();
    for c in classes {
        if !seen.insert(c) {
            return Err(ArtifactError::Invalid(format!("duplicate class label {c}")));
        }
    }
    Ok(())
}

/// Validates a rectangular, finite, non-empty matrix and returns its width.
pub(crate) fn validate_matrix(name: &str, rows: &[Vec<f64>]) -> Result<usize, ArtifactError> {
    let width = rows
        .first()
        .map(Vec::len)
        .ok_or_else(|| ArtifactError::Invalid(format!("'{name}' is empty")))?;
    if width == 0 {
        return Err(ArtifactError::Invalid(format!("'{name}' rows have no columns")));
    }
    for (i, row) in rows.iter().enumerate() {
        if row.len() != width {
            return Err(ArtifactError::Invalid(format!(
                "'{name}' row {i} has {} columns, expected {width}",
                row.len()
            )));
        }
        if row.iter().any(|v| !v.is_finite()) {
            return Err(ArtifactError::Invalid(format!(
                "'{name}' row {i} contains a non-finite value"
            )));
        }
    }
    Ok(width)
}

// ── Linear ─────────────────────────────────────────────────────

/// Multinomial (or binary) linear classifier.
///
/// Scores are `coefficients · x + intercepts`. With `k > 2` classes there is
/// one coefficient row per class and probabilities are the softmax of the
/// scores. With two classes a single coefficient row is also accepted; it
/// scores the second class and probabilities come from the logistic sigmoid.
#[derive(Debug, Clone)]
pub struct LinearClassifier {
    classes: Vec<i64>,
    coefficients: Vec<Vec<f64>>,
    intercepts: Vec<f64>,
    n_features: usize,
}

impl LinearClassifier {
    /// Builds a linear classifier, validating the parameter shapes.
    pub fn new(
        classes: Vec<i64>,
        coefficients: Vec<Vec<f64>>,
        intercepts: Vec<f64>,
    ) -> Result<Self, ArtifactError> {
        let n_features = Self::validate(&classes, &coefficients, &intercepts)?;
        Ok(Self {
            classes,
            coefficients,
            intercepts,
            n_features,
        })
    }

    pub(crate) fn validate(
        classes: &[i64],
        coefficients: &[Vec<f64>],
        intercepts: &[f64],
    ) -> Result<usize, ArtifactError> {
        validate_classes(classes, 2)?;
        let width = validate_matrix("coefficients", coefficients)?;

        let binary = classes.len() == 2 && coefficients.len() == 1;
        if !binary && coefficients.len() != classes.len() {
            return Err(ArtifactError::Invalid(format!(
                "{} coefficient rows for {} classes",
                coefficients.len(),
                classes.len()
            )));
        }
        if intercepts.len() != coefficients.len() {
            return Err(ArtifactError::Invalid(format!(
                "{} intercepts for {} coefficient rows",
                intercepts.len(),
                coefficients.len()
            )));
        }
        if intercepts.iter().any(|v| !v.is_finite()) {
            return Err(ArtifactError::Invalid(
                "intercepts contain a non-finite value".into(),
            ));
        }
        Ok(width)
    }

    fn is_binary(&self) -> bool {
        self.coefficients.len() == 1
    }

    /// Scores every row, failing on the first one that overflows.
    fn scores(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ArtifactError> {
        check_rows(rows, self.n_features)?;
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                let scores: Vec<f64> = self
                    .coefficients
                    .iter()
                    .zip(&self.intercepts)
                    .map(|(w, b)| w.iter().zip(row).map(|(w, x)| w * x).sum::<f64>() + b)
                    .collect();
                check_scores(i, scores)
            })
            .collect()
    }
}

impl Classifier for LinearClassifier {
    fn kind(&self) -> &'static str {
        "linear"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<i64>, ArtifactError> {
        Ok(self
            .scores(rows)?
            .into_iter()
            .map(|scores| {
                let idx = if self.is_binary() {
                    usize::from(scores[0] > 0.0)
                } else {
                    argmax(&scores)
                };
                self.classes[idx]
            })
            .collect())
    }
}

impl ProbabilisticClassifier for LinearClassifier {
    fn predict_proba(&self, rows: &[Vec<f64>]) -> Result<Vec<Vec<f64>>, ArtifactError> {
        Ok(self
            .scores(rows)?
            .into_iter()
            .map(|scores| {
                if self.is_binary() {
                    let p = sigmoid(scores[0]);
                    vec![1.0 - p, p]
                } else {
                    softmax(&scores)
                }
            })
            .collect())
    }
}

// ── Nearest centroid ───────────────────────────────────────────

/// Nearest-centroid classifier (Euclidean distance). Labels only.
#[derive(Debug, Clone)]
pub struct NearestCentroid {
    classes: Vec<i64>,
    centroids: Vec<Vec<f64>>,
    n_features: usize,
}

impl NearestCentroid {
    /// Builds a nearest-centroid classifier, one centroid per class.
    pub fn new(classes: Vec<i64>, centroids: Vec<Vec<f64>>) -> Result<Self, ArtifactError> {
        let n_features = Self::validate(&classes, &centroids)?;
        Ok(Self {
            classes,
            centroids,
            n_features,
        })
    }

    pub(crate) fn validate(
        classes: &[i64],
        centroids: &[Vec<f64>],
    ) -> Result<usize, ArtifactError> {
        validate_classes(classes, 1)?;
        let width = validate_matrix("centroids", centroids)?;
        if centroids.len() != classes.len() {
            return Err(ArtifactError::Invalid(format!(
                "{} centroids for {} classes",
                centroids.len(),
                classes.len()
            )));
        }
        Ok(width)
    }
}

impl Classifier for NearestCentroid {
    fn kind(&self) -> &'static str {
        "nearest_centroid"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn predict(&self, rows: &[Vec<f64>]) -> Result<Vec<i64>, ArtifactError> {
        check_rows(rows, self.n_features)?;
        rows.iter()
            .enumerate()
            .map(|(i, row)| {
                let negated: Vec<f64> = self
                    .centroids
                    .iter()
                    .map(|c| -c.iter().zip(row).map(|(c, x)| (c - x) * (c - x)).sum::<f64>())
                    .collect();
                let negated = check_scores(i, negated)?;
                Ok(self.classes[argmax(&negated)])
            })
            .collect()
    }
}

// ── Numeric helpers ────────────────────────────────────────────

/// Finite inputs can still overflow; an infinite score makes argmax and
/// softmax meaningless.
fn check_scores(row: usize, scores: Vec<f64>) -> Result<Vec<f64>, ArtifactError> {
    if scores.iter().all(|s| s.is_finite()) {
        Ok(scores)
    } else {
        Err(ArtifactError::NonFiniteScore { row })
    }
}

/// Index of the largest value; the first one wins on ties.
fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate().skip(1) {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// Numerically stable softmax (max-subtracted).
fn softmax(scores: &[f64]) -> Vec<f64> {
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn three_class() -> LinearClassifier {
        LinearClassifier::new(
            vec![0, 1, 2],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![-1.0, -1.0]],
            vec![0.0, 0.0, 0.0],
        )
        .unwrap()
    }

    #[test]
    fn test_linear_predict_argmax() {
        let m = three_class();
        let labels = m
            .predict(&[vec![3.0, 0.0], vec![0.0, 3.0], vec![-2.0, -2.0]])
            .unwrap();
        assert_eq!(labels, vec![0, 1, 2]);
    }

    #[test]
    fn test_linear_proba_sums_to_one() {
        let m = three_class();
        let proba = m.predict_proba(&[vec![0.3, -1.2], vec![100.0, -50.0]]).unwrap();
        for p in &proba {
            assert_eq!(p.len(), 3);
            assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
            assert!(p.iter().all(|v| (0.0..=1.0).contains(v)));
        }
    }

    #[test]
    fn test_binary_single_row() {
        let m = LinearClassifier::new(vec![7, 9], vec![vec![2.0]], vec![-1.0]).unwrap();
        assert_eq!(m.predict(&[vec![0.0], vec![1.0]]).unwrap(), vec![7, 9]);

        let p = m.predict_proba(&[vec![0.5]]).unwrap();
        // Score is exactly zero: both classes at 0.5.
        assert!((p[0][0] - 0.5).abs() < 1e-12);
        assert!((p[0][1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_linear_rejects_bad_shapes() {
        assert!(LinearClassifier::new(vec![0, 1, 2], vec![vec![1.0]], vec![0.0]).is_err());
        let ragged = vec![vec![1.0], vec![1.0, 2.0]];
        assert!(LinearClassifier::new(vec![0, 1], ragged, vec![0.0, 0.0]).is_err());
        assert!(LinearClassifier::new(vec![0, 1], vec![vec![1.0]], vec![]).is_err());
        assert!(LinearClassifier::new(vec![0, 0], vec![vec![1.0]], vec![0.0]).is_err());
        assert!(LinearClassifier::new(vec![0, 1], vec![vec![f64::NAN]], vec![0.0]).is_err());
    }

    #[test]
    fn test_feature_mismatch_names_row() {
        let m = three_class();
        let err = m.predict(&[vec![1.0, 2.0], vec![1.0]]).unwrap_err();
        match err {
            ArtifactError::FeatureMismatch { row, expected, got } => {
                assert_eq!((row, expected, got), (1, 2, 1));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_nearest_centroid() {
        let m = NearestCentroid::new(vec![10, 20], vec![vec![0.0, 0.0], vec![5.0, 5.0]]).unwrap();
        assert_eq!(m.n_features(), 2);
        assert_eq!(
            m.predict(&[vec![0.5, 0.2], vec![4.0, 6.0]]).unwrap(),
            vec![10, 20]
        );
    }

    #[test]
    fn test_nearest_centroid_tie_picks_first() {
        let m = NearestCentroid::new(vec![1, 2], vec![vec![-1.0], vec![1.0]]).unwrap();
        assert_eq!(m.predict(&[vec![0.0]]).unwrap(), vec![1]);
    }

    #[test]
    fn test_overflowing_scores_rejected() {
        let m = three_class();
        let rows = [vec![1.0, 1.0], vec![1e308, 1e308]];
        assert!(matches!(
            m.predict(&rows),
            Err(ArtifactError::NonFiniteScore { row: 1 })
        ));
        assert!(matches!(
            m.predict_proba(&rows),
            Err(ArtifactError::NonFiniteScore { row: 1 })
        ));

        let binary = LinearClassifier::new(vec![0, 1], vec![vec![10.0]], vec![0.0]).unwrap();
        assert!(binary.predict_proba(&[vec![f64::MAX]]).is_err());

        let nc = NearestCentroid::new(vec![0, 1], vec![vec![0.0], vec![1.0]]).unwrap();
        assert!(matches!(
            nc.predict(&[vec![1e200]]),
            Err(ArtifactError::NonFiniteScore { row: 0 })
        ));
    }

    #[test]
    fn test_softmax_stability() {
        let p = softmax(&[1000.0, 1000.0]);
        assert!((p[0] - 0.5).abs() < 1e-12);
        assert!(p.iter().all(|v| v.is_finite()));
    }
}

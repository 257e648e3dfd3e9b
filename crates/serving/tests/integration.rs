// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Integration tests: artifact on disk → registry → pipeline → reports.
//!
//! These exercise the three crates together, including the single-flight
//! load under real thread parallelism.

use model_store::{ArtifactError, LoadedArtifact, ModelArtifact};
use serving::{
    ArtifactSource, FileArtifactSource, ModelRegistry, PredictError, RegistryState,
    ServingConfig, ServingContext, ValidationError,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;

// ── Helpers ────────────────────────────────────────────────────

/// A four-feature, three-class linear model shaped like an iris classifier.
fn iris_artifact() -> ModelArtifact {
    ModelArtifact::Linear {
        classes: vec![0, 1, 2],
        coefficients: vec![
            vec![0.42, 1.37, -2.15, -0.95],
            vec![0.53, -0.32, -0.21, -0.94],
            vec![-0.95, -1.05, 2.36, 1.89],
        ],
        intercepts: vec![9.1, 2.0, -11.1],
    }
}

fn write_artifact(dir: &Path, artifact: &ModelArtifact, n_features: Option<usize>) -> PathBuf {
    let path = dir.join("model.json");
    std::fs::write(&path, artifact.to_json_pretty().unwrap()).unwrap();
    if let Some(n) = n_features {
        std::fs::write(dir.join("meta.json"), format!("{{\"n_features\": {n}}}")).unwrap();
    }
    path
}

fn context_for(path: PathBuf) -> ServingContext {
    ServingContext::from_config(&ServingConfig {
        artifact_path: path,
        window_capacity: 100,
        ..Default::default()
    })
    .unwrap()
}

/// File source that counts reads and sleeps to widen the race window.
struct SlowCountingSource {
    inner: FileArtifactSource,
    reads: Arc<AtomicUsize>,
    delay: Duration,
}

impl ArtifactSource for SlowCountingSource {
    fn path(&self) -> &Path {
        self.inner.path()
    }

    fn is_present(&self) -> bool {
        self.inner.is_present()
    }

    fn load(&self) -> Result<LoadedArtifact, ArtifactError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.inner.load()
    }
}

// ── Pipeline over a file artifact ──────────────────────────────

#[test]
fn test_predict_one_valid_rows() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context_for(write_artifact(dir.path(), &iris_artifact(), Some(4)));

    let rows = [
        [5.1, 3.5, 1.4, 0.2],
        [6.0, 2.7, 5.1, 1.6],
        [6.9, 3.1, 5.4, 2.1],
    ];
    for row in &rows {
        let r = ctx.pipeline().predict_one(row, true).unwrap();
        assert!((0..=2).contains(&r.label));
        assert!(r.latency_ms >= 0.0);
        let p = r.probabilities.unwrap();
        assert!((p.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
    // The setosa-like row lands in class 0.
    assert_eq!(ctx.pipeline().predict_one(&rows[0], false).unwrap().label, 0);
    assert_eq!(ctx.window().count(), 4);
}

#[test]
fn test_feature_count_mismatch_is_validation() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context_for(write_artifact(dir.path(), &iris_artifact(), Some(4)));

    let err = ctx.pipeline().predict_one(&[1.0, 2.0, 3.0], false).unwrap_err();
    assert!(matches!(
        err,
        PredictError::Validation(ValidationError::FeatureCount { expected: 4, got: 3 })
    ));
    assert!(err.to_string().contains("expected 4 features, got 3"));
}

#[test]
fn test_batch_two_rows_one_sample() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context_for(write_artifact(dir.path(), &iris_artifact(), Some(4)));

    let before = ctx.window().count();
    let batch = ctx
        .pipeline()
        .predict_batch(&[vec![0.0, 1.0, 0.0, 1.0], vec![1.0, 0.0, 1.0, 0.0]], false)
        .unwrap();
    assert_eq!(batch.labels.len(), 2);
    assert!(batch.probabilities.is_none());
    assert!(batch.latency_ms >= 0.0);
    assert_eq!(ctx.window().count(), before + 1);
}

#[test]
fn test_batch_inconsistent_rows_names_row() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context_for(write_artifact(dir.path(), &iris_artifact(), None));

    let err = ctx
        .pipeline()
        .predict_batch(&[vec![0.0, 1.0], vec![0.0, 1.0, 2.0]], false)
        .unwrap_err();
    match err {
        PredictError::Validation(v) => assert_eq!(v.row(), Some(1)),
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn test_nearest_centroid_artifact_has_no_proba() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = ModelArtifact::NearestCentroid {
        classes: vec![0, 1],
        centroids: vec![vec![0.0, 0.0], vec![10.0, 10.0]],
    };
    let ctx = context_for(write_artifact(dir.path(), &artifact, Some(2)));

    let batch = ctx
        .pipeline()
        .predict_batch(&[vec![1.0, 1.0], vec![9.0, 9.5]], true)
        .unwrap();
    assert_eq!(batch.labels, vec![0, 1]);
    assert!(batch.probabilities.is_none());
}

// ── Lifecycle ──────────────────────────────────────────────────

#[test]
fn test_artifact_appearing_later_is_picked_up() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    let ctx = context_for(path);

    assert!(!ctx.warm_up());
    let health = ctx.health().health();
    assert!(!health.ready);
    assert!(!health.loaded);

    let err = ctx.pipeline().predict_one(&[1.0, 2.0, 3.0, 4.0], false).unwrap_err();
    assert!(err.is_retriable());
    assert_eq!(ctx.registry().state(), RegistryState::Failed);

    // The training step finishes.
    write_artifact(dir.path(), &iris_artifact(), Some(4));
    assert!(ctx.health().health().ready);

    let r = ctx.pipeline().predict_one(&[5.1, 3.5, 1.4, 0.2], false).unwrap();
    assert_eq!(r.label, 0);
    assert!(ctx.health().health().loaded);
    assert_eq!(ctx.registry().load_attempts(), 3);
}

#[test]
fn test_corrupt_artifact_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.json");
    std::fs::write(&path, "{\"kind\": \"linear\", \"classes\": [0]").unwrap();
    let ctx = context_for(path.clone());

    match ctx.pipeline().predict_one(&[1.0], false) {
        Err(PredictError::ServiceUnavailable(e)) => assert_eq!(e.path, path),
        other => panic!("expected ServiceUnavailable, got {other:?}"),
    }
    // Present but unloadable: ready reflects presence only.
    let health = ctx.health().health();
    assert!(health.ready);
    assert!(!health.loaded);
}

// ── Single-flight ──────────────────────────────────────────────

#[test]
fn test_concurrent_ensure_loaded_loads_once() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_artifact(dir.path(), &iris_artifact(), Some(4));
    let reads = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(ModelRegistry::with_source(SlowCountingSource {
        inner: FileArtifactSource::new(path),
        reads: Arc::clone(&reads),
        delay: Duration::from_millis(50),
    }));

    let callers = 50;
    let barrier = Barrier::new(callers);
    let results: Vec<_> = std::thread::scope(|s| {
        let (barrier, registry) = (&barrier, &registry);
        let handles: Vec<_> = (0..callers)
            .map(|_| {
                s.spawn(move || {
                    barrier.wait();
                    registry.ensure_loaded()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(reads.load(Ordering::SeqCst), 1, "artifact read more than once");
    assert_eq!(registry.load_attempts(), 1);

    let first = results[0].as_ref().unwrap().clone();
    for r in &results {
        assert_eq!(r.as_ref().unwrap(), &first);
    }
    assert_eq!(first.expected_feature_count, Some(4));
}

#[test]
fn test_concurrent_waiters_share_failure() {
    let dir = tempfile::tempdir().unwrap();
    let reads = Arc::new(AtomicUsize::new(0));
    let registry = Arc::new(ModelRegistry::with_source(SlowCountingSource {
        inner: FileArtifactSource::new(dir.path().join("model.json")),
        reads: Arc::clone(&reads),
        delay: Duration::from_millis(100),
    }));

    let started = AtomicBool::new(false);
    let results: Vec<_> = std::thread::scope(|s| {
        let leader = s.spawn(|| {
            started.store(true, Ordering::SeqCst);
            registry.ensure_loaded()
        });
        while !started.load(Ordering::SeqCst) {
            std::thread::yield_now();
        }
        // Give the leader time to enter the load.
        std::thread::sleep(Duration::from_millis(20));

        let registry = &registry;
        let followers: Vec<_> = (0..8)
            .map(|_| s.spawn(move || registry.ensure_loaded()))
            .collect();
        let mut all = vec![leader.join().unwrap()];
        all.extend(followers.into_iter().map(|h| h.join().unwrap()));
        all
    });

    assert_eq!(reads.load(Ordering::SeqCst), 1);
    let first = results[0].clone().unwrap_err();
    for r in results {
        assert_eq!(r.unwrap_err(), first);
    }
}

#[test]
fn test_concurrent_predictions_record_every_request() {
    let dir = tempfile::tempdir().unwrap();
    let ctx = context_for(write_artifact(dir.path(), &iris_artifact(), Some(4)));

    std::thread::scope(|s| {
        for t in 0..8 {
            let ctx = ctx.clone();
            s.spawn(move || {
                for i in 0..25 {
                    let x = (t * 25 + i) as f64 / 100.0;
                    ctx.pipeline().predict_one(&[x, 3.0, 1.5, 0.3], false).unwrap();
                }
            });
        }
    });

    assert_eq!(ctx.registry().load_attempts(), 1);
    assert_eq!(ctx.window().total_recorded(), 200);
    // Capacity 100: only the most recent samples remain.
    assert_eq!(ctx.window().count(), 100);
    let report = ctx.health().metrics();
    assert_eq!(report.requests, 200);
    assert_eq!(report.window, 100);
    assert!(report.latency_ms_p95 >= report.latency_ms_p50);
}

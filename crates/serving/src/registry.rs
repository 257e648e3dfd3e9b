// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Model registry with single-flight loading.
//!
//! ```text
//!            ensure_loaded()
//! Unloaded ──────────────────► Loading ──ok──► Loaded
//!    ▲                            │
//!    │                            └──err─► Failed ──ensure_loaded()──► Loading
//! ```
//!
//! The load transition runs at most once at a time. Callers that arrive
//! while a load is in flight block on a condition variable and observe that
//! load's outcome. A failed load is not sticky: the next call tries again.
//!
//! Once loaded, the model is published through a [`OnceLock`], so the
//! read path (`ensure_loaded`, `get_handle`, `metadata`) takes no lock.

use crate::{LoadError, NotLoadedError};
use model_store::{ArtifactError, ArtifactLoader, LoadedArtifact, ModelHandle};
use parking_lot::{Condvar, Mutex};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

// ── Artifact sources ───────────────────────────────────────────

/// Where the registry reads its artifact from.
pub trait ArtifactSource: Send + Sync {
    /// Path reported in metadata and errors.
    fn path(&self) -> &Path;

    /// Whether an artifact is currently available to load.
    fn is_present(&self) -> bool;

    /// Reads and builds the artifact.
    fn load(&self) -> Result<LoadedArtifact, ArtifactError>;
}

/// Reads the artifact from the filesystem via [`ArtifactLoader`].
#[derive(Debug, Clone)]
pub struct FileArtifactSource {
    path: PathBuf,
}

impl FileArtifactSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ArtifactSource for FileArtifactSource {
    fn path(&self) -> &Path {
        &self.path
    }

    fn is_present(&self) -> bool {
        ArtifactLoader::exists(&self.path)
    }

    fn load(&self) -> Result<LoadedArtifact, ArtifactError> {
        ArtifactLoader::load(&self.path)
    }
}

/// Serves an already-built model; used for embedding and tests.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    artifact: LoadedArtifact,
}

impl InMemorySource {
    /// Wraps `handle`, optionally declaring the expected feature count.
    pub fn new(handle: ModelHandle, n_features: Option<usize>) -> Self {
        Self {
            artifact: LoadedArtifact {
                handle,
                sidecar: n_features.map(|n| model_store::SidecarMeta {
                    n_features: Some(n),
                }),
                path: PathBuf::from("<in-memory>"),
                size_bytes: 0,
            },
        }
    }
}

impl ArtifactSource for InMemorySource {
    fn path(&self) -> &Path {
        &self.artifact.path
    }

    fn is_present(&self) -> bool {
        true
    }

    fn load(&self) -> Result<LoadedArtifact, ArtifactError> {
        Ok(self.artifact.clone())
    }
}

// ── Metadata and state ─────────────────────────────────────────

/// Facts about the loaded model. Immutable once published.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ModelMetadata {
    /// Feature count declared by the sidecar, if any.
    pub expected_feature_count: Option<usize>,
    /// Unix timestamp in milliseconds when the load completed.
    pub loaded_at_ms: u64,
    /// Artifact path the model was read from.
    pub source_path: PathBuf,
    /// Model kind (`"linear"`, `"nearest_centroid"`).
    pub kind: String,
    /// Number of classes the model predicts.
    pub num_classes: usize,
    /// Whether probabilities are available.
    pub supports_proba: bool,
}

/// Externally visible registry state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryState {
    Unloaded,
    Loading,
    Loaded,
    Failed,
}

enum LoadState {
    Unloaded,
    Loading,
    Loaded,
    Failed(LoadError),
}

struct LoadCell {
    state: LoadState,
    /// Incremented every time a load starts; lets waiters tell their load
    /// apart from a later retry.
    attempt: u64,
}

struct LoadedModel {
    handle: ModelHandle,
    metadata: ModelMetadata,
}

// ── Registry ───────────────────────────────────────────────────

/// Owns the model handle and its metadata.
///
/// # Example
/// ```no_run
/// use serving::ModelRegistry;
///
/// let registry = ModelRegistry::new("models/model.json");
/// let meta = registry.ensure_loaded()?;
/// println!("serving a {} model", meta.kind);
/// let handle = registry.get_handle()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct ModelRegistry {
    source: Box<dyn ArtifactSource>,
    loaded: OnceLock<LoadedModel>,
    cell: Mutex<LoadCell>,
    load_finished: Condvar,
    load_attempts: AtomicUsize,
}

impl ModelRegistry {
    /// Creates a registry reading the artifact at `artifact_path`.
    pub fn new(artifact_path: impl Into<PathBuf>) -> Self {
        Self::with_source(FileArtifactSource::new(artifact_path))
    }

    /// Creates a registry over an arbitrary artifact source.
    pub fn with_source(source: impl ArtifactSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            loaded: OnceLock::new(),
            cell: Mutex::new(LoadCell {
                state: LoadState::Unloaded,
                attempt: 0,
            }),
            load_finished: Condvar::new(),
            load_attempts: AtomicUsize::new(0),
        }
    }

    /// Creates a registry serving an in-memory model.
    pub fn from_handle(handle: ModelHandle, n_features: Option<usize>) -> Self {
        Self::with_source(InMemorySource::new(handle, n_features))
    }

    /// Loads the model if needed and returns its metadata.
    ///
    /// Idempotent. Once loaded, returns the cached metadata without I/O or
    /// locking. Concurrent callers share one underlying load.
    pub fn ensure_loaded(&self) -> Result<ModelMetadata, LoadError> {
        if let Some(model) = self.loaded.get() {
            return Ok(model.metadata.clone());
        }

        let mut cell = self.cell.lock();
        loop {
            if let Some(model) = self.loaded.get() {
                return Ok(model.metadata.clone());
            }
            if !matches!(cell.state, LoadState::Loading) {
                break;
            }

            let attempt = cell.attempt;
            while cell.attempt == attempt && matches!(cell.state, LoadState::Loading) {
                self.load_finished.wait(&mut cell);
            }
            if cell.attempt == attempt {
                if let LoadState::Failed(err) = &cell.state {
                    return Err(err.clone());
                }
            }
            // Loaded (checked at the top of the loop) or a newer attempt began.
        }

        cell.state = LoadState::Loading;
        cell.attempt += 1;
        drop(cell);

        let mut guard = LoadingGuard {
            registry: self,
            armed: true,
        };
        let outcome = self.load_once();
        guard.armed = false;

        let mut cell = self.cell.lock();
        let result = match outcome {
            Ok(model) => {
                let metadata = model.metadata.clone();
                // Only the caller that moved the state to Loading gets here,
                // so the lock is empty.
                let _ = self.loaded.set(model);
                cell.state = LoadState::Loaded;
                Ok(metadata)
            }
            Err(err) => {
                cell.state = LoadState::Failed(err.clone());
                Err(err)
            }
        };
        drop(cell);
        self.load_finished.notify_all();
        result
    }

    /// Returns the model handle, failing if the model is not loaded.
    pub fn get_handle(&self) -> Result<ModelHandle, NotLoadedError> {
        self.loaded
            .get()
            .map(|model| model.handle.clone())
            .ok_or_else(|| NotLoadedError {
                path: self.source.path().to_path_buf(),
            })
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// Metadata of the loaded model, if any.
    pub fn metadata(&self) -> Option<ModelMetadata> {
        self.loaded.get().map(|model| model.metadata.clone())
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RegistryState {
        if self.is_loaded() {
            return RegistryState::Loaded;
        }
        match self.cell.lock().state {
            LoadState::Unloaded => RegistryState::Unloaded,
            LoadState::Loading => RegistryState::Loading,
            LoadState::Loaded => RegistryState::Loaded,
            LoadState::Failed(_) => RegistryState::Failed,
        }
    }

    /// The most recent load failure, if the registry is in the failed state.
    pub fn last_error(&self) -> Option<LoadError> {
        match &self.cell.lock().state {
            LoadState::Failed(err) => Some(err.clone()),
            _ => None,
        }
    }

    pub fn artifact_path(&self) -> &Path {
        self.source.path()
    }

    /// Whether the artifact is available to load right now.
    pub fn artifact_present(&self) -> bool {
        self.source.is_present()
    }

    /// Number of times the artifact has actually been read.
    pub fn load_attempts(&self) -> usize {
        self.load_attempts.load(Ordering::SeqCst)
    }

    // ── Private helpers ────────────────────────────────────────

    fn load_once(&self) -> Result<LoadedModel, LoadError> {
        self.load_attempts.fetch_add(1, Ordering::SeqCst);
        let path = self.source.path().to_path_buf();
        let start = Instant::now();

        let artifact = self.source.load().map_err(|e| {
            let err = LoadError {
                reason: e.to_string(),
                path: path.clone(),
            };
            tracing::warn!("model load failed: {err}");
            err
        })?;

        let metadata = ModelMetadata {
            expected_feature_count: artifact.declared_features(),
            loaded_at_ms: now_ms(),
            source_path: artifact.path.clone(),
            kind: artifact.handle.kind().to_string(),
            num_classes: artifact.handle.classes().len(),
            supports_proba: artifact.handle.supports_proba(),
        };

        tracing::info!(
            "model loaded in {:.2}ms: {}",
            start.elapsed().as_secs_f64() * 1000.0,
            artifact.summary(),
        );

        Ok(LoadedModel {
            handle: artifact.handle,
            metadata,
        })
    }
}

impl std::fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("artifact_path", &self.artifact_path())
            .field("state", &self.state())
            .field("load_attempts", &self.load_attempts())
            .finish()
    }
}

/// Moves the registry to `Failed` if the loading caller unwinds, so waiters
/// are never left blocked on a load that will not finish.
struct LoadingGuard<'a> {
    registry: &'a ModelRegistry,
    armed: bool,
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut cell = self.registry.cell.lock();
        cell.state = LoadState::Failed(LoadError {
            reason: "load panicked".into(),
            path: self.registry.artifact_path().to_path_buf(),
        });
        drop(cell);
        self.registry.load_finished.notify_all();
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

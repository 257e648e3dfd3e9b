// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # model-store
//!
//! On-disk classifier artifacts and the in-memory handles the serving
//! runtime predicts with.
//!
//! - [`ModelArtifact`]: the JSON artifact document, tagged by `kind`.
//! - [`Classifier`] / [`ProbabilisticClassifier`]: the prediction traits.
//! - [`LinearClassifier`], [`NearestCentroid`]: the supported model kinds.
//! - [`ModelHandle`]: a cheaply clonable handle whose variant records,
//!   once and for all at load time, whether the model can emit class
//!   probabilities.
//! - [`SidecarMeta`]: the optional `meta.json` next to the artifact.
//! - [`ArtifactLoader`]: reads artifact + sidecar from disk.
//!
//! # Artifact Layout
//! ```text
//! models/
//! ├── model.json   # {"kind": "linear", "classes": [...], ...}
//! └── meta.json    # {"n_features": 4}   (optional)
//! ```
//!
//! # Example
//! ```no_run
//! use model_store::ArtifactLoader;
//! use std::path::Path;
//!
//! let loaded = ArtifactLoader::load(Path::new("models/model.json")).unwrap();
//! let labels = loaded.handle.predict(&[vec![5.1, 3.5, 1.4, 0.2]]).unwrap();
//! println!("{} -> {:?}", loaded.summary(), labels);
//! ```

mod artifact;
mod classifier;
mod error;
mod handle;
mod loader;
mod sidecar;

pub use artifact::ModelArtifact;
pub use classifier::{Classifier, LinearClassifier, NearestCentroid, ProbabilisticClassifier};
pub use error::ArtifactError;
pub use handle::ModelHandle;
pub use loader::{ArtifactLoader, LoadedArtifact};
pub use sidecar::{SidecarMeta, SIDECAR_FILE};

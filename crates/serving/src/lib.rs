// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # serving
//!
//! The serving runtime: everything between a typed prediction request and
//! a typed response, independent of any HTTP framework.
//!
//! - [`ModelRegistry`]: owns the model handle. Loads lazily (or eagerly via
//!   [`ServingContext::warm_up`]), at most once under concurrent callers,
//!   and retries failed loads on the next access.
//! - [`PredictionPipeline`]: validates input, invokes the model for one row
//!   or a whole batch, times the call and records it.
//! - [`HealthReporter`]: liveness/readiness, version and latency reports.
//! - [`ServingContext`]: the injectable bundle handed to request handlers.
//!
//! # Request Flow
//! ```text
//! request ─► PredictionPipeline ─► ModelRegistry::ensure_loaded
//!                 │                        (single-flight load)
//!                 ├─► validate shape
//!                 ├─► ModelHandle::predict / predict_proba
//!                 └─► MetricsWindow::record ─► response
//! ```
//!
//! # Example
//! ```no_run
//! use serving::{ServingConfig, ServingContext};
//!
//! let ctx = ServingContext::from_config(&ServingConfig::default()).unwrap();
//! ctx.warm_up();
//! let result = ctx.pipeline().predict_one(&[5.1, 3.5, 1.4, 0.2], true).unwrap();
//! println!("label {} in {:.3}ms", result.label, result.latency_ms);
//! ```

mod config;
mod context;
mod error;
mod health;
mod pipeline;
mod registry;

pub use config::ServingConfig;
pub use context::ServingContext;
pub use error::{ConfigError, LoadError, NotLoadedError, PredictError, ValidationError};
pub use health::{HealthReporter, HealthStatus, MetricsReport, VersionInfo};
pub use pipeline::{BatchPrediction, PredictionPipeline, PredictionResult};
pub use registry::{
    ArtifactSource, FileArtifactSource, InMemorySource, ModelMetadata, ModelRegistry,
    RegistryState,
};

/// Version reported by `/health`, `/version` and `/metrics`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The injectable bundle of serving state.

use crate::{
    ConfigError, HealthReporter, ModelRegistry, PredictionPipeline, ServingConfig, VERSION,
};
use metrics_window::MetricsWindow;
use std::sync::Arc;

/// Registry, latency window, pipeline and health reporter for one process.
///
/// Handlers receive a clone of the context instead of reaching for globals.
/// Cloning only bumps reference counts; every clone shares the same model
/// and the same window.
#[derive(Debug, Clone)]
pub struct ServingContext {
    registry: Arc<ModelRegistry>,
    window: Arc<MetricsWindow>,
    pipeline: PredictionPipeline,
    health: HealthReporter,
}

impl ServingContext {
    /// Assembles a context from existing parts.
    pub fn new(
        registry: Arc<ModelRegistry>,
        window: Arc<MetricsWindow>,
        version: impl Into<String>,
    ) -> Self {
        let pipeline = PredictionPipeline::new(Arc::clone(&registry), Arc::clone(&window));
        let health = HealthReporter::new(Arc::clone(&registry), Arc::clone(&window), version);
        Self {
            registry,
            window,
            pipeline,
            health,
        }
    }

    /// Builds a file-backed context from configuration.
    ///
    /// Does not load the model; call [`warm_up`](Self::warm_up) for eager
    /// loading.
    pub fn from_config(config: &ServingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        tracing::info!(
            "serving context: artifact '{}', window {}",
            config.artifact_path.display(),
            config.window_capacity,
        );
        Ok(Self::new(
            Arc::new(ModelRegistry::new(config.artifact_path.clone())),
            Arc::new(MetricsWindow::new(config.window_capacity)),
            VERSION,
        ))
    }

    /// Loads the model now. Returns whether it is loaded.
    ///
    /// A failure is logged, not returned: the server still starts and the
    /// next request retries, so an artifact produced later is picked up
    /// without a restart.
    pub fn warm_up(&self) -> bool {
        match self.registry.ensure_loaded() {
            Ok(meta) => {
                tracing::info!(
                    "model ready: {} ({} classes, {} features)",
                    meta.kind,
                    meta.num_classes,
                    meta.expected_feature_count
                        .map(|n| n.to_string())
                        .unwrap_or_else(|| "unchecked".into()),
                );
                true
            }
            Err(e) => {
                tracing::warn!("eager load failed, will retry on first request: {e}");
                false
            }
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn window(&self) -> &Arc<MetricsWindow> {
        &self.window
    }

    pub fn pipeline(&self) -> &PredictionPipeline {
        &self.pipeline
    }

    pub fn health(&self) -> &HealthReporter {
        &self.health
    }
}

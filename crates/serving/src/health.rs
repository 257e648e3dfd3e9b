// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Read-only health, version and latency reports.
//!
//! Nothing here mutates the registry or the window, and nothing triggers a
//! model load.

use crate::ModelRegistry;
use metrics_window::MetricsWindow;
use std::sync::Arc;

/// Liveness/readiness payload for `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct HealthStatus {
    /// The model can be served if asked (artifact present or already loaded).
    pub ready: bool,
    /// The model is loaded in memory.
    pub loaded: bool,
    pub version: String,
}

/// Payload for `GET /version`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct VersionInfo {
    pub version: String,
}

/// Payload for `GET /metrics`. Latencies are rounded to 3 decimals.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct MetricsReport {
    /// Requests recorded since startup.
    pub requests: u64,
    pub latency_ms_p50: f64,
    pub latency_ms_p95: f64,
    /// Samples currently in the rolling window.
    pub window: usize,
    pub version: String,
}

/// Derives health and metrics reports from shared serving state.
#[derive(Debug, Clone)]
pub struct HealthReporter {
    registry: Arc<ModelRegistry>,
    window: Arc<MetricsWindow>,
    version: String,
}

impl HealthReporter {
    pub fn new(
        registry: Arc<ModelRegistry>,
        window: Arc<MetricsWindow>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            window,
            version: version.into(),
        }
    }

    pub fn health(&self) -> HealthStatus {
        let loaded = self.registry.is_loaded();
        HealthStatus {
            ready: loaded || self.registry.artifact_present(),
            loaded,
            version: self.version.clone(),
        }
    }

    pub fn version(&self) -> VersionInfo {
        VersionInfo {
            version: self.version.clone(),
        }
    }

    pub fn metrics(&self) -> MetricsReport {
        let summary = self.window.summary();
        MetricsReport {
            requests: summary.requests,
            latency_ms_p50: round3(summary.p50_ms),
            latency_ms_p95: round3(summary.p95_ms),
            window: summary.window,
            version: self.version.clone(),
        }
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

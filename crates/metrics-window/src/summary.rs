// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Aggregated latency statistics.

/// Latency statistics derived from one window snapshot.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct LatencySummary {
    /// Samples accepted since the window was created.
    pub requests: u64,
    /// Samples currently in the window.
    pub window: usize,
    /// Window capacity.
    pub capacity: usize,
    /// Median latency in milliseconds.
    pub p50_ms: f64,
    /// 95th percentile latency in milliseconds.
    pub p95_ms: f64,
    /// 99th percentile latency in milliseconds.
    pub p99_ms: f64,
}

impl LatencySummary {
    /// Returns a human-readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Latency: p50 {:.3}ms, p95 {:.3}ms, p99 {:.3}ms over {}/{} samples ({} requests)",
            self.p50_ms, self.p95_ms, self.p99_ms, self.window, self.capacity, self.requests,
        )
    }
}

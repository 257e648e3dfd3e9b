// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! The rolling latency window.

use crate::quantile::nearest_rank_sorted;
use crate::LatencySummary;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

/// Default number of samples kept.
pub const DEFAULT_CAPACITY: usize = 2000;

/// Fixed-capacity FIFO of latency samples in milliseconds.
///
/// Invariant: `count() <= capacity()`. The count grows by one per accepted
/// sample until the capacity is reached and stays constant afterwards.
pub struct MetricsWindow {
    capacity: usize,
    samples: Mutex<VecDeque<f64>>,
    /// Accepted samples since creation, including evicted ones.
    total_recorded: AtomicU64,
}

impl MetricsWindow {
    /// Creates an empty window. A capacity of `0` is raised to `1`.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: Mutex::new(VecDeque::with_capacity(capacity)),
            total_recorded: AtomicU64::new(0),
        }
    }

    /// Appends a sample, evicting the oldest one first when full.
    ///
    /// Negative samples are clamped to `0.0`. Non-finite samples are
    /// dropped.
    pub fn record(&self, sample_ms: f64) {
        if !sample_ms.is_finite() {
            tracing::debug!("dropping non-finite latency sample {sample_ms}");
            return;
        }
        let sample = sample_ms.max(0.0);

        let mut samples = self.samples.lock();
        if samples.len() == self.capacity {
            samples.pop_front();
        }
        samples.push_back(sample);
        self.total_recorded.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the window, oldest first.
    pub fn snapshot(&self) -> Vec<f64> {
        self.samples.lock().iter().copied().collect()
    }

    /// Nearest-rank quantile over the current window; `0.0` when empty.
    pub fn quantile(&self, q: f64) -> f64 {
        let sorted = self.sorted_snapshot();
        nearest_rank_sorted(&sorted, q)
    }

    /// Number of samples currently held.
    pub fn count(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Samples accepted since creation, including evicted ones.
    pub fn total_recorded(&self) -> u64 {
        self.total_recorded.load(Ordering::Relaxed)
    }

    /// Counts and p50/p95/p99 computed from one snapshot.
    pub fn summary(&self) -> LatencySummary {
        // Read the total under the lock so it is consistent with the samples.
        let (sorted, requests) = {
            let samples = self.samples.lock();
            let mut sorted: Vec<f64> = samples.iter().copied().collect();
            let requests = self.total_recorded.load(Ordering::Relaxed);
            drop(samples);
            sorted.sort_by(f64::total_cmp);
            (sorted, requests)
        };

        LatencySummary {
            requests,
            window: sorted.len(),
            capacity: self.capacity,
            p50_ms: nearest_rank_sorted(&sorted, 0.50),
            p95_ms: nearest_rank_sorted(&sorted, 0.95),
            p99_ms: nearest_rank_sorted(&sorted, 0.99),
        }
    }

    fn sorted_snapshot(&self) -> Vec<f64> {
        let mut sorted = self.snapshot();
        sorted.sort_by(f64::total_cmp);
        sorted
    }
}

impl Default for MetricsWindow {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for MetricsWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsWindow")
            .field("capacity", &self.capacity)
            .field("count", &self.count())
            .field("total_recorded", &self.total_recorded())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_empty_window() {
        let w = MetricsWindow::new(10);
        assert!(w.is_empty());
        assert_eq!(w.quantile(0.5), 0.0);
        assert_eq!(w.quantile(0.95), 0.0);
        assert_eq!(w.snapshot(), Vec::<f64>::new());
    }

    #[test]
    fn test_fifo_eviction_keeps_most_recent() {
        let n = 5;
        let w = MetricsWindow::new(n);
        for i in 0..=n {
            w.record(i as f64);
        }
        assert_eq!(w.count(), n);
        assert_eq!(w.snapshot(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(w.total_recorded(), (n + 1) as u64);
    }

    #[test]
    fn test_count_grows_then_stays_constant() {
        let w = MetricsWindow::new(3);
        let mut counts = Vec::new();
        for i in 0..6 {
            w.record(i as f64);
            counts.push(w.count());
        }
        assert_eq!(counts, vec![1, 2, 3, 3, 3, 3]);
    }

    #[test]
    fn test_quantile_on_window() {
        let w = MetricsWindow::new(10);
        for v in [40.0, 10.0, 30.0, 20.0] {
            w.record(v);
        }
        assert_eq!(w.quantile(0.95), 30.0);
        // Snapshot preserves insertion order.
        assert_eq!(w.snapshot(), vec![40.0, 10.0, 30.0, 20.0]);
    }

    #[test]
    fn test_sanitises_samples() {
        let w = MetricsWindow::new(10);
        w.record(-3.0);
        w.record(f64::NAN);
        w.record(f64::INFINITY);
        assert_eq!(w.snapshot(), vec![0.0]);
        assert_eq!(w.total_recorded(), 1);
    }

    #[test]
    fn test_zero_capacity_raised() {
        let w = MetricsWindow::new(0);
        assert_eq!(w.capacity(), 1);
        w.record(1.0);
        w.record(2.0);
        assert_eq!(w.snapshot(), vec![2.0]);
    }

    #[test]
    fn test_summary() {
        let w = MetricsWindow::new(100);
        for i in 1..=100 {
            w.record(i as f64);
        }
        let s = w.summary();
        assert_eq!(s.requests, 100);
        assert_eq!(s.window, 100);
        // floor(0.5 * 99) = 49 → 50.0
        assert_eq!(s.p50_ms, 50.0);
        // floor(0.95 * 99) = 94 → 95.0
        assert_eq!(s.p95_ms, 95.0);
        assert_eq!(s.p99_ms, 99.0);
    }

    #[test]
    fn test_concurrent_records_not_lost() {
        let w = Arc::new(MetricsWindow::new(10_000));
        std::thread::scope(|s| {
            for t in 0..8 {
                let w = Arc::clone(&w);
                s.spawn(move || {
                    for i in 0..500 {
                        w.record((t * 1000 + i) as f64);
                    }
                });
            }
        });
        assert_eq!(w.count(), 4000);
        assert_eq!(w.total_recorded(), 4000);

        let mut snap = w.snapshot();
        snap.sort_by(f64::total_cmp);
        snap.dedup();
        assert_eq!(snap.len(), 4000, "samples duplicated or lost under race");
    }

    #[test]
    fn test_concurrent_records_respect_capacity() {
        let w = Arc::new(MetricsWindow::new(64));
        std::thread::scope(|s| {
            for _ in 0..4 {
                let w = Arc::clone(&w);
                s.spawn(move || {
                    for i in 0..1000 {
                        w.record(i as f64);
                        assert!(w.count() <= 64);
                    }
                });
            }
        });
        assert_eq!(w.count(), 64);
        assert_eq!(w.total_recorded(), 4000);
    }
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # metrics-window
//!
//! Bounded-memory request latency tracking for the serving runtime.
//!
//! - [`MetricsWindow`]: a fixed-capacity FIFO of the most recent latency
//!   samples. Once full, each new sample evicts the oldest one.
//! - [`nearest_rank`]: the quantile estimator: sort ascending, pick the
//!   element at `floor(q * (n - 1))`, no interpolation.
//! - [`LatencySummary`]: p50/p95/p99 plus counts, computed from a single
//!   consistent snapshot.
//!
//! # Thread Safety
//! `MetricsWindow` is `Send + Sync`; share it via `Arc<MetricsWindow>`.
//! `record` and `snapshot` take the same lock, so a snapshot never sees a
//! half-applied append.
//!
//! # Example
//! ```
//! use metrics_window::MetricsWindow;
//!
//! let window = MetricsWindow::new(3);
//! for ms in [10.0, 20.0, 30.0, 40.0] {
//!     window.record(ms);
//! }
//! assert_eq!(window.snapshot(), vec![20.0, 30.0, 40.0]);
//! assert_eq!(window.quantile(0.5), 30.0);
//! ```

mod quantile;
mod summary;
mod window;

pub use quantile::nearest_rank;
pub use summary::LatencySummary;
pub use window::{MetricsWindow, DEFAULT_CAPACITY};

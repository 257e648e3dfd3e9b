// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Nearest-rank quantile estimation.

/// Returns the nearest-rank `q` quantile of `values`.
///
/// The values are sorted ascending and the element at index
/// `floor(q * (len - 1))` is returned. `q` is clamped to `[0, 1]` and a NaN
/// `q` is treated as `0`. An empty slice yields `0.0`.
///
/// ```
/// use metrics_window::nearest_rank;
///
/// // floor(0.95 * 3) = 2
/// assert_eq!(nearest_rank(&[40.0, 10.0, 30.0, 20.0], 0.95), 30.0);
/// assert_eq!(nearest_rank(&[], 0.5), 0.0);
/// ```
pub fn nearest_rank(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    nearest_rank_sorted(&sorted, q)
}

/// Same as [`nearest_rank`] for a slice that is already sorted ascending.
pub(crate) fn nearest_rank_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let q = if q.is_nan() { 0.0 } else { q.clamp(0.0, 1.0) };
    let idx = (q * (sorted.len() - 1) as f64).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

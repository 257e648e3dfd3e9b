// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `mlserve predict` command: one-shot prediction through the same pipeline
//! the server uses.

use serving::{ServingConfig, ServingContext};

pub async fn execute(config: ServingConfig, features: String, proba: bool) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║              mlserve · One-Shot Predict             ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let row = super::parse_features(&features)?;
    let ctx = ServingContext::from_config(&config)?;

    println!("  Artifact: {}", config.artifact_path.display());
    println!("  Features: {row:?}");
    println!();

    let meta = ctx.registry().ensure_loaded()?;
    println!(
        "  Model: {} ({} classes, proba {})",
        meta.kind,
        meta.num_classes,
        if meta.supports_proba { "yes" } else { "no" },
    );

    let result = ctx.pipeline().predict_one(&row, proba)?;

    // ── Result ─────────────────────────────────────────────────
    println!("  Prediction: {}", result.label);
    match (&result.probabilities, proba) {
        (Some(p), _) => {
            let formatted: Vec<String> = p.iter().map(|v| format!("{v:.4}")).collect();
            println!("  Proba:      [{}]", formatted.join(", "));
        }
        (None, true) => println!("  Proba:      unavailable for this model"),
        (None, false) => {}
    }
    println!("  Latency:    {:.3} ms", result.latency_ms);
    println!();
    Ok(())
}

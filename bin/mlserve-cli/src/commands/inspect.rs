// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! `mlserve inspect` command: describe an artifact without serving it.

use model_store::{ArtifactLoader, SidecarMeta};
use std::path::PathBuf;

pub async fn execute(artifact: PathBuf) -> anyhow::Result<()> {
    println!("╔══════════════════════════════════════════════════════╗");
    println!("║             mlserve · Artifact Inspector            ║");
    println!("╚══════════════════════════════════════════════════════╝");
    println!();

    let loaded = ArtifactLoader::load(&artifact).map_err(|e| {
        anyhow::anyhow!("failed to load artifact from '{}': {e}", artifact.display())
    })?;
    let handle = &loaded.handle;

    // ── Summary ────────────────────────────────────────────────
    println!("  Artifact: {}", loaded.path.display());
    println!("  Size:     {:.1} KB", loaded.size_bytes as f64 / 1024.0);
    println!("  Kind:     {}", handle.kind());
    println!("  Features: {}", handle.n_features());
    println!(
        "  Proba:    {}",
        if handle.supports_proba() { "supported" } else { "not supported" },
    );
    println!();

    // ── Classes ────────────────────────────────────────────────
    let classes: Vec<String> = handle.classes().iter().map(i64::to_string).collect();
    println!("  Classes ({}): [{}]", classes.len(), classes.join(", "));
    println!();

    // ── Sidecar ────────────────────────────────────────────────
    let sidecar_path = SidecarMeta::path_for(&loaded.path);
    match loaded.declared_features() {
        Some(n) => println!(
            "  Sidecar: {} declares {n} features (requests are checked)",
            sidecar_path.display()
        ),
        None if loaded.sidecar.is_some() => println!(
            "  Sidecar: {} has no feature count (requests are unchecked)",
            sidecar_path.display()
        ),
        None => println!("  Sidecar: none (requests are unchecked)"),
    }
    println!();
    Ok(())
}

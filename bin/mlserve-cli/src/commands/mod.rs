// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Subcommand implementations and shared CLI plumbing.

pub mod inspect;
pub mod predict;
pub mod serve;

use anyhow::Context;
use serving::ServingConfig;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber.
///
/// `RUST_LOG` wins when set; otherwise the level follows the `-v` count:
/// none → warn, `-v` → info, `-vv` → debug, `-vvv` → trace.
pub fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Builds the effective configuration: defaults, then the TOML file (if
/// given), then environment variables. Subcommand flags are applied by the
/// caller on top.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ServingConfig> {
    let mut config = match path {
        Some(p) => ServingConfig::from_file(p)
            .with_context(|| format!("failed to read config '{}'", p.display()))?,
        None => ServingConfig::default(),
    };
    config.apply_env()?;
    tracing::debug!("effective config: {config:?}");
    Ok(config)
}

/// Parses a comma-separated feature list such as `"5.1, 3.5,1.4"`.
pub fn parse_features(raw: &str) -> anyhow::Result<Vec<f64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(i, s)| {
            s.parse::<f64>()
                .with_context(|| format!("feature {i} is not a number: '{s}'"))
        })
        .collect()
}

// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # mlserve
//!
//! Command-line interface for the model serving runtime.
//!
//! ## Usage
//! ```bash
//! # Serve the HTTP API
//! mlserve serve --artifact ./models/model.json --bind 0.0.0.0:8000
//!
//! # One-shot prediction
//! mlserve predict --artifact ./models/model.json --features 5.1,3.5,1.4,0.2 --proba
//!
//! # Inspect an artifact
//! mlserve inspect --artifact ./models/model.json
//! ```

mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "mlserve",
    about = "Lightweight HTTP serving for trained classifiers",
    version,
    author
)]
struct Cli {
    /// Path to a TOML configuration file (environment and flags override it).
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve /health, /version, /metrics, /predict and /predict_batch.
    Serve {
        /// Path to the model artifact.
        #[arg(short, long)]
        artifact: Option<std::path::PathBuf>,

        /// Socket address to bind (e.g., "127.0.0.1:8000").
        #[arg(short, long)]
        bind: Option<String>,

        /// Defer loading the model until the first prediction.
        #[arg(long)]
        lazy: bool,

        /// Number of latency samples kept for p50/p95.
        #[arg(short, long)]
        window: Option<usize>,
    },

    /// Run a single prediction and print the result.
    Predict {
        /// Path to the model artifact.
        #[arg(short, long)]
        artifact: Option<std::path::PathBuf>,

        /// Comma-separated feature values (e.g., "5.1,3.5,1.4,0.2").
        #[arg(short, long, allow_hyphen_values = true)]
        features: String,

        /// Also print class probabilities when the model supports them.
        #[arg(short, long)]
        proba: bool,
    },

    /// Inspect an artifact: kind, classes, feature count and sidecar.
    Inspect {
        /// Path to the model artifact.
        #[arg(short, long)]
        artifact: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    let mut config = commands::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve {
            artifact,
            bind,
            lazy,
            window,
        } => {
            if let Some(path) = artifact {
                config.artifact_path = path;
            }
            if let Some(addr) = bind {
                config.bind_addr = addr;
            }
            if let Some(capacity) = window {
                config.window_capacity = capacity;
            }
            if lazy {
                config.eager_load = false;
            }
            commands::serve::execute(config).await
        }
        Commands::Predict {
            artifact,
            features,
            proba,
        } => {
            if let Some(path) = artifact {
                config.artifact_path = path;
            }
            commands::predict::execute(config, features, proba).await
        }
        Commands::Inspect { artifact } => {
            let path = artifact.unwrap_or(config.artifact_path);
            commands::inspect::execute(path).await
        }
    }
}

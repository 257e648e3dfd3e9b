// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Serving configuration loaded from TOML files, environment variables, or
//! constructed programmatically.
//!
//! # TOML Format
//! ```toml
//! artifact_path = "models/model.json"
//! window_capacity = 2000
//! eager_load = true
//! bind_addr = "0.0.0.0:8000"
//! api_key = "change-me"
//! ```
//!
//! # Precedence
//! Defaults < TOML file < environment (`MODEL_PATH`, `API_KEY`,
//! `METRICS_WINDOW`, `BIND_ADDR`).

use crate::ConfigError;
use std::path::{Path, PathBuf};

pub const ENV_MODEL_PATH: &str = "MODEL_PATH";
pub const ENV_API_KEY: &str = "API_KEY";
pub const ENV_METRICS_WINDOW: &str = "METRICS_WINDOW";
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";

/// Configuration for a serving process.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ServingConfig {
    /// Path to the model artifact (`model.json`).
    pub artifact_path: PathBuf,
    /// Number of latency samples kept for p50/p95.
    pub window_capacity: usize,
    /// Load the model at startup instead of on the first request.
    pub eager_load: bool,
    /// Socket address the HTTP surface binds to.
    pub bind_addr: String,
    /// Required `x-api-key` value for prediction routes, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl ServingConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| ConfigError::Toml(format!("parse error: {e}")))
    }

    /// Serialises configuration to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Toml(format!("serialise error: {e}")))
    }

    /// Overlays values from the process environment.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|var| std::env::var(var).ok())
    }

    /// Overlays values from `lookup`, which maps a variable name to its value.
    ///
    /// Empty values are ignored, matching an unset variable.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(path) = get(ENV_MODEL_PATH) {
            self.artifact_path = PathBuf::from(path);
        }
        if let Some(key) = get(ENV_API_KEY) {
            self.api_key = Some(key);
        }
        if let Some(raw) = get(ENV_METRICS_WINDOW) {
            self.window_capacity = raw.trim().parse().map_err(|_| ConfigError::Env {
                var: ENV_METRICS_WINDOW,
                value: raw.clone(),
            })?;
        }
        if let Some(addr) = get(ENV_BIND_ADDR) {
            self.bind_addr = addr;
        }
        Ok(())
    }

    /// Checks that the settings are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.artifact_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("artifact_path must not be empty".into()));
        }
        if self.window_capacity == 0 {
            return Err(ConfigError::Invalid("window_capacity must be at least 1".into()));
        }
        if self.bind_addr.trim().is_empty() {
            return Err(ConfigError::Invalid("bind_addr must not be empty".into()));
        }
        Ok(())
    }
}

impl Default for ServingConfig {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from("models/model.json"),
            window_capacity: metrics_window::DEFAULT_CAPACITY,
            eager_load: true,
            bind_addr: "0.0.0.0:8000".to_string(),
            api_key: None,
        }
    }
}

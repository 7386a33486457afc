// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::Path;

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

/// How the pattern registry compiles and caches named patterns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    pub case_insensitive: bool,
    pub size_limit_bytes: usize,
    pub cache_capacity: u64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            case_insensitive: true,
            size_limit_bytes: 1024 * 1024,
            cache_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub json: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub patterns: PatternConfig,
    pub telemetry: TelemetryConfig,
}

/// Load configuration from defaults, optional TOML file, and environment overrides (prefix: PROFILARR_).
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("PROFILARR_").split("__"));

    let config: AppConfig = figment.extract()?;
    info!(
        target: "config",
        case_insensitive = config.patterns.case_insensitive,
        cache_capacity = config.patterns.cache_capacity,
        "configuration loaded"
    );
    Ok(config)
}

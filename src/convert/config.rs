// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Conversion configuration

use crate::scene::MaterialConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Looked up in the working directory by [`ConversionConfig::load`]
pub const CONFIG_FILE_NAME: &str = "scad-scene.toml";

pub const ENV_TIMEOUT_MS: &str = "SCAD_SCENE_TIMEOUT_MS";
pub const ENV_MAX_COMPLEXITY: &str = "SCAD_SCENE_MAX_COMPLEXITY";
pub const ENV_COLOR: &str = "SCAD_SCENE_COLOR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid value {value:?} for {var}")]
    Env { var: &'static str, value: String },
}

/// How `mirror` is realized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MirrorMode {
    /// Reflect across the plane through the origin with the given normal
    #[default]
    Reflection,
    /// Negate the scale of every axis with a non-zero normal component
    AxisFlip,
}

/// Per-call conversion settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Clean up each boolean result (degenerate faces, duplicate vertices)
    pub enable_optimization: bool,
    /// Upper bound on operand triangles entering a single boolean step
    pub max_complexity: usize,
    pub timeout_ms: u64,
    pub mirror_mode: MirrorMode,
    pub material: MaterialConfig,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            enable_optimization: true,
            max_complexity: 50_000,
            timeout_ms: 10_000,
            mirror_mode: MirrorMode::Reflection,
            material: MaterialConfig::default(),
        }
    }
}

impl ConversionConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// `scad-scene.toml` from the working directory if present, then
    /// environment overrides
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = if Path::new(CONFIG_FILE_NAME).exists() {
            Self::from_file(CONFIG_FILE_NAME)?
        } else {
            Self::default()
        };
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply `SCAD_SCENE_*` overrides from `lookup`
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup(ENV_TIMEOUT_MS) {
            self.timeout_ms = value.trim().parse().map_err(|_| ConfigError::Env {
                var: ENV_TIMEOUT_MS,
                value,
            })?;
        }
        if let Some(value) = lookup(ENV_MAX_COMPLEXITY) {
            self.max_complexity = value.trim().parse().map_err(|_| ConfigError::Env {
                var: ENV_MAX_COMPLEXITY,
                value,
            })?;
        }
        if let Some(value) = lookup(ENV_COLOR) {
            self.material.color = value;
        }
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn with_material(mut self, material: MaterialConfig) -> Self {
        self.material = material;
        self
    }

    pub fn with_optimization(mut self, enabled: bool) -> Self {
        self.enable_optimization = enabled;
        self
    }

    pub fn with_max_complexity(mut self, limit: usize) -> Self {
        self.max_complexity = limit;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_mirror_mode(mut self, mode: MirrorMode) -> Self {
        self.mirror_mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConversionConfig::default();
        assert!(config.enable_optimization);
        assert_eq!(config.max_complexity, 50_000);
        assert_eq!(config.timeout(), Duration::from_secs(10));
        assert_eq!(config.material.color, "#00ff88");
    }

    #[test]
    fn test_overrides() {
        let mut config = ConversionConfig::default();
        config
            .apply_overrides(|name| match name {
                ENV_TIMEOUT_MS => Some("250".to_string()),
                ENV_COLOR => Some("#ff0000".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.timeout_ms, 250);
        assert_eq!(config.material.color, "#ff0000");
        assert_eq!(config.max_complexity, 50_000);
    }

    #[test]
    fn test_bad_override() {
        let mut config = ConversionConfig::default();
        let result = config.apply_overrides(|name| {
            (name == ENV_MAX_COMPLEXITY).then(|| "lots".to_string())
        });
        assert!(matches!(
            result,
            Err(ConfigError::Env {
                var: ENV_MAX_COMPLEXITY,
                ..
            })
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ConversionConfig::default()
            .with_timeout_ms(42)
            .with_mirror_mode(MirrorMode::AxisFlip);
        let text = config.to_toml_string().unwrap();
        assert_eq!(ConversionConfig::from_toml_str(&text).unwrap(), config);
    }
}

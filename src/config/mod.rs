//! Configuration management
//!
//! Handles loading, validation, and CLI overrides of configuration from
//! TOML files. Every section has defaults, so a partial file is valid.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub mod types;

pub use types::{
    ExportConfig, LoggingConfig, ProbeConfig, SamplerConfig, SchedulerConfig, Theme,
};

/// Per-user configuration directory
pub fn get_config_dir() -> PathBuf {
    dirs::config_dir().map_or_else(
        || PathBuf::from("/etc/obsidian-resilience"),
        |d| d.join("obsidian-resilience"),
    )
}

/// Default configuration file location
pub fn default_config_path() -> PathBuf {
    get_config_dir().join("config.toml")
}

/// Resolve the directory downloads are written to.
///
/// Falls back to the user's download directory, then the temp dir.
pub fn resolve_download_dir(configured: &Option<PathBuf>) -> PathBuf {
    configured.clone().unwrap_or_else(|| {
        dirs::download_dir().unwrap_or_else(std::env::temp_dir)
    })
}

/// Resolve log directory, falling back to XDG_DATA_HOME/obsidian-resilience/logs
pub fn resolve_log_dir(configured: &Option<PathBuf>) -> PathBuf {
    configured.clone().unwrap_or_else(|| {
        dirs::data_dir().map_or_else(
            || PathBuf::from("/tmp/obsidian-resilience"),
            |d| d.join("obsidian-resilience/logs"),
        )
    })
}

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Adaptive scheduler configuration
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Capability probe configuration
    #[serde(default)]
    pub probe: ProbeConfig,
    /// Resource sampler configuration
    #[serde(default)]
    pub sampler: SamplerConfig,
    /// Export pipeline configuration
    #[serde(default)]
    pub export: ExportConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &str) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).context(format!("Failed to read config file: {path}"))?;

        let config = Self::from_toml(&content)?;
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        let scheduler = &self.scheduler;

        let interval = scheduler.reduced_frame_interval_ms;
        if interval.is_nan() || interval <= 0.0 {
            anyhow::bail!(
                "reduced_frame_interval_ms must be positive, got {}",
                scheduler.reduced_frame_interval_ms
            );
        }
        if scheduler.checkpoint_frames == 0 {
            anyhow::bail!("checkpoint_frames must be at least 1");
        }
        if scheduler.min_fps.is_nan() || scheduler.min_fps <= 0.0 {
            anyhow::bail!("min_fps must be positive, got {}", scheduler.min_fps);
        }
        if scheduler.host_refresh_hz == 0 || scheduler.host_refresh_hz > 1000 {
            anyhow::bail!(
                "host_refresh_hz must be between 1 and 1000, got {}",
                scheduler.host_refresh_hz
            );
        }

        if self.probe.min_memory_gb < 0.0 {
            anyhow::bail!(
                "min_memory_gb cannot be negative, got {}",
                self.probe.min_memory_gb
            );
        }
        if self
            .probe
            .low_end_keywords
            .iter()
            .any(|k| k.trim().is_empty())
        {
            anyhow::bail!("low_end_keywords cannot contain empty fragments");
        }

        if self.sampler.period_ms == 0 {
            anyhow::bail!("sampler period_ms must be at least 1");
        }

        let quality = self.export.image_quality;
        if quality.is_nan() || quality <= 0.0 || quality > 1.0 {
            anyhow::bail!("image_quality must be within (0, 1], got {quality}");
        }
        if self.export.diagnostic_payload.is_empty() {
            anyhow::bail!("diagnostic_payload cannot be empty");
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => anyhow::bail!("Invalid log level: {other}"),
        }

        Ok(())
    }

    /// Override config with CLI arguments
    pub fn with_overrides(mut self, download_dir: Option<PathBuf>, light_theme: bool) -> Self {
        if let Some(dir) = download_dir {
            self.export.download_dir = Some(dir);
        }
        if light_theme {
            self.export.dark_theme = false;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default_config();
        assert_eq!(config.scheduler.checkpoint_frames, 60);
        assert_eq!(config.scheduler.min_fps, 30.0);
        assert_eq!(config.sampler.period_ms, 1000);
        assert_eq!(config.export.diagnostic_payload, "TRS Obsidian Test");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml(
            r#"
            [scheduler]
            min_fps = 24.0

            [export]
            dark_theme = false
            "#,
        )
        .unwrap();

        assert_eq!(config.scheduler.min_fps, 24.0);
        assert_eq!(config.scheduler.reduced_frame_interval_ms, 33.0);
        assert_eq!(config.export.background(), "#ffffff");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_config_validation_invalid_quality() {
        let mut config = Config::default_config();
        config.export.image_quality = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_log_level() {
        let mut config = Config::default_config();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_checkpoint() {
        let result = Config::from_toml("[scheduler]\ncheckpoint_frames = 0\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_with_overrides() {
        let config =
            Config::default_config().with_overrides(Some(PathBuf::from("/tmp/out")), true);
        assert_eq!(config.export.download_dir, Some(PathBuf::from("/tmp/out")));
        assert!(!config.export.dark_theme);
    }
}

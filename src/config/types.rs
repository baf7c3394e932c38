//! Configuration section types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::capabilities::DEFAULT_LOW_END_KEYWORDS;

/// Adaptive scheduler tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Minimum spacing between executed frames in the reduced tier (ms)
    pub reduced_frame_interval_ms: f64,
    /// Executed frames between throughput checkpoints
    pub checkpoint_frames: u64,
    /// Below this measured rate the scheduler downgrades to the reduced tier
    pub min_fps: f64,
    /// Refresh rate of the self-driven frame loop (Hz)
    pub host_refresh_hz: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            reduced_frame_interval_ms: 33.0,
            checkpoint_frames: 60,
            min_fps: 30.0,
            host_refresh_hz: 60,
        }
    }
}

/// Capability probe thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Renderer fragments marking low-end GPUs (case-insensitive)
    pub low_end_keywords: Vec<String>,
    /// Device memory below this is low-end (GB)
    pub min_memory_gb: f64,
    /// Core counts below this are low-end
    pub min_cpu_cores: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            low_end_keywords: DEFAULT_LOW_END_KEYWORDS
                .iter()
                .map(|k| (*k).to_string())
                .collect(),
            min_memory_gb: 4.0,
            min_cpu_cores: 4,
        }
    }
}

/// Resource sampler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Sampling period (ms)
    pub period_ms: u64,
    /// Heap usage above this is flagged as pressure (MB)
    pub memory_pressure_mb: u64,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            period_ms: 1000,
            memory_pressure_mb: 100,
        }
    }
}

/// Dashboard color theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Dark,
    Light,
}

/// Export pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Raster quality passed to the surface renderer (0, 1]
    pub image_quality: f32,
    /// Snapshot background in dark theme
    pub dark_background: String,
    /// Snapshot background in light theme
    pub light_background: String,
    /// Theme used when the caller does not pick one
    pub dark_theme: bool,
    /// Prefix of downloaded snapshot files
    pub image_filename_prefix: String,
    /// Prefix of downloaded manual-fallback text files
    pub text_filename_prefix: String,
    /// Where the native host writes downloads (None = user download dir)
    pub download_dir: Option<PathBuf>,
    /// String written by the live self-test probe
    pub diagnostic_payload: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            image_quality: 0.8,
            dark_background: "#0f172a".to_string(),
            light_background: "#ffffff".to_string(),
            dark_theme: true,
            image_filename_prefix: "trs-mission".to_string(),
            text_filename_prefix: "trs-mission-brief".to_string(),
            download_dir: None,
            diagnostic_payload: "TRS Obsidian Test".to_string(),
        }
    }
}

impl ExportConfig {
    /// Configured default theme
    pub fn theme(&self) -> Theme {
        if self.dark_theme {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    /// Snapshot background color for `theme`
    pub fn background_for(&self, theme: Theme) -> &str {
        match theme {
            Theme::Dark => &self.dark_background,
            Theme::Light => &self.light_background,
        }
    }

    /// Background color for the configured default theme
    pub fn background(&self) -> &str {
        self.background_for(self.theme())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// trace | debug | info | warn | error
    pub level: String,
    /// Directory for log files (None = stdout only)
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: None,
        }
    }
}

//! Capability state definitions
//!
//! Data produced once by the capability probe and consumed by the adaptive
//! scheduler for the rest of the session.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Memory assumed when the host does not report a device memory hint (GB)
pub const DEFAULT_MEMORY_GB: f64 = 4.0;

/// Core count assumed when the host does not report a logical core hint
pub const DEFAULT_CPU_CORES: u32 = 4;

/// Rendering quality mode applied to animation work
///
/// Transitions only ever go `Full → Reduced` within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum PerformanceTier {
    /// Every host frame runs the frame callback
    #[default]
    Full,
    /// Frame callbacks are capped near 30 per second
    Reduced,
}

impl PerformanceTier {
    pub fn is_reduced(&self) -> bool {
        matches!(self, Self::Reduced)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Full => "Full",
            Self::Reduced => "Reduced",
        }
    }

    /// Label shown by the dashboard performance overlay
    pub fn label(&self) -> &'static str {
        match self {
            Self::Full => "Full",
            Self::Reduced => "Optimized",
        }
    }
}

impl fmt::Display for PerformanceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why a host was classified as low-end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LowEndReason {
    /// No graphics context could be created at all
    NoGraphicsContext,
    /// Renderer string matched a low-end keyword fragment
    LowEndRenderer {
        /// The matching fragment
        keyword: String,
    },
    /// Device memory below the configured minimum
    LowMemory {
        /// Reported (or defaulted) memory in GB
        memory_gb: f64,
    },
    /// Logical core count below the configured minimum
    FewCores {
        /// Reported (or defaulted) core count
        cores: u32,
    },
}

impl fmt::Display for LowEndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoGraphicsContext => write!(f, "no graphics context available"),
            Self::LowEndRenderer { keyword } => write!(f, "low-end renderer ({keyword})"),
            Self::LowMemory { memory_gb } => write!(f, "low device memory ({memory_gb} GB)"),
            Self::FewCores { cores } => write!(f, "few logical cores ({cores})"),
        }
    }
}

/// Outcome of classifying a snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CapabilityClass {
    /// Host can run full-rate animation
    Capable,
    /// Host should start throttled
    LowEnd {
        /// Every signal that contributed to the verdict
        reasons: Vec<LowEndReason>,
    },
}

impl CapabilityClass {
    pub fn is_low_end(&self) -> bool {
        matches!(self, Self::LowEnd { .. })
    }
}

/// One-time assessment of host rendering/hardware strength
///
/// Built by [`CapabilityProbe::detect`](super::CapabilityProbe::detect) and
/// never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySnapshot {
    /// When the probe ran
    pub probed_at: DateTime<Utc>,

    /// Unmasked renderer identification, if the host exposes it
    pub renderer_signature: Option<String>,

    /// Device memory in GB, [`DEFAULT_MEMORY_GB`] when not reported
    pub memory_gb: f64,

    /// Whether `memory_gb` came from the host rather than the default
    pub memory_reported: bool,

    /// Logical core count, [`DEFAULT_CPU_CORES`] when not reported
    pub cpu_cores: u32,

    /// Whether `cpu_cores` came from the host rather than the default
    pub cores_reported: bool,

    /// Whether a graphics context could be created
    pub graphics_available: bool,

    /// Computed classification
    pub class: CapabilityClass,
}

impl CapabilitySnapshot {
    pub fn is_low_end(&self) -> bool {
        self.class.is_low_end()
    }

    /// Tier the scheduler should start in
    pub fn initial_tier(&self) -> PerformanceTier {
        if self.is_low_end() {
            PerformanceTier::Reduced
        } else {
            PerformanceTier::Full
        }
    }

    /// Human-readable multi-line summary
    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str("Capability Summary\n");
        summary.push_str(&format!(
            "  Graphics:  {}\n",
            if self.graphics_available {
                "available"
            } else {
                "unavailable"
            }
        ));
        summary.push_str(&format!(
            "  Renderer:  {}\n",
            self.renderer_signature.as_deref().unwrap_or("unknown")
        ));
        summary.push_str(&format!(
            "  Memory:    {} GB{}\n",
            self.memory_gb,
            if self.memory_reported {
                ""
            } else {
                " (assumed)"
            }
        ));
        summary.push_str(&format!(
            "  CPU cores: {}{}\n",
            self.cpu_cores,
            if self.cores_reported { "" } else { " (assumed)" }
        ));

        match &self.class {
            CapabilityClass::Capable => summary.push_str("  Verdict:   capable"),
            CapabilityClass::LowEnd { reasons } => {
                summary.push_str("  Verdict:   low-end");
                for reason in reasons {
                    summary.push_str(&format!("\n    - {reason}"));
                }
            }
        }

        summary
    }
}

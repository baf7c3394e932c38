//! # obsidian-resilience
//!
//! Runtime resilience layer for an operations dashboard: keeps animation
//! smooth on weak hardware and makes sure a mission brief always reaches the
//! user, even when the clipboard is blocked.
//!
//! # Architecture
//!
//! ```text
//! obsidian-resilience
//!   ├─> CapabilityProbe   (one-shot renderer/memory/core detection)
//!   ├─> AdaptiveScheduler (per-frame work, tier downgrade on low throughput)
//!   ├─> ResourceSampler   (periodic heap + uptime samples)
//!   ├─> ExportPipeline    (secure clipboard → legacy copy → manual handoff)
//!   └─> SelfTestHarness   (which clipboard paths work here?)
//! ```
//!
//! Host services (graphics, clipboard, downloads, rendering) are traits. The
//! crate ships native Linux implementations used by the CLI.

#![warn(clippy::all)]

/// Host capability detection and the resulting performance tier
pub mod capabilities;

/// Configuration loading and validation
pub mod config;

/// Clipboard self-test
pub mod diagnostics;

/// Text and image export with ordered fallback
pub mod export;

/// Adaptive frame scheduling
///
/// Throttles per-frame work to ~30 FPS on low-end hosts and downgrades
/// permanently when measured throughput drops below the target.
pub mod scheduler;

/// Resource sampling
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

pub use capabilities::{CapabilityProbe, CapabilitySnapshot, PerformanceTier};
pub use config::Config;
pub use diagnostics::{DiagnosticReport, SelfTestHarness};
pub use export::{ExportPipeline, ExportReport, ImageExporter, MissionBrief};
pub use scheduler::AdaptiveScheduler;
pub use telemetry::ResourceSampler;

//! Frame admission and throughput checkpoints
//!
//! Pure state: no clock, no host. The runner feeds timestamps in and acts on
//! the decisions that come out, which keeps every rule here unit-testable.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::capabilities::PerformanceTier;
use crate::config::types::SchedulerConfig;

/// Counters owned by the scheduler
///
/// Never reset; they grow for the whole session, across stop/start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameMetrics {
    /// Executed frame callbacks
    pub frame_count: u64,
    /// Start of the current measurement window (ms)
    pub last_sample_ms: f64,
    /// `frame_count` at the start of the current measurement window
    pub sample_base_frame: u64,
    /// Rate measured at the last checkpoint; `None` before the first one
    pub measured_fps: Option<f64>,
    /// Timestamp of the last executed frame, used by the reduced-tier gate
    pub last_executed_ms: Option<f64>,
    /// Host frames dropped by the reduced-tier gate
    pub skipped_frames: u64,
}

impl FrameMetrics {
    fn new(now_ms: f64) -> Self {
        Self {
            frame_count: 0,
            last_sample_ms: now_ms,
            sample_base_frame: 0,
            measured_fps: None,
            last_executed_ms: None,
            skipped_frames: 0,
        }
    }
}

/// Whether a host frame should run the callback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameDecision {
    Execute,
    Skip,
}

/// A tier downgrade triggered by a checkpoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierChange {
    pub from: PerformanceTier,
    pub to: PerformanceTier,
    pub measured_fps: f64,
}

/// Per-frame rules of the adaptive scheduler
#[derive(Debug, Clone)]
pub struct FrameGovernor {
    tier: PerformanceTier,
    metrics: FrameMetrics,
    reduced_interval_ms: f64,
    checkpoint_frames: u64,
    min_fps: f64,
}

impl FrameGovernor {
    pub fn new(initial_tier: PerformanceTier, now_ms: f64, config: &SchedulerConfig) -> Self {
        Self {
            tier: initial_tier,
            metrics: FrameMetrics::new(now_ms),
            reduced_interval_ms: config.reduced_frame_interval_ms,
            checkpoint_frames: config.checkpoint_frames.max(1),
            min_fps: config.min_fps,
        }
    }

    pub fn tier(&self) -> PerformanceTier {
        self.tier
    }

    pub fn metrics(&self) -> &FrameMetrics {
        &self.metrics
    }

    /// Open a fresh measurement window at `now_ms`.
    ///
    /// Called on every Idle -> Running transition so time spent stopped is
    /// never counted as frame time.
    pub fn resume(&mut self, now_ms: f64) {
        self.metrics.last_sample_ms = now_ms;
        self.metrics.sample_base_frame = self.metrics.frame_count;
    }

    /// Decide whether the host frame at `now_ms` runs the callback.
    ///
    /// Full tier admits every frame. Reduced tier admits a frame only once
    /// `reduced_interval_ms` has passed since the last executed one.
    pub fn admit(&mut self, now_ms: f64) -> FrameDecision {
        if self.tier.is_reduced() {
            if let Some(last) = self.metrics.last_executed_ms {
                if now_ms - last < self.reduced_interval_ms {
                    self.metrics.skipped_frames += 1;
                    return FrameDecision::Skip;
                }
            }
        }

        self.metrics.last_executed_ms = Some(now_ms);
        FrameDecision::Execute
    }

    /// Account for an executed callback finishing at `now_ms`.
    ///
    /// Every `checkpoint_frames` executions the rate over the current window
    /// is measured. A rate below `min_fps` while in the full tier
    /// downgrades to reduced; nothing ever upgrades back.
    pub fn record_executed(&mut self, now_ms: f64) -> Option<TierChange> {
        self.metrics.frame_count += 1;

        if self.metrics.frame_count % self.checkpoint_frames != 0 {
            return None;
        }

        let elapsed = now_ms - self.metrics.last_sample_ms;
        if elapsed <= 0.0 {
            debug!("Checkpoint with non-positive elapsed time ({elapsed}ms), ignored");
            return None;
        }

        let frames = self.metrics.frame_count - self.metrics.sample_base_frame;
        let fps = frames as f64 * 1000.0 / elapsed;
        self.metrics.measured_fps = Some(fps);
        self.metrics.last_sample_ms = now_ms;
        self.metrics.sample_base_frame = self.metrics.frame_count;
        debug!(
            "Frame checkpoint: {} frames, {:.1} fps",
            self.metrics.frame_count, fps
        );

        if fps < self.min_fps && self.tier == PerformanceTier::Full {
            warn!(
                "Measured {:.1} fps below {:.1}, downgrading to reduced tier",
                fps, self.min_fps
            );
            self.tier = PerformanceTier::Reduced;
            return Some(TierChange {
                from: PerformanceTier::Full,
                to: PerformanceTier::Reduced,
                measured_fps: fps,
            });
        }

        None
    }
}

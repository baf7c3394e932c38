//! Periodic resource sampler
//!
//! Samples heap usage and time since construction on a fixed period and
//! broadcasts the latest value via `tokio::sync::watch`. Purely observational:
//! nothing here feeds back into scheduling.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::memory::MemoryProbe;
use crate::config::types::SamplerConfig;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// One observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSample {
    /// 0 for the initial placeholder, then 1, 2, ...
    pub sequence: u64,
    /// Wall-clock time of the sample
    pub sampled_at: DateTime<Utc>,
    /// Heap usage in whole MB; `None` means unknown, not zero
    pub memory_mb: Option<u64>,
    /// Milliseconds since the sampler was constructed
    pub uptime_ms: u64,
    /// Heap usage above the pressure threshold; `None` when memory is unknown
    pub memory_pressure: Option<bool>,
}

impl ResourceSample {
    fn initial() -> Self {
        Self {
            sequence: 0,
            sampled_at: Utc::now(),
            memory_mb: None,
            uptime_ms: 0,
            memory_pressure: None,
        }
    }

    pub fn memory_label(&self) -> String {
        match self.memory_mb {
            Some(mb) => format!("{mb}MB"),
            None => "unknown".to_string(),
        }
    }
}

/// Read-only view of the latest sample
#[derive(Clone)]
pub struct SampleSubscriber {
    rx: watch::Receiver<ResourceSample>,
}

impl SampleSubscriber {
    /// Latest sample (non-blocking)
    pub fn latest(&self) -> ResourceSample {
        self.rx.borrow().clone()
    }

    /// Wait for the next sample
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.rx.changed().await
    }
}

/// Periodic resource sampler
pub struct ResourceSampler {
    probe: Arc<dyn MemoryProbe>,
    period: Duration,
    pressure_mb: u64,
    started: Instant,
    sequence: u64,
    sample_tx: watch::Sender<ResourceSample>,
    shutdown: tokio::sync::broadcast::Receiver<()>,
}

impl ResourceSampler {
    /// Create a sampler and the subscriber handle for its samples.
    ///
    /// The uptime clock starts here, not when `run` is first polled.
    pub fn new(
        probe: Arc<dyn MemoryProbe>,
        config: &SamplerConfig,
        shutdown: tokio::sync::broadcast::Receiver<()>,
    ) -> (Self, SampleSubscriber) {
        let (sample_tx, rx) = watch::channel(ResourceSample::initial());

        let sampler = Self {
            probe,
            period: Duration::from_millis(config.period_ms.max(1)),
            pressure_mb: config.memory_pressure_mb,
            started: Instant::now(),
            sequence: 0,
            sample_tx,
            shutdown,
        };

        (sampler, SampleSubscriber { rx })
    }

    /// Take one sample immediately and publish it
    pub fn sample_now(&mut self) -> ResourceSample {
        self.sequence += 1;

        let memory_mb = self
            .probe
            .used_heap_bytes()
            .map(|bytes| (bytes as f64 / BYTES_PER_MB).round() as u64);

        let sample = ResourceSample {
            sequence: self.sequence,
            sampled_at: Utc::now(),
            memory_mb,
            uptime_ms: u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
            memory_pressure: memory_mb.map(|mb| mb > self.pressure_mb),
        };

        debug!(
            "Resource sample #{}: memory {}, uptime {}ms",
            sample.sequence,
            sample.memory_label(),
            sample.uptime_ms
        );

        self.sample_tx.send_replace(sample.clone());
        sample
    }

    /// Sample every period until shutdown.
    ///
    /// The first sample is taken one period after construction.
    pub async fn run(mut self) {
        info!("Resource sampler started ({}ms period)", self.period.as_millis());

        let mut interval = tokio::time::interval_at(self.started + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.sample_now();
                }
                _ = self.shutdown.recv() => {
                    info!("Resource sampler received shutdown");
                    break;
                }
            }
        }

        info!("Resource sampler stopped");
    }
}

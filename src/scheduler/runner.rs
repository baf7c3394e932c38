//! Adaptive frame scheduler
//!
//! Drives a caller-supplied frame callback and downgrades the performance
//! tier when measured throughput is poor. Two ways to drive it:
//!
//! - **Host-driven**: [`AdaptiveScheduler::arm`] returns a [`FrameTicket`];
//!   the host calls [`AdaptiveScheduler::on_host_frame`] once per refresh.
//! - **Self-driven**: [`AdaptiveScheduler::start`] spawns a tokio task that
//!   ticks at the configured refresh rate.
//!
//! Each `start`/`arm` opens a new generation. A frame delivered for an older
//! generation, or after [`AdaptiveScheduler::stop`], never runs the callback.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::ReentrantMutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use super::clock::{FrameClock, MonotonicClock};
use super::governor::{FrameDecision, FrameGovernor, FrameMetrics};
use crate::capabilities::{CapabilitySnapshot, PerformanceTier};
use crate::config::types::SchedulerConfig;

/// Scheduler lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    Idle,
    Running,
}

/// Proof that frames belong to a particular start of the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTicket {
    generation: u64,
}

impl FrameTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// What happened to one host frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The callback ran
    Executed,
    /// Dropped by the reduced-tier gate
    Skipped,
    /// The ticket is stale or the scheduler is stopped
    Cancelled,
}

/// Passed to the frame callback
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameInfo {
    /// Tier in effect for this frame
    pub tier: PerformanceTier,
    /// Zero-based index of this executed frame within the session
    pub frame_index: u64,
    /// Clock reading when the frame was admitted (ms)
    pub timestamp_ms: f64,
}

/// Error returned when a self-driven loop ends abnormally
#[derive(Debug, Error)]
pub enum FrameLoopError<E> {
    /// The frame callback returned an error; the loop stopped
    #[error("frame callback failed: {0}")]
    Callback(E),

    /// The loop task panicked or was aborted
    #[error("frame loop task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Handle to a self-driven frame loop
pub struct FrameLoopHandle<E> {
    ticket: FrameTicket,
    join: JoinHandle<Result<(), E>>,
}

impl<E> FrameLoopHandle<E> {
    pub fn ticket(&self) -> FrameTicket {
        self.ticket
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Wait for the loop to exit after `stop()`, a restart, or a callback error
    pub async fn join(self) -> Result<(), FrameLoopError<E>> {
        self.join.await?.map_err(FrameLoopError::Callback)
    }
}

/// Adaptive frame scheduler
pub struct AdaptiveScheduler {
    /// Held for the full duration of a frame, including the callback
    exec: ReentrantMutex<RefCell<FrameGovernor>>,
    generation: AtomicU64,
    running: AtomicBool,
    tier_tx: watch::Sender<PerformanceTier>,
    stop_signal: Notify,
    clock: Arc<dyn FrameClock>,
    refresh_period: Duration,
}

impl AdaptiveScheduler {
    /// Create a scheduler whose starting tier follows the capability verdict
    pub fn new(
        snapshot: &CapabilitySnapshot,
        config: &SchedulerConfig,
        clock: Arc<dyn FrameClock>,
    ) -> Self {
        let initial_tier = snapshot.initial_tier();
        info!(
            "Adaptive scheduler created in {} tier (low-end: {})",
            initial_tier,
            snapshot.is_low_end()
        );

        let governor = FrameGovernor::new(initial_tier, clock.now_ms(), config);
        let (tier_tx, _) = watch::channel(initial_tier);
        let refresh_hz = config.host_refresh_hz.max(1);

        Self {
            exec: ReentrantMutex::new(RefCell::new(governor)),
            generation: AtomicU64::new(0),
            running: AtomicBool::new(false),
            tier_tx,
            stop_signal: Notify::new(),
            clock,
            refresh_period: Duration::from_secs_f64(1.0 / f64::from(refresh_hz)),
        }
    }

    /// Create a scheduler timed by the tokio clock
    pub fn with_monotonic_clock(snapshot: &CapabilitySnapshot, config: &SchedulerConfig) -> Self {
        Self::new(snapshot, config, Arc::new(MonotonicClock::new()))
    }

    /// Current tier (never blocks on a running frame)
    pub fn tier(&self) -> PerformanceTier {
        *self.tier_tx.borrow()
    }

    /// Subscribe to tier changes
    pub fn subscribe_tier(&self) -> watch::Receiver<PerformanceTier> {
        self.tier_tx.subscribe()
    }

    pub fn run_state(&self) -> RunState {
        if self.running.load(Ordering::Acquire) {
            RunState::Running
        } else {
            RunState::Idle
        }
    }

    /// Snapshot of the frame counters
    pub fn metrics(&self) -> FrameMetrics {
        let guard = self.exec.lock();
        let metrics = guard.borrow().metrics().clone();
        metrics
    }

    /// Enter `Running` under a fresh generation.
    ///
    /// Frames carrying an older ticket are cancelled from now on.
    pub fn arm(&self) -> FrameTicket {
        let guard = self.exec.lock();
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let was_running = self.running.swap(true, Ordering::AcqRel);
        if was_running {
            info!("Adaptive scheduler restarted (generation {generation})");
        } else {
            guard.borrow_mut().resume(self.clock.now_ms());
            info!("Adaptive scheduler started (generation {generation})");
        }
        FrameTicket { generation }
    }

    /// Stop the loop. Idempotent.
    ///
    /// Once this returns no frame callback runs until the next `arm`/`start`,
    /// including frames the host already queued.
    pub fn stop(&self) {
        let _guard = self.exec.lock();
        if self.running.swap(false, Ordering::AcqRel) {
            self.generation.fetch_add(1, Ordering::AcqRel);
            info!("Adaptive scheduler stopped");
        }
        self.stop_signal.notify_waiters();
    }

    fn is_current(&self, ticket: &FrameTicket) -> bool {
        self.running.load(Ordering::Acquire)
            && self.generation.load(Ordering::Acquire) == ticket.generation
    }

    fn stop_if_current(&self, ticket: &FrameTicket) {
        let _guard = self.exec.lock();
        if self.is_current(ticket) {
            self.stop();
        }
    }

    /// Handle one host refresh.
    ///
    /// Callback errors are returned unchanged; the frame is not counted.
    pub fn on_host_frame<F, E>(&self, ticket: &FrameTicket, callback: &mut F) -> Result<TickOutcome, E>
    where
        F: FnMut(&FrameInfo) -> Result<(), E>,
    {
        let guard = self.exec.lock();
        if !self.is_current(ticket) {
            return Ok(TickOutcome::Cancelled);
        }

        let now = self.clock.now_ms();
        let info = {
            let mut governor = guard.borrow_mut();
            if governor.admit(now) == FrameDecision::Skip {
                return Ok(TickOutcome::Skipped);
            }
            FrameInfo {
                tier: governor.tier(),
                frame_index: governor.metrics().frame_count,
                timestamp_ms: now,
            }
        };

        callback(&info)?;

        let finished = self.clock.now_ms();
        let change = guard.borrow_mut().record_executed(finished);
        if let Some(change) = change {
            info!(
                "Performance tier {} -> {} ({:.1} fps measured)",
                change.from, change.to, change.measured_fps
            );
            self.tier_tx.send_replace(change.to);
        }

        Ok(TickOutcome::Executed)
    }

    /// Spawn a self-driven loop on the tokio runtime.
    ///
    /// Calling this while a loop is running restarts it: the old loop exits
    /// at its next tick without running the callback. Counters carry over.
    pub fn start<F, E>(self: &Arc<Self>, mut callback: F) -> FrameLoopHandle<E>
    where
        F: FnMut(&FrameInfo) -> Result<(), E> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        let ticket = self.arm();
        let scheduler = Arc::clone(self);

        let join = tokio::spawn(async move {
            let mut interval = tokio::time::interval(scheduler.refresh_period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = scheduler.stop_signal.notified() => {}
                }

                match scheduler.on_host_frame(&ticket, &mut callback) {
                    Ok(TickOutcome::Cancelled) => {
                        debug!("Frame loop generation {} exiting", ticket.generation);
                        return Ok(());
                    }
                    Ok(_) => {}
                    Err(e) => {
                        error!("Frame callback failed, stopping loop: {e}");
                        scheduler.stop_if_current(&ticket);
                        return Err(e);
                    }
                }
            }
        });

        FrameLoopHandle { ticket, join }
    }
}

//! Adaptive frame scheduling
//!
//! A cooperative per-frame loop that starts in the tier chosen by the
//! capability probe and downgrades itself when measured throughput drops
//! below the configured floor.
//!
//! # Tiers
//!
//! - **Full**: every host refresh runs the frame callback
//! - **Reduced**: a refresh runs the callback only if ~33ms passed since the
//!   last executed one, capping the effective rate near 30 per second
//!
//! Every 60 executed frames the scheduler measures the rate since the
//! previous checkpoint. Below 30 fps in the full tier it switches to reduced.
//! It never switches back within a session.

mod clock;
mod governor;
mod runner;

pub use clock::{FrameClock, ManualClock, MonotonicClock};
pub use governor::{FrameDecision, FrameGovernor, FrameMetrics, TierChange};
pub use runner::{
    AdaptiveScheduler, FrameInfo, FrameLoopError, FrameLoopHandle, FrameTicket, RunState,
    TickOutcome,
};

//! Host capability detection
//!
//! Probes the host once at startup and classifies it as capable or low-end.
//! The resulting [`CapabilitySnapshot`] is the ground truth for the session;
//! it is never re-probed.
//!
//! # Signals
//!
//! - **Graphics context**: if none can be created the host is low-end
//!   regardless of anything else
//! - **Renderer string**: matched case-insensitively against low-end fragments
//!   (integrated, mobile and software GPUs)
//! - **Device memory**: defaults to 4 GB when the host does not say
//! - **Logical cores**: defaults to 4 when the host does not say
//!
//! # Usage
//!
//! ```ignore
//! use obsidian_resilience::capabilities::{CapabilityProbe, SystemGraphicsHost};
//!
//! let snapshot = CapabilityProbe::default().detect(&SystemGraphicsHost::new());
//! if snapshot.is_low_end() {
//!     // scheduler will start throttled
//! }
//! ```

mod host;
mod probe;
mod state;

pub use host::{
    environment, parse_mem_total_gb, parse_renderer_string, GraphicsContext, GraphicsHost,
    SystemGraphicsHost,
};
pub use probe::{CapabilityProbe, DEFAULT_LOW_END_KEYWORDS};
pub use state::{
    CapabilityClass, CapabilitySnapshot, LowEndReason, PerformanceTier, DEFAULT_CPU_CORES,
    DEFAULT_MEMORY_GB,
};

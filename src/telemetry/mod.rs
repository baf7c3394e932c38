//! Resource telemetry
//!
//! Periodic memory and uptime sampling for the performance overlay.

mod memory;
mod sampler;

pub use memory::{parse_vm_rss_bytes, MemoryProbe, NoMemoryProbe, ProcMemoryProbe};
pub use sampler::{ResourceSample, ResourceSampler, SampleSubscriber};

//! Host memory introspection

/// Reports heap usage if the host exposes it
pub trait MemoryProbe: Send + Sync {
    /// Used heap in bytes; `None` when the host has no memory introspection
    fn used_heap_bytes(&self) -> Option<u64>;
}

/// Resident set size of this process from `/proc/self/status`
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcMemoryProbe;

impl MemoryProbe for ProcMemoryProbe {
    fn used_heap_bytes(&self) -> Option<u64> {
        let status = std::fs::read_to_string("/proc/self/status").ok()?;
        parse_vm_rss_bytes(&status)
    }
}

/// Host without memory introspection
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMemoryProbe;

impl MemoryProbe for NoMemoryProbe {
    fn used_heap_bytes(&self) -> Option<u64> {
        None
    }
}

pub fn parse_vm_rss_bytes(status: &str) -> Option<u64> {
    let kb: u64 = status
        .lines()
        .find(|line| line.starts_with("VmRSS:"))?
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()?;
    Some(kb * 1024)
}

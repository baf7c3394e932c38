//! One-shot host capability probe
//!
//! Classifies the host as capable or low-end from the graphics context,
//! renderer string, memory hint and core hint.

use chrono::Utc;
use tracing::{debug, info};

use super::host::GraphicsHost;
use super::state::{
    CapabilityClass, CapabilitySnapshot, LowEndReason, DEFAULT_CPU_CORES, DEFAULT_MEMORY_GB,
};
use crate::config::types::ProbeConfig;

/// Renderer fragments that mark integrated, mobile or software GPUs
pub const DEFAULT_LOW_END_KEYWORDS: &[&str] = &[
    "intel",
    "integrated",
    "mobile",
    "adreno 3",
    "mali-4",
    "llvmpipe",
    "softpipe",
    "swrast",
];

/// Capability probe
pub struct CapabilityProbe {
    low_end_keywords: Vec<String>,
    min_memory_gb: f64,
    min_cpu_cores: u32,
}

impl Default for CapabilityProbe {
    fn default() -> Self {
        Self::new(&ProbeConfig::default())
    }
}

impl CapabilityProbe {
    pub fn new(config: &ProbeConfig) -> Self {
        Self {
            low_end_keywords: config
                .low_end_keywords
                .iter()
                .map(|k| k.to_lowercase())
                .collect(),
            min_memory_gb: config.min_memory_gb,
            min_cpu_cores: config.min_cpu_cores,
        }
    }

    /// Query the host once and build the session's snapshot.
    ///
    /// The graphics context is dropped before this returns.
    pub fn detect(&self, host: &dyn GraphicsHost) -> CapabilitySnapshot {
        info!("Probing host rendering capabilities...");

        let (graphics_available, renderer_signature) = match host.create_context() {
            Some(context) => {
                let renderer = context.renderer_signature();
                drop(context);
                (true, renderer)
            }
            None => (false, None),
        };
        debug!(
            "Graphics available: {}, renderer: {:?}",
            graphics_available, renderer_signature
        );

        let memory_hint = host.device_memory_gb();
        let cores_hint = host.logical_cores();
        debug!("Memory hint: {:?} GB, core hint: {:?}", memory_hint, cores_hint);

        let memory_gb = memory_hint.unwrap_or(DEFAULT_MEMORY_GB);
        let cpu_cores = cores_hint.unwrap_or(DEFAULT_CPU_CORES);

        let class = self.classify(
            graphics_available,
            renderer_signature.as_deref(),
            memory_gb,
            cpu_cores,
        );

        info!("Capability verdict: {:?}", class);

        CapabilitySnapshot {
            probed_at: Utc::now(),
            renderer_signature,
            memory_gb,
            memory_reported: memory_hint.is_some(),
            cpu_cores,
            cores_reported: cores_hint.is_some(),
            graphics_available,
            class,
        }
    }

    fn classify(
        &self,
        graphics_available: bool,
        renderer: Option<&str>,
        memory_gb: f64,
        cpu_cores: u32,
    ) -> CapabilityClass {
        if !graphics_available {
            return CapabilityClass::LowEnd {
                reasons: vec![LowEndReason::NoGraphicsContext],
            };
        }

        let mut reasons = Vec::new();

        if let Some(keyword) = renderer.and_then(|r| self.match_low_end_keyword(r)) {
            reasons.push(LowEndReason::LowEndRenderer { keyword });
        }
        if memory_gb < self.min_memory_gb {
            reasons.push(LowEndReason::LowMemory { memory_gb });
        }
        if cpu_cores < self.min_cpu_cores {
            reasons.push(LowEndReason::FewCores { cores: cpu_cores });
        }

        if reasons.is_empty() {
            CapabilityClass::Capable
        } else {
            CapabilityClass::LowEnd { reasons }
        }
    }

    /// Case-insensitive fragment match against the renderer string
    pub fn match_low_end_keyword(&self, renderer: &str) -> Option<String> {
        let renderer = renderer.to_lowercase();
        self.low_end_keywords
            .iter()
            .find(|keyword| renderer.contains(keyword.as_str()))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::*;
    use crate::capabilities::host::GraphicsContext;
    use crate::capabilities::PerformanceTier;

    struct FakeContext {
        renderer: Option<String>,
        released: Arc<AtomicUsize>,
    }

    impl GraphicsContext for FakeContext {
        fn renderer_signature(&self) -> Option<String> {
            self.renderer.clone()
        }
    }

    impl Drop for FakeContext {
        fn drop(&mut self) {
            self.released.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeHost {
        graphics: bool,
        renderer: Option<String>,
        memory_gb: Option<f64>,
        cores: Option<u32>,
        created: AtomicUsize,
        released: Arc<AtomicUsize>,
    }

    impl GraphicsHost for FakeHost {
        fn create_context(&self) -> Option<Box<dyn GraphicsContext + '_>> {
            if !self.graphics {
                return None;
            }
            self.created.fetch_add(1, Ordering::SeqCst);
            Some(Box::new(FakeContext {
                renderer: self.renderer.clone(),
                released: Arc::clone(&self.released),
            }))
        }

        fn device_memory_gb(&self) -> Option<f64> {
            self.memory_gb
        }

        fn logical_cores(&self) -> Option<u32> {
            self.cores
        }
    }

    fn strong_host() -> FakeHost {
        FakeHost {
            graphics: true,
            renderer: Some("NVIDIA GeForce RTX 3080/PCIe/SSE2".into()),
            memory_gb: Some(16.0),
            cores: Some(12),
            ..Default::default()
        }
    }

    #[test]
    fn test_capable_host() {
        let snapshot = CapabilityProbe::default().detect(&strong_host());
        assert!(snapshot.graphics_available);
        assert_eq!(snapshot.class, CapabilityClass::Capable);
        assert_eq!(snapshot.initial_tier(), PerformanceTier::Full);
        assert!(snapshot.memory_reported);
        assert!(snapshot.cores_reported);
    }

    #[test]
    fn test_no_graphics_is_low_end_regardless() {
        let host = FakeHost {
            graphics: false,
            ..strong_host()
        };
        let snapshot = CapabilityProbe::default().detect(&host);

        assert!(!snapshot.graphics_available);
        assert_eq!(
            snapshot.class,
            CapabilityClass::LowEnd {
                reasons: vec![LowEndReason::NoGraphicsContext]
            }
        );
        assert_eq!(snapshot.initial_tier(), PerformanceTier::Reduced);
    }

    #[test]
    fn test_renderer_keyword_case_insensitive() {
        let host = FakeHost {
            renderer: Some("ARM Mali-400 MP".into()),
            ..strong_host()
        };
        let snapshot = CapabilityProbe::default().detect(&host);
        assert_eq!(
            snapshot.class,
            CapabilityClass::LowEnd {
                reasons: vec![LowEndReason::LowEndRenderer {
                    keyword: "mali-4".into()
                }]
            }
        );
    }

    #[test]
    fn test_missing_hints_use_defaults() {
        let host = FakeHost {
            memory_gb: None,
            cores: None,
            ..strong_host()
        };
        let snapshot = CapabilityProbe::default().detect(&host);

        assert_eq!(snapshot.memory_gb, DEFAULT_MEMORY_GB);
        assert_eq!(snapshot.cpu_cores, DEFAULT_CPU_CORES);
        assert!(!snapshot.memory_reported);
        assert!(!snapshot.cores_reported);
        // Defaults sit exactly on the thresholds and are not low-end
        assert!(!snapshot.is_low_end());
    }

    #[test]
    fn test_low_memory_and_cores_collect_reasons() {
        let host = FakeHost {
            memory_gb: Some(2.0),
            cores: Some(2),
            ..strong_host()
        };
        let snapshot = CapabilityProbe::default().detect(&host);
        match snapshot.class {
            CapabilityClass::LowEnd { reasons } => {
                assert_eq!(reasons.len(), 2);
                assert!(reasons.contains(&LowEndReason::LowMemory { memory_gb: 2.0 }));
                assert!(reasons.contains(&LowEndReason::FewCores { cores: 2 }));
            }
            CapabilityClass::Capable => panic!("expected low-end verdict"),
        }
    }

    #[test]
    fn test_context_released_before_return() {
        let host = strong_host();
        let _ = CapabilityProbe::default().detect(&host);
        assert_eq!(host.created.load(Ordering::SeqCst), 1);
        assert_eq!(host.released.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_custom_keywords() {
        let config = ProbeConfig {
            low_end_keywords: vec!["Radeon".into()],
            ..ProbeConfig::default()
        };
        let probe = CapabilityProbe::new(&config);
        assert_eq!(
            probe.match_low_end_keyword("AMD Radeon Vega 8").as_deref(),
            Some("radeon")
        );
        assert!(probe.match_low_end_keyword("Intel UHD").is_none());
    }
}

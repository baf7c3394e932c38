//! Ordered text export pipeline
//!
//! Runs the delivery strategies in their fixed order until one succeeds.
//! When every strategy fails the payload comes back untouched in a
//! [`ManualHandoff`] so the caller can show it for manual copy or offer it
//! as a text download. Nothing here returns an error to the caller.

use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::host::{ClipboardHost, DownloadHost, HostError};
use super::strategy::{DeliveryStrategy, LegacyCopyStrategy, SecureClipboardStrategy, StrategyKind};
use crate::config::types::ExportConfig;

/// Whether a strategy delivered the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttemptOutcome {
    Success,
    Failed,
}

/// The strategy that ultimately handled an export call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportAttempt {
    pub strategy: StrategyKind,
    pub outcome: AttemptOutcome,
    pub detail: Option<String>,
}

/// Record of one strategy run inside a single export call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptResult {
    /// Strategy that ran
    pub strategy: StrategyKind,
    /// Did it succeed?
    pub success: bool,
    /// Error message if failed
    pub error: Option<String>,
    /// How long the attempt took (in milliseconds)
    pub duration_ms: u64,
}

impl AttemptResult {
    /// Create a successful attempt result
    pub fn success(strategy: StrategyKind, duration: Duration) -> Self {
        Self {
            strategy,
            success: true,
            error: None,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Create a failed attempt result
    pub fn failure(strategy: StrategyKind, error: impl Into<String>, duration: Duration) -> Self {
        Self {
            strategy,
            success: false,
            error: Some(error.into()),
            duration_ms: duration.as_millis() as u64,
        }
    }
}

/// Payload returned for explicit user action after every strategy failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualHandoff {
    /// The original payload, byte-for-byte
    pub payload: String,
    /// Filename to use if the user asks for a download
    pub suggested_filename: String,
}

impl ManualHandoff {
    pub const MIME_TYPE: &'static str = "text/plain";

    /// Offer the payload as a text file download
    pub async fn download(&self, downloads: &dyn DownloadHost) -> Result<String, HostError> {
        downloads
            .trigger_download(
                &self.suggested_filename,
                Self::MIME_TYPE,
                self.payload.as_bytes(),
            )
            .await
    }
}

/// Outcome of one export call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportReport {
    /// Final verdict
    pub attempt: ExportAttempt,
    /// Every strategy that ran, in order
    pub trail: Vec<AttemptResult>,
    /// Present when manual action is required
    pub manual: Option<ManualHandoff>,
}

impl ExportReport {
    pub fn delivered(&self) -> bool {
        self.attempt.outcome == AttemptOutcome::Success
    }

    pub fn requires_manual_action(&self) -> bool {
        self.manual.is_some()
    }

    /// Status line for the UI
    pub fn status_message(&self) -> &'static str {
        match (self.attempt.strategy, self.attempt.outcome) {
            (StrategyKind::SecureClipboard, AttemptOutcome::Success) => "Copied to clipboard",
            (StrategyKind::LegacyCopy, AttemptOutcome::Success) => {
                "Copied to clipboard (legacy method)"
            }
            _ => "Clipboard blocked - manual copy required",
        }
    }

    /// Format a detailed report of every attempt
    pub fn detailed_report(&self) -> String {
        let mut report = format!(
            "{} via {}\n",
            self.status_message(),
            self.attempt.strategy
        );
        for (i, attempt) in self.trail.iter().enumerate() {
            let status = if attempt.success { "✅" } else { "❌" };
            report.push_str(&format!(
                "  {}. {} {} ({}ms)\n",
                i + 1,
                status,
                attempt.strategy,
                attempt.duration_ms
            ));
            if let Some(err) = &attempt.error {
                report.push_str(&format!("      Error: {err}\n"));
            }
        }
        report
    }
}

/// Text export pipeline
pub struct ExportPipeline {
    strategies: Vec<Box<dyn DeliveryStrategy>>,
    text_filename_prefix: String,
}

impl Default for ExportPipeline {
    fn default() -> Self {
        Self::new(&ExportConfig::default())
    }
}

impl ExportPipeline {
    /// Pipeline with the standard order: secure clipboard, then legacy copy
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            strategies: vec![
                Box::new(SecureClipboardStrategy),
                Box::new(LegacyCopyStrategy),
            ],
            text_filename_prefix: config.text_filename_prefix.clone(),
        }
    }

    /// Automatic strategies, in the order they run
    pub fn strategies(&self) -> &[Box<dyn DeliveryStrategy>] {
        &self.strategies
    }

    /// Full fallback order, ending with manual fallback
    pub fn strategy_order(&self) -> Vec<StrategyKind> {
        self.strategies
            .iter()
            .map(|s| s.kind())
            .chain(std::iter::once(StrategyKind::ManualFallback))
            .collect()
    }

    /// Deliver `payload`, falling back strategy by strategy.
    ///
    /// Each strategy runs at most once per call.
    pub async fn export_text(&self, host: &dyn ClipboardHost, payload: &str) -> ExportReport {
        let mut trail = Vec::with_capacity(self.strategies.len());

        for strategy in &self.strategies {
            let kind = strategy.kind();
            let start = Instant::now();

            match strategy.deliver(host, payload).await {
                Ok(()) => {
                    info!("Export delivered via {} on {}", kind, host.name());
                    trail.push(AttemptResult::success(kind, start.elapsed()));
                    return ExportReport {
                        attempt: ExportAttempt {
                            strategy: kind,
                            outcome: AttemptOutcome::Success,
                            detail: None,
                        },
                        trail,
                        manual: None,
                    };
                }
                Err(e) => {
                    warn!("{} failed: {}", kind, e);
                    trail.push(AttemptResult::failure(kind, e.to_string(), start.elapsed()));
                }
            }
        }

        warn!("All clipboard strategies failed, manual copy required");

        let detail = trail
            .iter()
            .map(|a| {
                format!(
                    "{}: {}",
                    a.strategy,
                    a.error.as_deref().unwrap_or("unknown")
                )
            })
            .collect::<Vec<_>>()
            .join("; ");

        ExportReport {
            attempt: ExportAttempt {
                strategy: StrategyKind::ManualFallback,
                outcome: AttemptOutcome::Failed,
                detail: Some(detail),
            },
            trail,
            manual: Some(ManualHandoff {
                payload: payload.to_string(),
                suggested_filename: format!(
                    "{}-{}.txt",
                    self.text_filename_prefix,
                    Utc::now().timestamp_millis()
                ),
            }),
        }
    }
}

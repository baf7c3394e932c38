//! Text delivery strategies
//!
//! Each strategy is one concrete way of getting a payload onto the user's
//! clipboard. Strategies never retry; the pipeline decides what runs next.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::host::{ClipboardHost, HostError, SurfaceGuard};

/// Which strategy handled (or failed) an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StrategyKind {
    /// Secure-context clipboard write API
    SecureClipboard,
    /// Transient surface + host copy command
    LegacyCopy,
    /// Payload handed back for manual copy or download
    ManualFallback,
}

impl StrategyKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SecureClipboard => "Secure Clipboard",
            Self::LegacyCopy => "Legacy Copy",
            Self::ManualFallback => "Manual Fallback",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a read-only viability check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyProbe {
    /// Is this strategy viable?
    pub is_viable: bool,
    /// Why or why not
    pub reason: String,
    /// Additional details for diagnostics
    pub details: Option<String>,
}

impl StrategyProbe {
    /// Create a viable probe result
    pub fn viable(reason: impl Into<String>) -> Self {
        Self {
            is_viable: true,
            reason: reason.into(),
            details: None,
        }
    }

    /// Create a non-viable probe result
    pub fn not_viable(reason: impl Into<String>) -> Self {
        Self {
            is_viable: false,
            reason: reason.into(),
            details: None,
        }
    }

    /// Add details to the probe result
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Why a strategy failed to deliver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Preconditions not met; nothing was attempted
    #[error("Not viable: {0}")]
    NotViable(String),

    /// Host service error
    #[error(transparent)]
    Host(#[from] HostError),

    /// The host copy command reported failure
    #[error("Copy command failed")]
    CopyCommandFailed,
}

/// One step of the export fallback chain
#[async_trait]
pub trait DeliveryStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Read-only precondition check; no side effects
    fn probe(&self, host: &dyn ClipboardHost) -> StrategyProbe;

    /// Try to deliver `payload`
    async fn deliver(&self, host: &dyn ClipboardHost, payload: &str) -> Result<(), DeliveryError>;
}

/// Preconditions of the secure clipboard path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SecurePreconditions {
    pub api_present: bool,
    pub secure_context: bool,
}

impl SecurePreconditions {
    pub fn satisfied(&self) -> bool {
        self.api_present && self.secure_context
    }
}

/// Secure-context clipboard write
#[derive(Debug, Default, Clone, Copy)]
pub struct SecureClipboardStrategy;

impl SecureClipboardStrategy {
    pub fn preconditions(host: &dyn ClipboardHost) -> SecurePreconditions {
        SecurePreconditions {
            api_present: host.has_secure_clipboard(),
            secure_context: host.is_secure_context(),
        }
    }
}

#[async_trait]
impl DeliveryStrategy for SecureClipboardStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::SecureClipboard
    }

    fn probe(&self, host: &dyn ClipboardHost) -> StrategyProbe {
        let pre = Self::preconditions(host);
        match (pre.api_present, pre.secure_context) {
            (true, true) => StrategyProbe::viable("Clipboard API available in secure context"),
            (false, _) => StrategyProbe::not_viable("Clipboard API not supported"),
            (true, false) => StrategyProbe::not_viable("Insecure context")
                .with_details("The clipboard API only works in secure contexts"),
        }
    }

    async fn deliver(&self, host: &dyn ClipboardHost, payload: &str) -> Result<(), DeliveryError> {
        let probe = self.probe(host);
        if !probe.is_viable {
            return Err(DeliveryError::NotViable(probe.reason));
        }

        host.write_text(payload).await?;
        Ok(())
    }
}

/// Off-screen surface, select, copy command, remove
#[derive(Debug, Default, Clone, Copy)]
pub struct LegacyCopyStrategy;

#[async_trait]
impl DeliveryStrategy for LegacyCopyStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::LegacyCopy
    }

    fn probe(&self, _host: &dyn ClipboardHost) -> StrategyProbe {
        StrategyProbe::viable("Copy command is only known to work once attempted")
    }

    async fn deliver(&self, host: &dyn ClipboardHost, payload: &str) -> Result<(), DeliveryError> {
        let mut guard = SurfaceGuard::new(host.create_copy_surface(payload)?);
        debug!("Legacy copy surface created on {}", host.name());

        guard.surface().select()?;

        if guard.surface().copy_command().await {
            Ok(())
        } else {
            Err(DeliveryError::CopyCommandFailed)
        }
    }
}

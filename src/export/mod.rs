//! Resilient export
//!
//! [`MissionBrief`] composes the shared text payload. Text payloads go
//! through [`ExportPipeline`]: secure clipboard, then the legacy copy command,
//! then a [`ManualHandoff`] the caller presents to the user. Surface
//! snapshots go through [`ImageExporter`] and never fall back to text.
//!
//! Host services are reached through the traits in [`host`] so the same
//! pipeline runs against the native Linux hosts in [`system`] and against
//! test doubles.

pub mod brief;
pub mod host;
pub mod image;
pub mod pipeline;
pub mod strategy;
pub mod system;

pub use brief::{AgentFormation, MissionBrief, OperationalMetrics};
pub use host::{
    ClipboardHost, CopySurface, DownloadHost, HostError, PermissionState, RasterOptions,
    SurfaceGuard, SurfaceRenderer,
};
pub use image::{ImageExport, ImageExportError, ImageExporter};
pub use pipeline::{
    AttemptOutcome, AttemptResult, ExportAttempt, ExportPipeline, ExportReport, ManualHandoff,
};
pub use strategy::{
    DeliveryError, DeliveryStrategy, LegacyCopyStrategy, SecureClipboardStrategy,
    SecurePreconditions, StrategyKind, StrategyProbe,
};
pub use system::{SystemClipboardHost, SystemDownloadHost, UnsupportedRenderer};

//! Host clipboard, download and raster services consumed by the export
//! pipeline and the self-test harness.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a host service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    /// The host does not provide this service
    #[error("Not supported: {0}")]
    Unsupported(String),

    /// The host refused the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The service exists but the operation failed
    #[error("Operation failed: {0}")]
    Failed(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for HostError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

/// Grant state of the clipboard-write permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PermissionState {
    Granted,
    /// The user will be asked on first use
    Prompt,
    Denied,
}

/// Transient editable surface used by the legacy copy command
///
/// Owned by exactly one copy attempt. See [`SurfaceGuard`].
#[async_trait]
pub trait CopySurface: Send {
    /// Select the surface's full content
    fn select(&mut self) -> Result<(), HostError>;

    /// Invoke the host copy command on the current selection
    async fn copy_command(&mut self) -> bool;

    /// Detach and destroy the surface
    fn remove(&mut self);
}

/// Removes the wrapped surface when dropped, on every exit path
pub struct SurfaceGuard {
    surface: Box<dyn CopySurface>,
}

impl SurfaceGuard {
    pub fn new(surface: Box<dyn CopySurface>) -> Self {
        Self { surface }
    }

    pub fn surface(&mut self) -> &mut dyn CopySurface {
        self.surface.as_mut()
    }
}

impl Drop for SurfaceGuard {
    fn drop(&mut self) {
        self.surface.remove();
    }
}

/// Host clipboard service
#[async_trait]
pub trait ClipboardHost: Send + Sync {
    /// Host name for logging and diagnostics
    fn name(&self) -> &'static str;

    /// Whether the secure clipboard write API exists
    fn has_secure_clipboard(&self) -> bool;

    /// Whether the execution context counts as secure
    fn is_secure_context(&self) -> bool;

    /// Write text through the secure clipboard API
    async fn write_text(&self, text: &str) -> Result<(), HostError>;

    /// Query the clipboard-write permission (may be unsupported)
    async fn query_write_permission(&self) -> Result<PermissionState, HostError>;

    /// Create an off-screen editable surface holding `text`
    fn create_copy_surface(&self, text: &str) -> Result<Box<dyn CopySurface>, HostError>;
}

/// Host file download service
#[async_trait]
pub trait DownloadHost: Send + Sync {
    /// Offer `bytes` to the user as a file download.
    ///
    /// Returns a description of where the host put the file.
    async fn trigger_download(
        &self,
        filename: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<String, HostError>;
}

/// Raster parameters for surface snapshots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterOptions {
    /// Encoder quality in (0, 1]
    pub quality: f32,
    /// CSS color painted behind the surface
    pub background: String,
}

/// Host render-surface-to-image service
#[async_trait]
pub trait SurfaceRenderer: Send + Sync {
    /// Render the surface identified by `surface` to PNG bytes
    async fn render_png(&self, surface: &str, options: &RasterOptions)
        -> Result<Vec<u8>, HostError>;
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    struct CountingSurface(Arc<AtomicUsize>);

    #[async_trait]
    impl CopySurface for CountingSurface {
        fn select(&mut self) -> Result<(), HostError> {
            Err(HostError::Failed("not focusable".into()))
        }

        async fn copy_command(&mut self) -> bool {
            false
        }

        fn remove(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn select_through_guard(removed: &Arc<AtomicUsize>) -> Result<(), HostError> {
        let mut guard = SurfaceGuard::new(Box::new(CountingSurface(Arc::clone(removed))));
        guard.surface().select()?;
        Ok(())
    }

    #[test]
    fn test_guard_removes_on_early_return() {
        let removed = Arc::new(AtomicUsize::new(0));
        assert!(select_through_guard(&removed).is_err());
        assert_eq!(removed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_host_error_from_io() {
        let err: HostError = std::io::Error::other("disk full").into();
        assert_eq!(err, HostError::Io("disk full".into()));
        assert_eq!(err.to_string(), "IO error: disk full");
    }
}

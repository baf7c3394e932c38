//! In-crate host doubles for unit tests

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::capabilities::{CapabilityClass, CapabilitySnapshot};
use crate::export::{
    ClipboardHost, CopySurface, DownloadHost, HostError, PermissionState, RasterOptions,
    SurfaceRenderer,
};

/// Snapshot with default hardware and the given classification
pub fn snapshot(class: CapabilityClass) -> CapabilitySnapshot {
    CapabilitySnapshot {
        probed_at: Utc::now(),
        renderer_signature: Some("Mock Renderer".to_string()),
        memory_gb: 8.0,
        memory_reported: true,
        cpu_cores: 8,
        cores_reported: true,
        graphics_available: true,
        class,
    }
}

#[derive(Default)]
struct ClipboardLog {
    written: Vec<String>,
    write_attempts: usize,
    copied: Vec<String>,
    surfaces_created: usize,
    surfaces_removed: usize,
}

pub struct MockClipboardHost {
    secure_api: bool,
    secure_context: bool,
    write_error: Option<HostError>,
    permission: Result<PermissionState, HostError>,
    copy_command: bool,
    select_fails: bool,
    surface_error: Option<HostError>,
    log: Arc<Mutex<ClipboardLog>>,
}

pub struct MockClipboardHostBuilder {
    host: MockClipboardHost,
}

impl MockClipboardHostBuilder {
    pub fn secure_api(mut self, present: bool) -> Self {
        self.host.secure_api = present;
        self
    }

    pub fn secure_context(mut self, secure: bool) -> Self {
        self.host.secure_context = secure;
        self
    }

    pub fn write_error(mut self, error: HostError) -> Self {
        self.host.write_error = Some(error);
        self
    }

    pub fn permission(mut self, state: PermissionState) -> Self {
        self.host.permission = Ok(state);
        self
    }

    pub fn permission_error(mut self, error: HostError) -> Self {
        self.host.permission = Err(error);
        self
    }

    pub fn copy_command(mut self, succeeds: bool) -> Self {
        self.host.copy_command = succeeds;
        self
    }

    pub fn select_fails(mut self, fails: bool) -> Self {
        self.host.select_fails = fails;
        self
    }

    /// Make surface creation fail, as on a host with no copy tool
    pub fn surface_error(mut self, error: HostError) -> Self {
        self.host.surface_error = Some(error);
        self
    }

    pub fn build(self) -> MockClipboardHost {
        self.host
    }
}

impl MockClipboardHost {
    pub fn builder() -> MockClipboardHostBuilder {
        MockClipboardHostBuilder {
            host: MockClipboardHost {
                secure_api: true,
                secure_context: true,
                write_error: None,
                permission: Ok(PermissionState::Granted),
                copy_command: true,
                select_fails: false,
                surface_error: None,
                log: Arc::new(Mutex::new(ClipboardLog::default())),
            },
        }
    }

    /// Text delivered through the secure API
    pub fn written(&self) -> Vec<String> {
        self.log.lock().written.clone()
    }

    pub fn write_attempts(&self) -> usize {
        self.log.lock().write_attempts
    }

    /// Text delivered through the legacy copy command
    pub fn copied(&self) -> Vec<String> {
        self.log.lock().copied.clone()
    }

    pub fn surfaces_created(&self) -> usize {
        self.log.lock().surfaces_created
    }

    pub fn surfaces_removed(&self) -> usize {
        self.log.lock().surfaces_removed
    }
}

#[async_trait]
impl ClipboardHost for MockClipboardHost {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn has_secure_clipboard(&self) -> bool {
        self.secure_api
    }

    fn is_secure_context(&self) -> bool {
        self.secure_context
    }

    async fn write_text(&self, text: &str) -> Result<(), HostError> {
        let mut log = self.log.lock();
        log.write_attempts += 1;
        match &self.write_error {
            Some(e) => Err(e.clone()),
            None => {
                log.written.push(text.to_string());
                Ok(())
            }
        }
    }

    async fn query_write_permission(&self) -> Result<PermissionState, HostError> {
        self.permission.clone()
    }

    fn create_copy_surface(&self, text: &str) -> Result<Box<dyn CopySurface>, HostError> {
        if let Some(e) = &self.surface_error {
            return Err(e.clone());
        }
        self.log.lock().surfaces_created += 1;
        Ok(Box::new(MockSurface {
            text: text.to_string(),
            copy_command: self.copy_command,
            select_fails: self.select_fails,
            selected: false,
            log: Arc::clone(&self.log),
        }))
    }
}

struct MockSurface {
    text: String,
    copy_command: bool,
    select_fails: bool,
    selected: bool,
    log: Arc<Mutex<ClipboardLog>>,
}

#[async_trait]
impl CopySurface for MockSurface {
    fn select(&mut self) -> Result<(), HostError> {
        if self.select_fails {
            return Err(HostError::Failed("surface not focusable".into()));
        }
        self.selected = true;
        Ok(())
    }

    async fn copy_command(&mut self) -> bool {
        if self.selected && self.copy_command {
            self.log.lock().copied.push(self.text.clone());
            true
        } else {
            false
        }
    }

    fn remove(&mut self) {
        self.log.lock().surfaces_removed += 1;
    }
}

/// Records downloads instead of writing them
#[derive(Default)]
pub struct MockDownloads {
    saved: Mutex<Vec<(String, String, Vec<u8>)>>,
}

impl MockDownloads {
    /// `(filename, mime_type, bytes)` per download
    pub fn saved(&self) -> Vec<(String, String, Vec<u8>)> {
        self.saved.lock().clone()
    }
}

#[async_trait]
impl DownloadHost for MockDownloads {
    async fn trigger_download(
        &self,
        filename: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<String, HostError> {
        self.saved
            .lock()
            .push((filename.to_string(), mime_type.to_string(), bytes.to_vec()));
        Ok(format!("mock://{filename}"))
    }
}

pub struct MockRenderer {
    result: Result<Vec<u8>, HostError>,
    last_options: Mutex<Option<RasterOptions>>,
}

impl MockRenderer {
    pub fn ok(png: Vec<u8>) -> Self {
        Self {
            result: Ok(png),
            last_options: Mutex::new(None),
        }
    }

    pub fn failing(error: HostError) -> Self {
        Self {
            result: Err(error),
            last_options: Mutex::new(None),
        }
    }

    pub fn last_options(&self) -> Option<RasterOptions> {
        self.last_options.lock().clone()
    }
}

#[async_trait]
impl SurfaceRenderer for MockRenderer {
    async fn render_png(
        &self,
        _surface: &str,
        options: &RasterOptions,
    ) -> Result<Vec<u8>, HostError> {
        *self.last_options.lock() = Some(options.clone());
        self.result.clone()
    }
}

//! Native Linux export hosts
//!
//! The secure clipboard path writes through the Wayland data-control protocol
//! with `wl-clipboard-rs`. The legacy path stages the payload in a private
//! temporary file and pipes it through `xclip` (or `xsel`), which also works
//! under XWayland. Downloads land in a directory on disk.

use std::{io::Write, path::PathBuf, process::Stdio};

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, warn};
use wl_clipboard_rs::copy as wl_copy;

use super::host::{
    ClipboardHost, CopySurface, DownloadHost, HostError, PermissionState, RasterOptions,
    SurfaceRenderer,
};
use crate::capabilities::environment::{self, DisplayServer};

/// Clipboard host backed by wl-clipboard-rs and xclip/xsel
#[derive(Debug, Clone)]
pub struct SystemClipboardHost {
    display_server: Option<DisplayServer>,
    wayland_socket: bool,
    legacy_tool: Option<LegacyTool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LegacyTool {
    Xclip,
    Xsel,
}

impl LegacyTool {
    fn command(&self) -> Command {
        match self {
            Self::Xclip => {
                let mut cmd = Command::new("xclip");
                cmd.args(["-selection", "clipboard", "-i"]);
                cmd
            }
            Self::Xsel => {
                let mut cmd = Command::new("xsel");
                cmd.args(["--clipboard", "--input"]);
                cmd
            }
        }
    }
}

impl Default for SystemClipboardHost {
    fn default() -> Self {
        Self::detect()
    }
}

impl SystemClipboardHost {
    /// Detect the display server and available clipboard tools
    pub fn detect() -> Self {
        let display_server = environment::detect_display_server();
        let wayland_socket = std::env::var_os("WAYLAND_DISPLAY").is_some();
        let legacy_tool = if environment::command_available("xclip") {
            Some(LegacyTool::Xclip)
        } else if environment::command_available("xsel") {
            Some(LegacyTool::Xsel)
        } else {
            None
        };

        debug!(
            "Clipboard host: display={:?}, wayland_socket={}, legacy={:?}",
            display_server, wayland_socket, legacy_tool
        );

        Self {
            display_server,
            wayland_socket,
            legacy_tool,
        }
    }
}

#[async_trait]
impl ClipboardHost for SystemClipboardHost {
    fn name(&self) -> &'static str {
        match self.display_server {
            Some(DisplayServer::Wayland) => "wayland",
            Some(DisplayServer::X11) => "x11",
            None => "headless",
        }
    }

    fn has_secure_clipboard(&self) -> bool {
        self.wayland_socket
    }

    fn is_secure_context(&self) -> bool {
        self.display_server == Some(DisplayServer::Wayland)
    }

    /// Offer `text` as the Wayland selection.
    ///
    /// The selection is served from a background thread for as long as this
    /// process lives or until another client replaces it.
    async fn write_text(&self, text: &str) -> Result<(), HostError> {
        let bytes = text.as_bytes().to_vec().into_boxed_slice();
        let len = bytes.len();

        tokio::task::spawn_blocking(move || {
            wl_copy::copy(
                wl_copy::Options::new(),
                wl_copy::Source::Bytes(bytes),
                wl_copy::MimeType::Text,
            )
            .map_err(map_copy_error)
        })
        .await
        .map_err(|e| HostError::Failed(format!("clipboard task panicked: {e}")))??;

        debug!("wl-clipboard: offered {} bytes as text", len);
        Ok(())
    }

    async fn query_write_permission(&self) -> Result<PermissionState, HostError> {
        Err(HostError::Unsupported(
            "clipboard permission query".to_string(),
        ))
    }

    fn create_copy_surface(&self, text: &str) -> Result<Box<dyn CopySurface>, HostError> {
        let tool = self
            .legacy_tool
            .ok_or_else(|| HostError::Unsupported("xclip or xsel required".to_string()))?;

        Ok(Box::new(TempFileSurface::stage(text, tool)?))
    }
}

fn map_copy_error(e: wl_copy::Error) -> HostError {
    match e {
        wl_copy::Error::MissingProtocol { .. } => {
            HostError::Unsupported(format!("wl-clipboard: {e}"))
        }
        other => HostError::Failed(format!("wl-clipboard copy failed: {other}")),
    }
}

/// Private temporary file holding the payload for the legacy copy command
///
/// Created `0600` with `O_EXCL`; the file is unlinked on `remove` or drop.
struct TempFileSurface {
    file: Option<NamedTempFile>,
    tool: LegacyTool,
    selected: bool,
}

impl TempFileSurface {
    fn stage(text: &str, tool: LegacyTool) -> Result<Self, HostError> {
        let mut file = tempfile::Builder::new()
            .prefix("obsidian-copy-")
            .suffix(".txt")
            .tempfile()?;
        file.write_all(text.as_bytes())?;
        file.flush()?;
        debug!("Staged copy surface at {:?}", file.path());

        Ok(Self {
            file: Some(file),
            tool,
            selected: false,
        })
    }
}

#[async_trait]
impl CopySurface for TempFileSurface {
    fn select(&mut self) -> Result<(), HostError> {
        if self.file.is_none() {
            return Err(HostError::Failed("copy surface already removed".to_string()));
        }
        self.selected = true;
        Ok(())
    }

    async fn copy_command(&mut self) -> bool {
        if !self.selected {
            return false;
        }
        let Some(file) = &self.file else {
            return false;
        };

        let input = match file.reopen() {
            Ok(f) => f,
            Err(e) => {
                warn!("Cannot reopen copy surface: {e}");
                return false;
            }
        };

        match self
            .tool
            .command()
            .stdin(Stdio::from(input))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
        {
            Ok(status) => status.success(),
            Err(e) => {
                warn!("Copy command failed to launch: {e}");
                false
            }
        }
    }

    fn remove(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = file.close() {
                debug!("Copy surface already gone: {e}");
            }
        }
    }
}

/// Writes downloads into a directory
#[derive(Debug, Clone)]
pub struct SystemDownloadHost {
    dir: PathBuf,
}

impl SystemDownloadHost {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }
}

#[async_trait]
impl DownloadHost for SystemDownloadHost {
    async fn trigger_download(
        &self,
        filename: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<String, HostError> {
        if filename.contains('/') || filename.contains("..") {
            return Err(HostError::Failed(format!("invalid filename: {filename}")));
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(filename);
        tokio::fs::write(&path, bytes).await?;

        info!("Saved {} ({} bytes, {})", path.display(), bytes.len(), mime_type);
        Ok(path.display().to_string())
    }
}

/// Renderer for hosts with no visual surface to capture
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedRenderer;

#[async_trait]
impl SurfaceRenderer for UnsupportedRenderer {
    async fn render_png(
        &self,
        surface: &str,
        _options: &RasterOptions,
    ) -> Result<Vec<u8>, HostError> {
        Err(HostError::Unsupported(format!(
            "no render surface '{surface}' on this host"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_download_host_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let host = SystemDownloadHost::new(dir.path().join("downloads"));

        let location = host
            .trigger_download("trs-mission-brief-1.txt", "text/plain", b"brief")
            .await
            .unwrap();

        assert!(location.ends_with("trs-mission-brief-1.txt"));
        let content = std::fs::read(dir.path().join("downloads/trs-mission-brief-1.txt")).unwrap();
        assert_eq!(content, b"brief");
    }

    #[tokio::test]
    async fn test_download_host_rejects_path_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let host = SystemDownloadHost::new(dir.path().to_path_buf());
        let result = host
            .trigger_download("../escape.txt", "text/plain", b"x")
            .await;
        assert!(matches!(result, Err(HostError::Failed(_))));
    }

    #[tokio::test]
    async fn test_temp_surface_is_private_and_removed_once() {
        use std::os::unix::fs::PermissionsExt;

        let mut surface = TempFileSurface::stage("classified brief", LegacyTool::Xclip).unwrap();
        let path = surface.file.as_ref().unwrap().path().to_path_buf();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "classified brief");
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        // Copy without a selection never runs the tool
        assert!(!surface.copy_command().await);
        surface.select().unwrap();

        surface.remove();
        surface.remove();
        assert!(!path.exists());
        assert!(surface.select().is_err());
        assert!(!surface.copy_command().await);
    }

    #[test]
    fn test_dropped_surface_leaves_no_file() {
        let surface = TempFileSurface::stage("brief", LegacyTool::Xsel).unwrap();
        let path = surface.file.as_ref().unwrap().path().to_path_buf();
        assert!(path.exists());

        drop(surface);
        assert!(!path.exists());
    }

    #[test]
    fn test_detect_matches_environment() {
        let host = SystemClipboardHost::detect();
        let expected = match environment::detect_display_server() {
            Some(DisplayServer::Wayland) => "wayland",
            Some(DisplayServer::X11) => "x11",
            None => "headless",
        };
        assert_eq!(host.name(), expected);
        assert_eq!(
            host.has_secure_clipboard(),
            std::env::var_os("WAYLAND_DISPLAY").is_some()
        );
    }

    #[test]
    fn test_headless_host_has_no_copy_surface() {
        let host = SystemClipboardHost {
            display_server: None,
            wayland_socket: false,
            legacy_tool: None,
        };

        assert_eq!(host.name(), "headless");
        assert!(!host.has_secure_clipboard());
        assert!(!host.is_secure_context());
        assert!(matches!(
            host.create_copy_surface("brief"),
            Err(HostError::Unsupported(_))
        ));
    }

    #[tokio::test]
    async fn test_unsupported_renderer() {
        let options = RasterOptions {
            quality: 0.8,
            background: "#0f172a".into(),
        };
        let err = UnsupportedRenderer
            .render_png("mission-card", &options)
            .await
            .unwrap_err();
        assert!(matches!(err, HostError::Unsupported(_)));
    }
}

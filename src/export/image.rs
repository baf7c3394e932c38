//! Surface snapshot export
//!
//! Renders a designated surface to PNG and offers it as a download. This is
//! independent of the text strategies: a failure here is reported as-is and
//! never falls back to text export.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use super::host::{DownloadHost, HostError, RasterOptions, SurfaceRenderer};
use crate::config::types::{ExportConfig, Theme};

/// Image export failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageExportError {
    #[error("Image generation failed: {0}")]
    Render(HostError),

    #[error("Renderer produced an empty image")]
    EmptyImage,

    #[error("Image download failed: {0}")]
    Download(HostError),
}

/// A delivered snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageExport {
    pub filename: String,
    pub size_bytes: usize,
    /// Where the host put the file
    pub location: String,
}

pub struct ImageExporter {
    quality: f32,
    dark_background: String,
    light_background: String,
    default_theme: Theme,
    filename_prefix: String,
}

impl ImageExporter {
    pub const MIME_TYPE: &'static str = "image/png";

    pub fn new(config: &ExportConfig) -> Self {
        Self {
            quality: config.image_quality,
            dark_background: config.background_for(Theme::Dark).to_string(),
            light_background: config.background_for(Theme::Light).to_string(),
            default_theme: config.theme(),
            filename_prefix: config.image_filename_prefix.clone(),
        }
    }

    pub fn default_theme(&self) -> Theme {
        self.default_theme
    }

    /// Raster parameters for a snapshot taken in `theme`
    pub fn options(&self, theme: Theme) -> RasterOptions {
        let background = match theme {
            Theme::Dark => &self.dark_background,
            Theme::Light => &self.light_background,
        };
        RasterOptions {
            quality: self.quality,
            background: background.clone(),
        }
    }

    /// Render `surface` in the theme currently on screen and trigger a
    /// download of the PNG
    pub async fn export(
        &self,
        renderer: &dyn SurfaceRenderer,
        downloads: &dyn DownloadHost,
        surface: &str,
        theme: Theme,
    ) -> Result<ImageExport, ImageExportError> {
        info!("Generating {theme:?} snapshot of surface '{surface}'...");

        let png = renderer
            .render_png(surface, &self.options(theme))
            .await
            .map_err(|e| {
                warn!("Snapshot render failed: {e}");
                ImageExportError::Render(e)
            })?;

        if png.is_empty() {
            return Err(ImageExportError::EmptyImage);
        }

        let filename = format!(
            "{}-{}.png",
            self.filename_prefix,
            Utc::now().timestamp_millis()
        );

        let location = downloads
            .trigger_download(&filename, Self::MIME_TYPE, &png)
            .await
            .map_err(ImageExportError::Download)?;

        info!("Snapshot downloaded: {location}");

        Ok(ImageExport {
            filename,
            size_bytes: png.len(),
            location,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockDownloads, MockRenderer};

    #[tokio::test]
    async fn test_export_downloads_png() {
        let renderer = MockRenderer::ok(vec![0x89, b'P', b'N', b'G']);
        let downloads = MockDownloads::default();
        let exporter = ImageExporter::new(&ExportConfig::default());

        let export = exporter
            .export(&renderer, &downloads, "mission-card", exporter.default_theme())
            .await
            .unwrap();

        assert!(export.filename.starts_with("trs-mission-"));
        assert!(export.filename.ends_with(".png"));
        assert_eq!(export.size_bytes, 4);

        let saved = downloads.saved();
        assert_eq!(saved[0].1, "image/png");

        let options = renderer.last_options().unwrap();
        assert_eq!(options.quality, 0.8);
        assert_eq!(options.background, "#0f172a");
    }

    #[tokio::test]
    async fn test_render_failure_reports_detail_without_download() {
        let renderer = MockRenderer::failing(HostError::Failed("tainted canvas".into()));
        let downloads = MockDownloads::default();
        let exporter = ImageExporter::new(&ExportConfig::default());

        let err = exporter
            .export(&renderer, &downloads, "mission-card", Theme::Dark)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Image generation failed: Operation failed: tainted canvas"
        );
        assert!(downloads.saved().is_empty());
    }

    #[test]
    fn test_light_default_theme_background() {
        let config = ExportConfig {
            dark_theme: false,
            ..ExportConfig::default()
        };
        let exporter = ImageExporter::new(&config);
        assert_eq!(exporter.default_theme(), Theme::Light);
        assert_eq!(exporter.options(exporter.default_theme()).background, "#ffffff");
    }

    #[tokio::test]
    async fn test_theme_follows_each_call() {
        let renderer = MockRenderer::ok(vec![1, 2, 3]);
        let downloads = MockDownloads::default();
        let exporter = ImageExporter::new(&ExportConfig::default());

        exporter
            .export(&renderer, &downloads, "mission-card", Theme::Light)
            .await
            .unwrap();
        assert_eq!(renderer.last_options().unwrap().background, "#ffffff");

        exporter
            .export(&renderer, &downloads, "mission-card", Theme::Dark)
            .await
            .unwrap();
        assert_eq!(renderer.last_options().unwrap().background, "#0f172a");
        assert_eq!(downloads.saved().len(), 2);
    }
}

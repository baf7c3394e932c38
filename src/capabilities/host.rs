//! Host graphics/hardware queries consumed by the capability probe.
//!
//! Every query is best-effort. `None` means "the host did not tell us", and
//! the probe substitutes a conservative default.

use std::{path::Path, process::Command};

use tracing::debug;

/// A live graphics context created for the duration of a probe.
///
/// Dropping the context releases whatever the host allocated for it.
pub trait GraphicsContext {
    /// Unmasked renderer identification string, if the host exposes one
    fn renderer_signature(&self) -> Option<String>;
}

/// Host capability queries
pub trait GraphicsHost {
    /// Try to create a graphics context; `None` when graphics are unavailable
    fn create_context(&self) -> Option<Box<dyn GraphicsContext + '_>>;

    /// Device memory hint in GB
    fn device_memory_gb(&self) -> Option<f64>;

    /// Logical core count hint
    fn logical_cores(&self) -> Option<u32>;
}

/// Environment helpers shared by the native host implementations
pub mod environment {
    use super::{Command, Path};

    pub fn path_exists(path: impl AsRef<Path>) -> bool {
        path.as_ref().exists()
    }

    pub fn command_available(cmd: &str) -> bool {
        Command::new("which")
            .arg(cmd)
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    pub fn run_command(cmd: &str, args: &[&str]) -> Result<String, std::io::Error> {
        let output = Command::new(cmd).args(args).output()?;

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(std::io::Error::other(
                String::from_utf8_lossy(&output.stderr).to_string(),
            ))
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
    pub enum DisplayServer {
        Wayland,
        X11,
    }

    pub fn detect_display_server() -> Option<DisplayServer> {
        if std::env::var("WAYLAND_DISPLAY").is_ok() {
            Some(DisplayServer::Wayland)
        } else if std::env::var("DISPLAY").is_ok() {
            Some(DisplayServer::X11)
        } else {
            None
        }
    }
}

/// Native Linux host: DRI device nodes, `glxinfo`, `/proc/meminfo`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemGraphicsHost;

/// Context backed by a DRI render node
struct DriContext {
    renderer: Option<String>,
}

impl GraphicsContext for DriContext {
    fn renderer_signature(&self) -> Option<String> {
        self.renderer.clone()
    }
}

impl SystemGraphicsHost {
    pub fn new() -> Self {
        Self
    }

    fn query_renderer() -> Option<String> {
        let output = environment::run_command("glxinfo", &["-B"]).ok()?;
        parse_renderer_string(&output)
    }
}

impl GraphicsHost for SystemGraphicsHost {
    fn create_context(&self) -> Option<Box<dyn GraphicsContext + '_>> {
        if environment::detect_display_server().is_none() {
            debug!("No display server - no graphics context");
            return None;
        }

        if !environment::path_exists("/dev/dri") {
            debug!("No /dev/dri - no graphics context");
            return None;
        }

        let renderer = Self::query_renderer();
        debug!("Renderer string: {:?}", renderer);
        Some(Box::new(DriContext { renderer }))
    }

    fn device_memory_gb(&self) -> Option<f64> {
        let content = std::fs::read_to_string("/proc/meminfo").ok()?;
        parse_mem_total_gb(&content)
    }

    fn logical_cores(&self) -> Option<u32> {
        std::thread::available_parallelism()
            .ok()
            .and_then(|n| u32::try_from(n.get()).ok())
    }
}

/// Extract the `OpenGL renderer string:` value from `glxinfo -B` output
pub fn parse_renderer_string(output: &str) -> Option<String> {
    output
        .lines()
        .find(|line| line.contains("OpenGL renderer string:"))
        .and_then(|line| line.split_once(':'))
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Parse `MemTotal:` (kB) from `/proc/meminfo`, rounded to whole GB.
///
/// Firmware reservations make a 4 GB machine report slightly less, so the
/// value is rounded rather than truncated.
pub fn parse_mem_total_gb(meminfo: &str) -> Option<f64> {
    let kb: u64 = meminfo
        .lines()
        .find(|line| line.starts_with("MemTotal:"))?
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()?;

    Some((kb as f64 / (1024.0 * 1024.0)).round())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_renderer_string() {
        let output = "name of display: :0\n\
                      OpenGL vendor string: Intel\n\
                      OpenGL renderer string: Mesa Intel(R) UHD Graphics 620 (KBL GT2)\n\
                      OpenGL core profile version string: 4.6";
        assert_eq!(
            parse_renderer_string(output).as_deref(),
            Some("Mesa Intel(R) UHD Graphics 620 (KBL GT2)")
        );
        assert!(parse_renderer_string("no renderer here").is_none());
    }

    #[test]
    fn test_parse_mem_total() {
        let meminfo = "MemTotal:       16303412 kB\nMemFree:         1234 kB\n";
        assert_eq!(parse_mem_total_gb(meminfo), Some(16.0));
        assert_eq!(parse_mem_total_gb("MemTotal:        3884212 kB\n"), Some(4.0));
        assert_eq!(parse_mem_total_gb("MemFree: 12 kB"), None);
    }
}

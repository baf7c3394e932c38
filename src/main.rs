//! obsidian-resilience - dashboard resilience toolkit
//!
//! Entry point for the CLI binary.

use std::{
    convert::Infallible,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result};
use clap::Parser;
use obsidian_resilience::{
    capabilities::{CapabilityProbe, SystemGraphicsHost},
    config::{self, Config},
    diagnostics::SelfTestHarness,
    export::{
        ExportPipeline, MissionBrief, StrategyKind, SystemClipboardHost, SystemDownloadHost,
    },
    scheduler::{AdaptiveScheduler, FrameInfo},
    telemetry::{ProcMemoryProbe, ResourceSampler},
};
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Command-line arguments for obsidian-resilience
#[derive(Parser, Debug)]
#[command(name = "obsidian-resilience")]
#[command(version, about = "Dashboard resilience toolkit", long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, env = "OBSIDIAN_CONFIG")]
    pub config: Option<String>,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact)
    #[arg(long, default_value = "pretty")]
    pub log_format: String,

    /// Write logs to file (in addition to stdout)
    #[arg(long)]
    pub log_file: Option<String>,

    /// Show detected capabilities and the initial performance tier, then exit
    #[arg(long)]
    pub show_capabilities: bool,

    /// Output format for --show-capabilities and --diagnose (text|json)
    #[arg(long, default_value = "text")]
    pub format: String,

    /// Run the clipboard self-test and exit
    #[arg(long)]
    pub diagnose: bool,

    /// Export TEXT through the clipboard fallback chain
    #[arg(long, value_name = "TEXT")]
    pub copy: Option<String>,

    /// Export the mission brief through the clipboard fallback chain
    #[arg(long)]
    pub brief: bool,

    /// With --brief: read brief fields from a JSON file (missing fields use defaults)
    #[arg(long, value_name = "FILE", requires = "brief")]
    pub brief_file: Option<PathBuf>,

    /// With --copy or --brief: save the text as a download when manual action is required
    #[arg(long)]
    pub save_on_fallback: bool,

    /// Directory downloads are written to
    #[arg(long, env = "OBSIDIAN_DOWNLOAD_DIR")]
    pub download_dir: Option<PathBuf>,

    /// Use the light theme background for snapshots
    #[arg(long)]
    pub light: bool,

    /// Run the adaptive scheduler and resource sampler for SECS seconds
    #[arg(long, value_name = "SECS")]
    pub monitor: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config::default_config_path().display().to_string());

    // Missing config is normal on first run
    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            if Path::new(&config_path).exists() {
                eprintln!("Warning: {e:#} - using defaults");
            }
            Config::default_config()
        }
    };

    init_logging(&args, &config.logging)?;

    info!("════════════════════════════════════════════════════════");
    info!("  obsidian-resilience v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "  Built: {} {}",
        option_env!("BUILD_DATE").unwrap_or("unknown"),
        option_env!("BUILD_TIME").unwrap_or("")
    );
    info!("  Commit: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    info!("════════════════════════════════════════════════════════");

    let config = config.with_overrides(args.download_dir.clone(), args.light);
    config.validate().context("Invalid configuration")?;
    tracing::debug!("Config: {:?}", config);

    if args.show_capabilities {
        return show_capabilities(&config, &args.format);
    }

    if args.diagnose {
        return run_diagnostics(&config, &args.format).await;
    }

    if let Some(text) = &args.copy {
        return copy_text(&config, text, args.save_on_fallback).await;
    }

    if args.brief {
        let brief = load_brief(args.brief_file.as_deref())?;
        return copy_text(&config, &brief.compose(), args.save_on_fallback).await;
    }

    if let Some(secs) = args.monitor {
        return monitor(&config, Duration::from_secs(secs)).await;
    }

    println!("Nothing to do. See --help.");
    Ok(())
}

fn show_capabilities(config: &Config, format: &str) -> Result<()> {
    let probe = CapabilityProbe::new(&config.probe);
    let snapshot = probe.detect(&SystemGraphicsHost::new());

    if format == "json" {
        let json = serde_json::json!({
            "snapshot": snapshot,
            "initial_tier": snapshot.initial_tier(),
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).context("Failed to serialize capabilities")?
        );
    } else {
        println!("\n=== Host Capabilities ===\n");
        println!(
            "  Renderer: {}",
            snapshot.renderer_signature.as_deref().unwrap_or("unknown")
        );
        println!(
            "  Memory:   {} GB{}",
            snapshot.memory_gb,
            if snapshot.memory_reported { "" } else { " (default)" }
        );
        println!(
            "  Cores:    {}{}",
            snapshot.cpu_cores,
            if snapshot.cores_reported { "" } else { " (default)" }
        );
        println!(
            "  Graphics: {}",
            if snapshot.graphics_available { "available" } else { "unavailable" }
        );
        println!("\n  {}", snapshot.summary());
        println!("  Initial tier: {}\n", snapshot.initial_tier().label());
    }

    Ok(())
}

async fn run_diagnostics(config: &Config, format: &str) -> Result<()> {
    let host = SystemClipboardHost::detect();
    let pipeline = ExportPipeline::new(&config.export);

    let report = SelfTestHarness::new(&config.export).run(&host).await;

    if format == "json" {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to serialize report")?
        );
        return Ok(());
    }

    print!("{}", report.format_text());

    println!("\n=== Strategy Viability ===\n");
    for strategy in pipeline.strategies() {
        let probe = strategy.probe(&host);
        let mark = if probe.is_viable { "✅" } else { "❌" };
        println!("  {} {}: {}", mark, strategy.kind(), probe.reason);
        if let Some(details) = &probe.details {
            println!("      {details}");
        }
    }
    println!(
        "\n  Fallback order: {}",
        pipeline
            .strategy_order()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" → ")
    );

    Ok(())
}

fn load_brief(path: Option<&Path>) -> Result<MissionBrief> {
    let Some(path) = path else {
        return Ok(MissionBrief::default());
    };
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read brief file: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse brief file: {}", path.display()))
}

async fn copy_text(config: &Config, text: &str, save_on_fallback: bool) -> Result<()> {
    let host = SystemClipboardHost::detect();
    let report = ExportPipeline::new(&config.export)
        .export_text(&host, text)
        .await;

    println!("{}", report.status_message());
    tracing::debug!("{}", report.detailed_report());

    // The Wayland selection lives as long as this process
    if report.delivered() && report.attempt.strategy == StrategyKind::SecureClipboard {
        println!("Serving the clipboard selection; press Ctrl-C when pasted");
        tokio::signal::ctrl_c()
            .await
            .context("Failed to wait for Ctrl-C")?;
        return Ok(());
    }

    let Some(manual) = &report.manual else {
        return Ok(());
    };

    println!("\n----- copy manually -----\n{}\n-------------------------", manual.payload);

    if save_on_fallback {
        let downloads =
            SystemDownloadHost::new(config::resolve_download_dir(&config.export.download_dir));
        match manual.download(&downloads).await {
            Ok(location) => println!("Saved to {location}"),
            Err(e) => {
                error!("Manual download failed: {e}");
                return Err(anyhow::anyhow!("Manual download failed: {e}"));
            }
        }
    }

    Ok(())
}

async fn monitor(config: &Config, duration: Duration) -> Result<()> {
    let snapshot = CapabilityProbe::new(&config.probe).detect(&SystemGraphicsHost::new());
    info!("{}", snapshot.summary());

    let scheduler = Arc::new(AdaptiveScheduler::with_monotonic_clock(
        &snapshot,
        &config.scheduler,
    ));
    let mut tier_rx = scheduler.subscribe_tier();

    let handle = scheduler.start(|_frame: &FrameInfo| Ok::<(), Infallible>(()));

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    let (sampler, mut samples) =
        ResourceSampler::new(Arc::new(ProcMemoryProbe), &config.sampler, shutdown_rx);
    let sampler_task = tokio::spawn(sampler.run());

    println!("Tier: {}", scheduler.tier().label());

    let deadline = tokio::time::sleep(duration);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline => break,
            _ = tokio::signal::ctrl_c() => {
                warn!("Ctrl-C received - stopping monitor");
                break;
            }
            Ok(()) = tier_rx.changed() => {
                println!("Tier changed: {}", tier_rx.borrow_and_update().label());
            }
            Ok(()) = samples.changed() => {
                let sample = samples.latest();
                let metrics = scheduler.metrics();
                println!(
                    "[{:>6}ms] memory {:>8}  frames {:>6}  skipped {:>6}  fps {}",
                    sample.uptime_ms,
                    sample.memory_label(),
                    metrics.frame_count,
                    metrics.skipped_frames,
                    metrics
                        .measured_fps
                        .map_or_else(|| "-".to_string(), |fps| format!("{fps:.1}"))
                );
            }
        }
    }

    scheduler.stop();
    let _ = shutdown_tx.send(());

    if let Err(e) = handle.join().await {
        error!("Frame loop ended with error: {e}");
    }
    sampler_task.await.context("Sampler task panicked")?;

    info!("Monitor finished");
    Ok(())
}

fn init_logging(args: &Args, logging_config: &config::types::LoggingConfig) -> Result<()> {
    use std::fs::{self, File};

    // CLI -v flag overrides config
    let log_level = if args.verbose > 0 {
        match args.verbose {
            1 => "debug",
            _ => "trace",
        }
    } else {
        match logging_config.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => logging_config.level.as_str(),
            _ => "info",
        }
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "obsidian_resilience={log_level},warn"
        ))
    });

    // CLI --log-file overrides config.log_dir
    let log_file_path: Option<String> = if let Some(cli_path) = &args.log_file {
        Some(cli_path.clone())
    } else if logging_config.log_dir.is_some() {
        let log_dir = config::resolve_log_dir(&logging_config.log_dir);
        if let Err(e) = fs::create_dir_all(&log_dir) {
            eprintln!(
                "Warning: Cannot create log directory {}: {e}",
                log_dir.display()
            );
            None
        } else {
            let timestamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
            Some(
                log_dir
                    .join(format!("obsidian-resilience-{timestamp}.log"))
                    .display()
                    .to_string(),
            )
        }
    } else {
        None
    };

    // Fall back to stdout-only if the file cannot be created
    let log_file = log_file_path
        .as_ref()
        .and_then(|path| match File::create(path) {
            Ok(f) => Some((Arc::new(f), path.clone())),
            Err(e) => {
                eprintln!("Warning: Cannot create log file {path:?}: {e} - logging to console only");
                None
            }
        });

    log_subscriber(
        &args.log_format,
        env_filter,
        log_file.as_ref().map(|(file, _)| Arc::clone(file)),
    )
    .init();

    if let Some((_, path)) = &log_file {
        info!("Logging to file: {}", path);
    }

    Ok(())
}

/// Stdout layer plus an optional file layer, both in `format`
fn log_subscriber(
    format: &str,
    env_filter: tracing_subscriber::EnvFilter,
    file: Option<Arc<std::fs::File>>,
) -> impl tracing::Subscriber + Send + Sync + 'static {
    let stdout_layer = match format {
        "json" => fmt::layer().json().boxed(),
        "compact" => fmt::layer().compact().boxed(),
        _ => fmt::layer().pretty().boxed(),
    };

    let file_layer = file.map(|file| {
        let layer = fmt::layer().with_writer(file).with_ansi(false);
        match format {
            "json" => layer.json().boxed(),
            "compact" => layer.compact().boxed(),
            _ => layer.boxed(),
        }
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
}

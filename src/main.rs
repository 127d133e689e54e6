mod cli;

use demoreel::config::{self, Config};
use demoreel::health::HealthMonitor;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use dr_av::{ToolRegistry, ToolsConfig, Workspace};
use dr_core::{Feature, FeatureSet, StageOutcome};
use dr_pipeline::{DemoOptions, FfmpegMedia, Orchestrator};
use dr_render::BannerRenderer;

/// Install the console subscriber and, when `log_file` is given, a second
/// plain-text layer appending to it. The returned guard flushes the file
/// writer on drop and must outlive every log call.
fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if verbose {
            "demoreel=trace,dr_pipeline=trace,dr_av=debug,dr_render=debug,dr_core=debug".to_string()
        } else {
            "demoreel=info,dr_pipeline=info,dr_av=info,dr_render=info,dr_core=info".to_string()
        }
    });

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {:?}", dir))?;
            let name = path
                .file_name()
                .with_context(|| format!("Log file has no file name: {:?}", path))?;
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(env_filter))
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(guard)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match &cli.command {
        Commands::Validate { config: Some(path) } => Some(path.clone()),
        _ => cli.config.clone(),
    };

    // Validate reports load errors itself.
    if let Commands::Validate { .. } = cli.command {
        init_logging(cli.verbose, None)?;
        return validate_config(config_path.as_deref());
    }

    let config = config::load_config_or_default(config_path.as_deref())?;
    let workspace = Workspace::from_layout(&config.paths);

    let log_file = match cli.command {
        Commands::Generate { .. } | Commands::Purge { .. } | Commands::Monitor { .. } => {
            Some(workspace.log_file())
        }
        _ => None,
    };
    let _guard = init_logging(cli.verbose, log_file)?;

    match cli.command {
        Commands::Generate {
            features,
            duration,
            music,
            compress,
            crf,
        } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(generate(
                &config, workspace, features, duration, music, compress, crf,
            ))
        }
        Commands::CheckTools => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(check_tools(&config.tools))
        }
        Commands::Purge { hours } => purge(&config, &workspace, hours),
        Commands::Features => list_features(&config),
        Commands::Monitor { seconds } => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(monitor(&config, &workspace, Duration::from_secs(seconds)))
        }
        Commands::Validate { .. } => Ok(()),
        Commands::Version => {
            println!("demoreel {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn generate(
    config: &Config,
    workspace: Workspace,
    features: Vec<Feature>,
    duration: Option<f64>,
    music: bool,
    compress: bool,
    crf: Option<u8>,
) -> Result<()> {
    let features = if features.is_empty() {
        config.feature_set()?
    } else {
        features.into_iter().collect::<FeatureSet>()
    };

    let clip_duration = match duration {
        Some(secs) => dr_pipeline::clip_duration(secs).context("Invalid --duration")?,
        None => config.clip.duration(),
    };

    let crf = crf.unwrap_or(config.compress.crf);
    if crf > dr_av::invocation::MAX_CRF {
        anyhow::bail!("crf {} exceeds {}", crf, dr_av::invocation::MAX_CRF);
    }

    let tools = Arc::new(ToolRegistry::discover(&config.tools));
    if !tools.has("ffmpeg") {
        tracing::warn!("ffmpeg not found; every clip will fail to encode");
    }

    let media = FfmpegMedia::new(tools, config.media_settings());
    let renderer = BannerRenderer::with_system_fonts(config.render.clone())
        .context("Invalid render settings")?;
    let mut orchestrator = Orchestrator::new(workspace, media, renderer)
        .with_audio(config.audio.clone())
        .with_retention(config.retention());

    let options = DemoOptions {
        clip_duration,
        add_music: music,
        compress,
        crf,
    };

    tracing::info!(
        "Generating demo for {} feature(s): {:?}",
        features.len(),
        features.iter().map(|f| f.name()).collect::<Vec<_>>()
    );
    let report = orchestrator.generate_demo(&features, &options).await;

    for event in &report.events {
        let kind = match &event.outcome {
            StageOutcome::Skipped { .. } => "skipped",
            StageOutcome::Degraded { .. } => "degraded",
            StageOutcome::Aborted { .. } => "aborted",
            StageOutcome::Success(_) => continue,
        };
        let subject = event
            .subject
            .as_deref()
            .map(|s| format!(" [{s}]"))
            .unwrap_or_default();
        println!(
            "! {}{} {}: {}",
            event.stage,
            subject,
            kind,
            event.outcome.reason().unwrap_or("")
        );
    }

    match &report.video {
        Some(video) => {
            println!("{}", video.path.display());
            println!(
                "  clips: {}, audio: {}, compressed: {}",
                video.clips.len(),
                video
                    .audio
                    .as_ref()
                    .map(|a| a.path().display().to_string())
                    .unwrap_or_else(|| "none".to_string()),
                video.compressed
            );
            Ok(())
        }
        None => {
            let reason = report
                .aborted()
                .and_then(|e| e.outcome.reason())
                .unwrap_or("no clips were produced");
            anyhow::bail!("No video produced: {}", reason)
        }
    }
}

async fn check_tools(tools_config: &ToolsConfig) -> Result<()> {
    println!("Checking external tools...\n");

    let registry = ToolRegistry::discover(tools_config);
    let tools = registry.check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    if registry.has("ffmpeg") {
        let sine = dr_av::supports_sine(&registry).await;
        println!(
            "  sine filter: {}",
            if sine { "yes" } else { "no (runs without a library track get no audio)" }
        );
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable all features.");
    }

    Ok(())
}

fn purge(config: &Config, workspace: &Workspace, hours: Option<u64>) -> Result<()> {
    let retention = match hours {
        Some(h) => Duration::from_secs(h.saturating_mul(3600)),
        None => config.retention(),
    };
    let janitor = workspace.janitor();
    let summary = janitor.purge(retention);
    tracing::info!(
        "Purged {} file(s) from {:?}, kept {}, {} error(s)",
        summary.removed,
        janitor.dirs(),
        summary.retained,
        summary.failed
    );
    println!(
        "Removed {} file(s), kept {} ({} error(s))",
        summary.removed, summary.retained, summary.failed
    );
    Ok(())
}

fn list_features(config: &Config) -> Result<()> {
    let source = if config.features.is_empty() {
        "built-in"
    } else {
        "configured"
    };
    let features = config.feature_set()?;
    println!("{} {} feature(s):", features.len(), source);
    for feature in &features {
        println!("  {}", feature.caption());
    }
    Ok(())
}

async fn monitor(config: &Config, workspace: &Workspace, run_for: Duration) -> Result<()> {
    let monitor = HealthMonitor::new(
        config.tools.clone(),
        workspace.audio_dir(),
        config.audio.extensions.clone(),
    );
    monitor.start(config.poll_interval());

    tokio::select! {
        _ = tokio::time::sleep(run_for) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted");
        }
    }

    monitor.stop().await;

    match monitor.latest() {
        Some(snapshot) => {
            println!(
                "ffmpeg: {}",
                match &snapshot.ffmpeg_path {
                    Some(path) => format!("available ({})", path.display()),
                    None => "missing".to_string(),
                }
            );
            println!("audio tracks: {}", snapshot.audio_tracks);
            println!("checked at: {}", snapshot.checked_at.to_rfc3339());
        }
        None => println!("No health check completed"),
    }
    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            config::load_config(p)?
        }
        None => {
            println!("No config file specified, using defaults");
            let config = Config::default();
            config::validate_config(&config)?;
            config
        }
    };

    println!("✓ Configuration is valid");
    println!("  Work root: {}", config.paths.root.display());
    println!(
        "  Canvas: {}x{}, font {}px",
        config.render.width, config.render.height, config.render.font_size
    );
    println!(
        "  Clips: {}s at {} fps",
        config.clip.duration_secs, config.clip.fps
    );
    println!("  Compression crf: {}", config.compress.crf);
    println!("  Retention: {}h", config.cleanup.retention_hours);
    println!(
        "  Features: {}",
        if config.features.is_empty() {
            "built-in set".to_string()
        } else {
            config.features.len().to_string()
        }
    );

    Ok(())
}

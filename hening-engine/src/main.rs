//! Hening session runner (hening-engine) - Main entry point
//!
//! Loads the sound catalog, runs one meditation session from the command line
//! and prints its events. Ctrl+C stops the session through the same
//! confirm-stop path a host view uses.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use hening_common::human_time::format_snapshot;
use hening_engine::audio::{AudioOutput, Mixer, MixerBackend, OutputKind};
use hening_engine::config::LoggingConfig;
use hening_engine::{EngineConfig, Offset, SessionEngine, SessionEvent, SoundPool};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for hening-engine
#[derive(Parser, Debug)]
#[command(name = "hening-engine")]
#[command(about = "Meditation session engine for Hening")]
#[command(version)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "HENING_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder containing the sound files
    #[arg(short, long, env = "HENING_ASSETS")]
    assets: Option<PathBuf>,

    /// Session length in seconds
    #[arg(short, long, default_value = "600")]
    duration: u64,

    /// Bell sound name
    #[arg(long, default_value = "Aura Chime")]
    bell: String,

    /// Ambiance sound name
    #[arg(long, default_value = "Rain")]
    ambiance: String,

    /// Bell offset (start, middle, end, none); repeat for several
    #[arg(long = "offset", value_name = "OFFSET")]
    offsets: Vec<Offset>,

    /// Preparation countdown in seconds (overrides the config file)
    #[arg(long)]
    lead_in: Option<u64>,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    // Tracing first so config discovery is logged; RUST_LOG wins over the config level
    let env_filter = EnvFilter::try_from_default_env().ok();
    let filter_from_env = env_filter.is_some();
    let (filter, filter_handle) = reload::Layer::new(
        env_filter.unwrap_or_else(|| EnvFilter::new(LoggingConfig::default().filter_directives())),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config =
        EngineConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(lead_in) = args.lead_in {
        config.lead_in_seconds = lead_in;
    }

    if !filter_from_env {
        if let Err(e) = filter_handle.reload(EnvFilter::new(config.logging.filter_directives())) {
            warn!("Failed to apply log level '{}': {}", config.logging.level, e);
        }
    }

    let assets_root = config.resolve_assets_root(args.assets.as_deref());
    info!("Assets root: {}", assets_root.display());

    // Audio output
    let mut output = match AudioOutput::open(config.output, config.device.clone()) {
        Ok(output) => output,
        Err(e) => {
            warn!("{}; falling back to null output", e);
            AudioOutput::open(OutputKind::Null, None)?
        }
    };
    let mixer = Mixer::shared(output.sample_rate());
    output
        .start(Arc::clone(&mixer))
        .context("Failed to start audio output")?;

    // Sound pool
    let backend = Arc::new(MixerBackend::new(mixer, assets_root));
    let pool = Arc::new(SoundPool::new(backend).with_load_timeout(config.load_timeout()));
    let report = pool.initialize(config.catalog()).await;
    if !report.failed.is_empty() {
        warn!("Silent after failed load: {}", report.failed.join(", "));
    }

    let offsets = if args.offsets.is_empty() {
        vec![Offset::Start, Offset::End]
    } else {
        args.offsets.clone()
    };

    let engine = SessionEngine::new(Arc::clone(&pool), config.session_settings());
    let session = engine
        .start(args.duration, &args.bell, &args.ambiance, offsets)
        .context("Failed to start session")?;
    let printer = tokio::spawn(print_events(session.subscribe(), args.json));

    tokio::select! {
        outcome = session.finished() => {
            info!("Session {}", outcome);
            session.acknowledge().await;
        }
        _ = shutdown_signal() => {
            session.request_stop().await;
            session.confirm_stop(true).await;
        }
    }

    let final_state = session.snapshot();
    drop(session);
    if let Err(e) = printer.await {
        warn!("Event printer failed: {}", e);
    }
    info!("Final state: {}", format_snapshot(&final_state));

    pool.dispose().await;
    drop(output);
    info!("Shutdown complete");
    Ok(())
}

/// Print session events until the session's channels close
async fn print_events(mut events: broadcast::Receiver<SessionEvent>, json: bool) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if json {
                    match serde_json::to_string(&event) {
                        Ok(line) => println!("{}", line),
                        Err(e) => warn!("Failed to serialize event: {}", e),
                    }
                } else {
                    println!("{}", describe(&event));
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!("Skipped {} events", skipped);
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

fn describe(event: &SessionEvent) -> String {
    use hening_common::human_time::format_countdown;

    match event {
        SessionEvent::Started {
            duration_seconds,
            lead_in_seconds,
            offsets,
            ..
        } => format!(
            "Started {} session ({}s lead-in, bells {:?})",
            format_countdown(*duration_seconds),
            lead_in_seconds,
            offsets
        ),
        SessionEvent::Tick {
            phase,
            seconds_remaining,
            ..
        } => format!("{:>9}  {}", phase.to_string(), format_countdown(*seconds_remaining)),
        SessionEvent::Paused { from, .. } => format!("Paused ({})", from),
        SessionEvent::Resumed { to, .. } => format!("Resumed ({})", to),
        SessionEvent::ConfirmationRequested { .. } => "Stop requested".to_string(),
        SessionEvent::ConfirmationDeclined { .. } => "Stop declined".to_string(),
        SessionEvent::BellFired {
            offset,
            elapsed_seconds,
            ..
        } => format!("Bell ({}) at {}", offset, format_countdown(*elapsed_seconds)),
        SessionEvent::Completed { .. } => "Session complete".to_string(),
        SessionEvent::Cancelled { elapsed_seconds, .. } => {
            format!("Session cancelled after {}", format_countdown(*elapsed_seconds))
        }
        SessionEvent::Dismissed { .. } => "Dismissed".to_string(),
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, stopping session");
        },
        _ = terminate => {
            info!("Received terminate signal, stopping session");
        },
    }
}

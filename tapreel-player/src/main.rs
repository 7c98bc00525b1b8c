//! Tapreel Player (tapreel-player) - headless harness
//!
//! Runs a full presentation session against the simulated media backend
//! and a logging surface. Each line read from stdin is one tap; a line
//! naming an event (`click`, `touchstart`, `pointerdown`) sends that kind,
//! anything else sends a click. Simulated clips run for
//! `HARNESS_CLIP_DURATION`, so `advance_mode = "clip_end"` advances on
//! its own once the looping first clip is left.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tapreel_common::config::{LoggingConfig, TapreelConfig, CONFIG_ENV_VAR};
use tapreel_common::events::EventBus;
use tapreel_player::media::{ClipScript, SimulatedBackend};
use tapreel_player::playback::{InputEvent, InputKind, ListenerRegistry};
use tapreel_player::surface::LoggingSurface;
use tapreel_player::{Presentation, PresentationSettings};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, reload, util::SubscriberInitExt};

/// Length of every simulated clip
const HARNESS_CLIP_DURATION: Duration = Duration::from_secs(8);

/// Command-line arguments for tapreel-player
#[derive(Parser, Debug)]
#[command(name = "tapreel-player")]
#[command(about = "Tap-to-advance clip presentation (headless harness)")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing before anything logs; RUST_LOG wins over the
    // configured level
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().ok();
    let pinned = env_filter.is_some();
    let (filter, filter_handle) = reload::Layer::new(
        env_filter.unwrap_or_else(|| log_filter(&LoggingConfig::default().level)),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = TapreelConfig::resolve(args.config.as_deref())
        .context("Failed to load configuration")?;
    if !pinned {
        filter_handle
            .reload(log_filter(&config.logging.level))
            .context("Failed to apply configured log level")?;
    }

    config.validate().context("Invalid configuration")?;
    info!("Starting Tapreel player with {} clips", config.playlist.len());
    debug!("Configuration: {:?}", config);

    let settings = PresentationSettings::from_config(&config);
    let backend = Arc::new(harness_backend());
    let surface = Arc::new(LoggingSurface);
    let events = EventBus::default();
    spawn_event_logger(&events);

    let mut presentation = Presentation::new(settings, backend, surface, events);
    let mut host = ListenerRegistry::new();
    presentation.bind_input(&mut host);

    let (tx, rx) = mpsc::channel(32);
    tokio::spawn(read_taps(tx));

    let summary = presentation
        .run(rx, shutdown_signal())
        .await
        .context("Presentation failed")?;

    info!(
        "Shutdown complete (started: {}, transitions: {})",
        summary.started, summary.transitions
    );
    Ok(())
}

fn harness_backend() -> SimulatedBackend {
    SimulatedBackend::new(ClipScript::default().with_duration(HARNESS_CLIP_DURATION))
}

fn log_filter(level: &str) -> tracing_subscriber::EnvFilter {
    format!(
        "tapreel_player={level},tapreel_cache={level},tapreel_common={level}",
        level = level
    )
    .into()
}

/// Forward stdin lines as input events until EOF
async fn read_taps(tx: mpsc::Sender<InputEvent>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let kind = InputKind::from_event_name(&line).unwrap_or(InputKind::Click);
                if tx.send(InputEvent::now(kind)).await.is_err() {
                    break;
                }
            }
            Ok(None) => {
                debug!("stdin closed");
                break;
            }
            Err(e) => {
                warn!("Failed to read stdin: {}", e);
                break;
            }
        }
    }
}

fn spawn_event_logger(events: &EventBus) {
    let mut rx = events.subscribe();
    debug!("Event logger attached ({} subscribers)", events.subscriber_count());
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => debug!("event: {}", json),
                    Err(e) => warn!("Failed to serialize {} event: {}", event.event_type(), e),
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Event logger skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

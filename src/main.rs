pub mod adapter;
pub mod config;
pub mod controller;
pub mod messages;

use crate::adapter::{AdapterEngineHandle, EngineSettings, HandStateSettings};
use crate::config::HandrigConfig;
use crate::controller::{CollectorHandle, CollectorSettings, ControllerSnapshot};
use crate::messages::{MessageBus, SessionId, POINT_INDEX_CHANNEL};
use color_eyre::{eyre::eyre, Result};
use tokio::sync::watch;
use tracing::{info, trace, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = HandrigConfig::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        HandrigConfig::default()
    });
    let session = SessionId::new(config.session.session_id.clone());
    info!("Starting handrig for session: {}", session);

    let bus = MessageBus::new(64);

    // Latest-frame channel from the collector to the engine.
    let (snapshot_tx, snapshot_rx) = watch::channel(ControllerSnapshot::default());

    let collector_settings = CollectorSettings {
        trigger_deadzone: config.controller.trigger_deadzone,
        poll_interval_us: config.controller.poll_interval_us,
    };
    // Without a controller backend the snapshots simply stay neutral, so
    // poses read invalid and the rig blends to the default animated hands.
    if let Err(e) = CollectorHandle::spawn(Some(collector_settings), snapshot_tx) {
        warn!("Controller input unavailable: {}", e);
    }

    let engine_settings = EngineSettings {
        frame_interval_ms: config.adapter.frame_interval_ms,
        hand_state: HandStateSettings {
            trigger_smooth_timescale: config.adapter.trigger_smooth_timescale,
            overlay_ramp_rate: config.adapter.overlay_ramp_rate,
        },
    };

    let mut engine = AdapterEngineHandle::new("squeeze-hands".to_string());
    let mut anim_rx = engine
        .start(
            snapshot_rx,
            bus.subscribe(POINT_INDEX_CHANNEL),
            session,
            engine_settings,
        )
        .map_err(|e| eyre!("Failed to start adapter engine: {}", e))?;

    // Stand-in for the animation graph: follow parameter updates.
    let anim_task = tokio::spawn(async move {
        while anim_rx.changed().await.is_ok() {
            let state = *anim_rx.borrow();
            trace!(?state, "animation parameters updated");
        }
    });

    info!("handrig running, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    engine.shutdown().await?;
    anim_task.abort();

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}

//! Time-clock server.
//!
//! Loads settings from `TIMECLOCK_CONFIG_DIR` (default `./config/default`),
//! opens the local store and the remote document directory, and serves the
//! HTTP API. Lines typed on stdin are treated as badge scans, which is how
//! keyboard-wedge NFC readers deliver tag identifiers.
//!
//! Pass `--ephemeral` to keep the remote store in memory.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use timeclock_engine::api::{AppState, create_router};
use timeclock_engine::config::ConfigLoader;
use timeclock_engine::engine::AttendanceEngine;
use timeclock_engine::models::{AttendanceEvent, ScanEvent};
use timeclock_engine::storage::{DocumentStore, FileStore, MemoryStore};
use timeclock_engine::sync::ConnectivityMonitor;

const DEFAULT_CONFIG_DIR: &str = "./config/default";
const SCAN_CHANNEL_CAPACITY: usize = 16;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,timeclock_engine=debug")),
        )
        .with_target(false)
        .init();

    let config_dir =
        std::env::var("TIMECLOCK_CONFIG_DIR").unwrap_or_else(|_| DEFAULT_CONFIG_DIR.to_string());
    let config = ConfigLoader::load(&config_dir)?;
    let settings = config.settings().clone();
    info!(config_dir = %config_dir, company = %settings.company.name, "Configuration loaded");

    let local_store = FileStore::open(&settings.storage.local_dir).await?;
    info!(local_dir = %local_store.root().display(), "Local store opened");
    let local: Arc<dyn DocumentStore> = Arc::new(local_store);
    let remote: Arc<dyn DocumentStore> = if std::env::args().any(|arg| arg == "--ephemeral") {
        warn!("Using an in-memory remote store; records are lost on exit");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(FileStore::mounted(&settings.storage.remote_dir))
    };

    let engine = Arc::new(AttendanceEngine::open(remote, local, &settings).await?);

    let monitor = Arc::new(ConnectivityMonitor::new(engine.is_connected().await));
    monitor.spawn(engine.clone());
    monitor.spawn_probe(engine.remote_store(), settings.sync.probe_interval());

    let mut events = engine.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            match event {
                AttendanceEvent::Clock(notice) => info!(
                    employee_id = %notice.employee.id,
                    action = notice.action.as_str(),
                    "{}",
                    notice.greeting
                ),
                AttendanceEvent::UnknownTag { tag_uid, .. } => {
                    warn!(tag_uid = %tag_uid, "Badge not recognized")
                }
                other => debug!(event = ?other, "Attendance event"),
            }
        }
    });

    let (scans, scan_receiver) = mpsc::channel(SCAN_CHANNEL_CAPACITY);
    let scan_engine = engine.clone();
    tokio::spawn(async move { scan_engine.run_scan_loop(scan_receiver).await });
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let tag_uid = line.trim();
            if tag_uid.is_empty() {
                continue;
            }
            let scan = ScanEvent {
                tag_uid: tag_uid.to_string(),
                scanned_at: chrono::Local::now().naive_local(),
            };
            if scans.send(scan).await.is_err() {
                break;
            }
        }
    });

    let router = create_router(AppState::new(engine, config));
    let listener = tokio::net::TcpListener::bind(&settings.server.bind).await?;
    info!(bind = %settings.server.bind, "Time clock server listening");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(error) = tokio::signal::ctrl_c().await {
                warn!(error = %error, "Cannot listen for shutdown signal");
            }
        })
        .await?;

    info!("Time clock server stopped");
    Ok(())
}

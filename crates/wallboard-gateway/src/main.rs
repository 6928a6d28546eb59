use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use wallboard_core::WallboardConfig;
use wallboard_scheduler::WallboardEngine;
use wallboard_store::{ChangeBus, SqliteSource, WallboardSource};

mod app;
mod auth;
mod http;
mod ws;

/// Headless wallboard service: runs the display engine and serves its frames.
#[derive(Debug, Parser)]
#[command(name = "wallboard-gateway", version)]
struct Args {
    /// Path to wallboard.toml (default: ~/.wallboard/wallboard.toml).
    #[arg(long, env = "WALLBOARD_CONFIG")]
    config: Option<String>,

    /// Override the configured listen port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "wallboard_gateway=info,wallboard_scheduler=info,tower_http=debug".into()
            }),
        )
        .init();

    let args = Args::parse();
    let mut config = WallboardConfig::load(args.config.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        WallboardConfig::default()
    });
    if let Some(port) = args.port {
        config.gateway.port = port;
    }

    // initialize SQLite replica
    let db_path = config.database.path.clone();
    ensure_parent_dir(&db_path);
    info!(path = %db_path, "opening SQLite database");
    let db = rusqlite::Connection::open(&db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    wallboard_store::db::init_db(&db)?;
    info!("database migrations complete");

    let bus = ChangeBus::new();
    let mut store = SqliteSource::new(db)?.with_bus(bus.clone());
    if let Some(ref token) = config.database.access_token {
        store = store.with_access_token(token.clone());
    }
    let store = Arc::new(store);

    let access_denied = Arc::new(AtomicBool::new(false));
    let denied_flag = Arc::clone(&access_denied);
    let source: Arc<dyn WallboardSource> = store.clone();
    let engine = WallboardEngine::new(
        source,
        &bus,
        config.engine.clone(),
        &config.preset,
        config.display.offset(),
    )
    .with_access_denied_callback(Arc::new(move |reason| {
        warn!(reason, "display credential rejected");
        denied_flag.store(true, Ordering::SeqCst);
    }));
    let handle = engine.mount();
    info!("wallboard engine mounted");

    let addr: SocketAddr = format!("{}:{}", config.gateway.bind, config.gateway.port).parse()?;
    let state = Arc::new(app::AppState::new(
        config,
        store,
        bus,
        handle.client(),
        access_denied,
    ));
    let router = app::build_router(state);

    info!("wallboard gateway listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    handle.unmount().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}

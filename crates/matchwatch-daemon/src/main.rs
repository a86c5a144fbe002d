use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use matchwatch_cache::FixtureCache;
use matchwatch_core::MatchwatchConfig;
use matchwatch_providers::{ApiFootballClient, FootballDataClient};
use matchwatch_scheduler::FixtureScheduler;
use matchwatch_sync::{FixtureSyncService, StaticTeamDirectory};
use tracing::{info, warn};

mod app;
mod http;

#[derive(Parser)]
#[command(name = "matchwatch")]
#[command(about = "Watches today's fixtures and records goal scorers", long_about = None)]
struct Cli {
    /// Config file path (default: ~/.matchwatch/matchwatch.toml)
    #[arg(short, long, env = "MATCHWATCH_CONFIG")]
    config: Option<String>,

    /// Run one sync and scheduling pass, wait for today's pipelines, then exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "matchwatch=info,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();
    let config = MatchwatchConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        MatchwatchConfig::default()
    });
    if config.providers.fixtures.api_key.is_empty() {
        warn!("no fixture provider API key configured, upstream calls will be rejected");
    }

    let db_path = &config.database.path;
    ensure_parent_dir(db_path);
    info!(path = %db_path, "opening SQLite database");
    let db = rusqlite::Connection::open(db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL;")?;
    let cache = Arc::new(FixtureCache::new(db)?);

    let fixtures = Arc::new(FootballDataClient::new(&config.providers.fixtures)?);
    let goals = Arc::new(ApiFootballClient::new(&config.providers.goals)?);
    let teams = Arc::new(StaticTeamDirectory::from_config(&config.teams));
    info!(
        teams = config.teams.len(),
        tracked = config.tracked_teams().count(),
        "reference data loaded"
    );

    let sync = Arc::new(FixtureSyncService::new(
        cache,
        fixtures,
        goals,
        teams,
        config.scheduler.timezone,
    ));
    let scheduler = Arc::new(FixtureScheduler::new(sync, config.scheduler.clone()));

    // first pass now; later passes run at local midnight
    match scheduler.daily_pass().await {
        Ok(armed) => info!(armed, "startup pass complete"),
        Err(e) => warn!(error = %e, "startup scheduling failed, retrying at next midnight"),
    }

    if cli.once {
        info!(active = scheduler.active_count(), "waiting for today's pipelines");
        scheduler.wait_idle().await;
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let engine = {
        let scheduler = Arc::clone(&scheduler);
        tokio::spawn(async move { scheduler.run(shutdown_rx).await })
    };

    if config.health.enabled {
        let addr: SocketAddr = format!("{}:{}", config.health.bind, config.health.port).parse()?;
        let state = Arc::new(app::AppState::new(Arc::clone(&scheduler)));
        let router = app::build_router(state);
        info!("matchwatch health endpoint listening on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
    } else {
        shutdown_signal().await;
    }

    // signal scheduler to stop and wait for the pipelines to wind down
    let _ = shutdown_tx.send(true);
    engine.await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}

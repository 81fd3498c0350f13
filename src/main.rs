mod api;
mod config;
mod db;
mod error;
mod handicap;
mod refresher;
mod scorer;
mod standings;
mod state;
mod types;

use std::str::FromStr;
use std::sync::Arc;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::routes::{router, ApiState};
use crate::config::{Config, CHANNEL_CAPACITY};
use crate::db::queries::{load_players, load_teams};
use crate::db::seed::seed_demo_league;
use crate::db::writer::DbWriter;
use crate::error::Result;
use crate::refresher::HandicapRefresher;
use crate::state::RosterStore;
use crate::types::LeagueEvent;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", cfg.db_path))?
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Database ready at {}", cfg.db_path);

    if cfg.seed_demo_league {
        seed_demo_league(&pool).await?;
    }

    // --- In-memory roster ---
    let roster = RosterStore::new();
    roster.load(load_players(&pool).await?, load_teams(&pool).await?);
    info!(
        "Roster loaded: {} players across {} teams",
        roster.player_count(),
        roster.team_count()
    );
    if roster.team_count() == 0 {
        warn!("League has no teams. Set SEED_DEMO_LEAGUE=true to start with a demo league.");
    }

    let health = Arc::new(HealthState::new());

    // --- Channels ---
    let (event_tx, event_rx) = mpsc::channel::<LeagueEvent>(CHANNEL_CAPACITY);

    // --- Spawn tasks ---

    // DB writer (matches, cached handicaps); credits season points after commit
    let writer = DbWriter::new(pool.clone(), event_rx, Arc::clone(&health), Arc::clone(&roster));
    tokio::spawn(async move { writer.run().await });

    // Handicap refresher (background, every 300s)
    let refresher = HandicapRefresher::new(
        pool.clone(),
        Arc::clone(&roster),
        event_tx.clone(),
        Arc::clone(&health),
    );
    tokio::spawn(async move { refresher.run().await });

    // HTTP API server
    let api_state = ApiState {
        pool,
        roster,
        health,
        event_tx,
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}

// League server entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file)
// 2. Load config
// 3. Open database
// 4. Import the player pool from CSV
// 5. Spawn the WebSocket API server task
// 6. Wait for Ctrl+C, then shut down

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};

use league_server::app::App;
use league_server::config;
use league_server::db::Database;
use league_server::import;
use league_server::server;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("League server starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={}, {} teams, {} roster slots",
        config.league.name,
        config.league.num_teams,
        config.league.roster_size()
    );

    // 3. Open database
    let db = Database::open(&config.db_path).context("failed to open database")?;
    info!("Database opened at {}", config.db_path);

    // 4. Import the player pool. A missing CSV is not fatal: the server
    // can still run against previously imported players.
    match import::load_all(&db, &config.data_paths) {
        Ok(counts) => info!(
            "Player pool ready: {} skaters, {} goalies",
            counts.skaters, counts.goalies
        ),
        Err(e) => warn!("Player import skipped: {e:#}"),
    }

    // 5. Spawn the API server task
    let app = Arc::new(App::new(config.clone(), db));
    let ws_port = config.ws_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server::run(ws_port, app).await {
            error!("API server error: {e}");
        }
    });

    info!("Server ready. API listening on 127.0.0.1:{ws_port}");

    // 6. Wait for shutdown
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutdown signal received");

    server_handle.abort();
    info!("League server shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file under logs/.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("puckpool.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("league_server=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

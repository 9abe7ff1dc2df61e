//! Play Nine server.
//!
//! One actor per table serializes every mutation; table records live as
//! JSON files under the data directory. Two sweep loops drop dead sockets
//! and remove players who stayed away too long.

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use anyhow::{Context, Error};
use p9_server::{
    api,
    config::ServerConfig,
    logging, metrics,
};
use pico_args::Arguments;
use play_nine::{
    session::SessionRegistry,
    store::JsonFileStore,
    sync::Coordinator,
    table::TableManager,
};
use tracing::{info, warn};

const HELP: &str = "\
Run a Play Nine server

USAGE:
  p9_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:6969]
  --data-dir   PATH        Directory for table records [default: env PLAY9_DATA_DIR or /play9]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                      Server bind address (e.g., 0.0.0.0:8080)
  PLAY9_DATA_DIR                   Directory for table records
  SWEEP_INTERVAL_SECS              How often liveness sweeps run [10]
  STALE_CONNECTION_TIMEOUT_SECS    Silence before a socket is dropped [20]
  INACTIVE_PLAYER_TIMEOUT_SECS     Absence before a player loses their seat [60]
  TABLE_IDLE_TIMEOUT_SECS          Idle time before a table actor stops [300]
  STORE_TIMEOUT_SECS               Bound on each table read or write [5]
  METRICS_BIND                     Prometheus listener address (optional)
  RUST_LOG                         Log filter [info,tower_http=warn]
  LOG_FORMAT                       Set to json for one JSON object per line
";

struct Args {
    bind: Option<SocketAddr>,
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        bind: pargs.opt_value_from_str("--bind")?,
        data_dir: pargs.opt_value_from_str("--data-dir")?,
    };

    logging::init();

    let config = ServerConfig::from_env(args.bind, args.data_dir)?;
    config.validate()?;
    info!("Starting Play Nine server at {}", config.bind);

    if let Some(addr) = config.metrics_bind {
        match metrics::init_metrics(addr) {
            Ok(()) => info!("Metrics exported at http://{addr}/metrics"),
            Err(e) => warn!("{e}"),
        }
    }

    info!("Table records in {}", config.data_dir.display());
    let store = Arc::new(JsonFileStore::new(config.data_dir.clone()).with_timeout(config.store_timeout));
    let registry = Arc::new(SessionRegistry::new(config.session));
    let table_manager = Arc::new(TableManager::new(store, registry.clone(), config.table));

    let sweeps = Coordinator::new(table_manager.clone(), config.coordinator).start();

    let app = api::create_router(api::AppState {
        table_manager,
        registry,
    });

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Shutting down server...");
    sweeps.shutdown().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}

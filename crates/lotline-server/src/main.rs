//! Lotline server binary.
//!
//! Reads `lotline.toml` (or the path given with `--config`), layers
//! `LOTLINE_*` environment variables on top, opens the SQLite store and
//! serves the JSON API over HTTP.
//!
//! Nested keys use a double underscore: `LOTLINE_STORE__PATH=/var/lib/lotline.db`.
//!
//! ```
//! cargo run -p lotline-server -- --check
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use lotline_store_sqlite::{SqliteStore, StoreConfig};
use serde::Deserialize;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Lotline batch-tracking server")]
struct Cli {
  /// Path to the TOML configuration file. Missing is fine.
  #[arg(short, long, default_value = "lotline.toml")]
  config: PathBuf,

  /// Open the store, check that it answers, and exit.
  #[arg(long)]
  check: bool,
}

/// Runtime configuration.
#[derive(Debug, Deserialize)]
struct ServerConfig {
  #[serde(default = "default_host")]
  host:  String,
  #[serde(default = "default_port")]
  port:  u16,
  #[serde(default)]
  store: StoreConfig,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.as_path()).required(false))
    .add_source(
      config::Environment::with_prefix("LOTLINE")
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true),
    )
    .build()
    .with_context(|| format!("failed to read config from {:?}", cli.config))?;

  let mut server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  server_cfg.store.path = home_relative(&server_cfg.store.path);

  let store = SqliteStore::open(&server_cfg.store)
    .await
    .with_context(|| format!("failed to open store at {:?}", server_cfg.store.path))?;

  if cli.check {
    use lotline_core::store::BatchStore as _;
    store.ping().await.context("store did not answer")?;
    tracing::info!(path = ?server_cfg.store.path, "store is reachable");
    return Ok(());
  }

  let app = lotline_api::api_router(Arc::new(store)).layer(TraceLayer::new_for_http());
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(store = ?server_cfg.store.path, "listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!("failed to listen for ctrl-c: {e}");
    std::future::pending::<()>().await;
  }
  tracing::info!("shutting down");
}

/// Resolve a leading `~/` against `$HOME`.
fn home_relative(path: &Path) -> PathBuf {
  match (path.strip_prefix("~"), std::env::var_os("HOME")) {
    (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
    _ => path.to_path_buf(),
  }
}

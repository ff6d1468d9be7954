//! muster-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) plus
//! `MUSTER_*` environment variables, opens the SQLite store, and serves the
//! JSON API over HTTP.
//!
//! The server refuses to start without a token secret:
//!
//! ```text
//! MUSTER_TOKEN_SECRET=... cargo run -p muster-server
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use muster_core::{service::Attendance, token::TokenSigner};
use muster_server::{AppState, ServerConfig, directory::Directory};
use muster_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Muster check-in server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,
}

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
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("MUSTER"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  // Fail before touching the store or the network.
  let signer = TokenSigner::new(&server_cfg.token_secret).context("cannot sign tokens")?;

  let directory = Directory::from_config(
    server_cfg.directory_url.as_deref(),
    server_cfg.lookup_timeout(),
  )
  .context("failed to configure identity directory")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let service = Attendance::new(Arc::new(store), Arc::new(directory), signer)
    .with_lookup_timeout(server_cfg.lookup_timeout());

  let state = AppState { service: Arc::new(service) };

  let app = muster_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

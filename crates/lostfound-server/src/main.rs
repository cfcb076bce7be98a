//! lostfound server binary.
//!
//! Reads `config.toml` (or the path given with `--config`) layered under
//! `LOSTFOUND_*` environment variables, opens the SQLite store, and serves the
//! registry API over HTTP.
//!
//! # Admin key hash generation
//!
//! To generate the argon2 PHC string for `admin_key_hash`:
//!
//! ```text
//! cargo run -p lostfound-server --bin server -- --hash-key
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::Parser;
use lostfound_api::{AdminGateway, ApiState};
use lostfound_server::ServerConfig;
use lostfound_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Lost-and-found registry server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for an admin key entered on stdin and exit.
  #[arg(long)]
  hash_key: bool,
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

  if cli.hash_key {
    let key = read_key()?;
    let hash = AdminGateway::hash_key(&key)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("LOSTFOUND"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;
  server_cfg.validate()?;

  let gateway = AdminGateway::new(server_cfg.admin_key_hash.clone())
    .map_err(|e| anyhow::anyhow!("admin_key_hash is not a valid argon2 hash: {e}"))?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path, server_cfg.busy_timeout())
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let app = lostfound_server::app(
    ApiState::new(store, gateway),
    server_cfg.request_timeout(),
  );
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read the admin key from one line of stdin.
fn read_key() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Admin key: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  let key = line.trim_end_matches(['\r', '\n']).to_owned();
  anyhow::ensure!(!key.is_empty(), "admin key must not be empty");
  Ok(key)
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

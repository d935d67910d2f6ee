//! couchcast: poster-grid launcher for a streaming stick.
//!
//! Serves a grid of the titles in `movies.json`.  Clicking a poster wakes
//! the device over the Android debug bridge and opens the title from the
//! beginning.
//!
//! # Usage
//!
//! ```text
//! couchcast [OPTIONS] [COMMAND]
//!
//! Commands:
//!   serve             Serve the poster grid (default)
//!   import-watchlist  Merge an exported watchlist into the catalog
//!
//! Options:
//!   --device-host <HOST>           Device IP or hostname         [env: FIRE_TV_IP]
//!   --device-port <PORT>           Device adb port [default: 5555]  [env: FIRE_TV_PORT]
//!   --tmdb-api-key <KEY>           TMDB key for poster lookup    [env: TMDB_API_KEY]
//!   --cooldown-secs <SECS>         Seconds between plays [default: 2] [env: PLAY_COOLDOWN_SECONDS]
//!   --bind <ADDR>                  HTTP listen address [default: 0.0.0.0:5000] [env: COUCHCAST_BIND]
//!   --catalog <PATH>               Catalog file [default: movies.json] [env: COUCHCAST_CATALOG]
//!   --command-timeout-secs <SECS>  Bound on each adb call [default: 10] [env: COUCHCAST_COMMAND_TIMEOUT]
//!   --adb-path <PATH>              Use this adb instead of searching [env: ADB_PATH]
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use couchcast_core::domain::device::DEFAULT_DEVICE_PORT;
use couchcast_core::DeviceAddress;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use couchcast_server::application::{
    build_library, merge_watchlist, CatalogStore, ControlSession, PlayService,
};
use couchcast_server::domain::config::{DEFAULT_COMMAND_TIMEOUT_SECS, DEFAULT_COOLDOWN_SECS};
use couchcast_server::domain::ServerConfig;
use couchcast_server::infrastructure::adb::{ADB_NOT_FOUND, DEFAULT_DAEMON_PORT};
use couchcast_server::infrastructure::{
    load_watchlist, run_server, AdbTransport, BinaryLocator, HttpState, JsonCatalogStore,
    TmdbPosterLookup,
};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Poster-grid launcher for a streaming stick.
#[derive(Debug, Parser)]
#[command(
    name = "couchcast",
    about = "Serve a poster grid that launches titles on a streaming device over adb",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// IP address or hostname of the streaming device.
    #[arg(long, env = "FIRE_TV_IP")]
    device_host: Option<String>,

    /// adb-over-network port of the streaming device.
    #[arg(long, default_value_t = DEFAULT_DEVICE_PORT, env = "FIRE_TV_PORT")]
    device_port: u16,

    /// TMDB API key used to look up missing posters.
    #[arg(long, env = "TMDB_API_KEY", hide_env_values = true)]
    tmdb_api_key: Option<String>,

    /// Minimum seconds between accepted play requests.  0 disables the limit.
    #[arg(long, default_value_t = DEFAULT_COOLDOWN_SECS, env = "PLAY_COOLDOWN_SECONDS")]
    cooldown_secs: u64,

    /// Address the HTTP server listens on.
    #[arg(long, default_value = "0.0.0.0:5000", env = "COUCHCAST_BIND")]
    bind: String,

    /// Catalog file (JSON array of {title, id, poster}).
    #[arg(long, global = true, default_value = "movies.json", env = "COUCHCAST_CATALOG")]
    catalog: PathBuf,

    /// Upper bound in seconds for each adb daemon call and each command send.
    #[arg(long, default_value_t = DEFAULT_COMMAND_TIMEOUT_SECS, env = "COUCHCAST_COMMAND_TIMEOUT")]
    command_timeout_secs: u64,

    /// Path to the adb executable.  When absent, PATH and the usual SDK
    /// install locations are searched.
    #[arg(long, env = "ADB_PATH")]
    adb_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Command {
    /// Serve the poster grid (default).
    Serve,

    /// Merge a watchlist export ([{"title", "id"}]) into the catalog.
    ImportWatchlist {
        /// JSON file saved from the watchlist page.
        file: PathBuf,
    },
}

impl Cli {
    /// Converts the parsed arguments into a [`ServerConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the device host or TMDB key is missing or blank,
    /// the device host is not a plain host name, or `--bind` is not a socket
    /// address.
    fn to_server_config(&self) -> anyhow::Result<ServerConfig> {
        let host = non_blank(self.device_host.as_deref())
            .context("no device address: set FIRE_TV_IP or pass --device-host")?;
        let device = DeviceAddress::new(host, self.device_port)
            .with_context(|| format!("invalid device address '{host}'"))?;

        let Some(tmdb_api_key) = non_blank(self.tmdb_api_key.as_deref()) else {
            bail!("TMDB_API_KEY is required: set it or pass --tmdb-api-key");
        };

        let bind_addr: SocketAddr = self
            .bind
            .parse()
            .with_context(|| format!("invalid bind address: '{}'", self.bind))?;

        Ok(ServerConfig {
            bind_addr,
            device,
            play_cooldown: Duration::from_secs(self.cooldown_secs),
            command_timeout: Duration::from_secs(self.command_timeout_secs),
            catalog_path: self.catalog.clone(),
            tmdb_api_key: tmdb_api_key.to_string(),
            adb_path: self.adb_path.clone(),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        None | Some(Command::Serve) => serve(cli.to_server_config()?).await,
        Some(Command::ImportWatchlist { file }) => import_watchlist(file, &cli.catalog),
    }
}

/// Builds the library, wires the play service, and serves until Ctrl+C.
async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    info!(
        "couchcast starting: device={}, bind={}, cooldown={:?}",
        config.device, config.bind_addr, config.play_cooldown
    );

    let store = JsonCatalogStore::new(&config.catalog_path);
    let lookup =
        TmdbPosterLookup::new(config.tmdb_api_key.as_str()).context("failed to create TMDB client")?;
    let library = build_library(&store, &lookup).await;
    info!("{} titles in {}", library.len(), store.path().display());

    let transport = AdbTransport::new(
        adb_locator(config.adb_path.clone()),
        SocketAddrV4::new(Ipv4Addr::LOCALHOST, DEFAULT_DAEMON_PORT),
        config.command_timeout,
    );
    let session = ControlSession::new(
        Arc::new(transport),
        config.device.clone(),
        config.command_timeout,
    );
    let service = Arc::new(PlayService::new(session, config.play_cooldown));
    let state = HttpState::new(service, library).context("failed to prepare the page template")?;

    run_server(config.bind_addr, state, shutdown_signal()).await?;

    info!("couchcast stopped");
    Ok(())
}

/// Finds adb before any request is served, so play requests never wait on
/// the search.  A missing adb is logged here and reported again per request.
fn adb_locator(adb_path: Option<PathBuf>) -> BinaryLocator {
    let locator = match adb_path {
        Some(path) => BinaryLocator::explicit(path),
        None => BinaryLocator::new(),
    };
    if locator.locate().is_none() {
        warn!("{ADB_NOT_FOUND}");
    }
    locator
}

/// Resolves on Ctrl+C.  If the signal cannot be observed the server keeps
/// running.
async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("received Ctrl+C, shutting down"),
        Err(e) => {
            error!("failed to listen for Ctrl+C signal: {e}");
            std::future::pending::<()>().await;
        }
    }
}

/// Merges `file` into the catalog at `catalog` and saves it.
fn import_watchlist(file: &Path, catalog: &Path) -> anyhow::Result<()> {
    let items = load_watchlist(file)
        .with_context(|| format!("failed to read watchlist {}", file.display()))?;

    let store = JsonCatalogStore::new(catalog);
    // An unreadable catalog is left alone rather than replaced.
    let mut entries = store
        .try_load()
        .with_context(|| format!("failed to read catalog {}", catalog.display()))?;

    let report = merge_watchlist(&mut entries, items);
    if report.added > 0 {
        store
            .save(&entries)
            .with_context(|| format!("failed to write catalog {}", catalog.display()))?;
    }

    info!(
        "added {} titles to {} ({} already present, {} without a usable id)",
        report.added,
        catalog.display(),
        report.skipped_duplicate,
        report.skipped_invalid
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

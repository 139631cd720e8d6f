//! Knight Swap - Unified CLI
//!
//! Serves the session API, plays the puzzle in a terminal and replays stored games.

#![warn(missing_docs)]

mod cli;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command, StoreArgs};
use knight_swap::{ApiClient, ServerConfig, SessionStore, SqliteSessionStore, console, server};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            port,
            host,
            db,
        } => run_server(config, host, port, db).await,
        Command::Play { store } => {
            let store = open_store(&store).await?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            console::play(store, stdin, &mut std::io::stdout()).await
        }
        Command::Replay {
            id,
            store,
            autoplay,
            interval_ms,
        } => {
            let store = open_store(&store).await?;
            let interval = autoplay.then(|| Duration::from_millis(interval_ms));
            console::replay(store, &id, interval, &mut std::io::stdout()).await
        }
        Command::Stats { store } => {
            let stats = open_store(&store).await?.get_stats().await?;
            write!(std::io::stdout(), "{}", console::format_stats(&stats))?;
            Ok(())
        }
        Command::History { store } => {
            let sessions = open_store(&store).await?.list_sessions().await?;
            write!(std::io::stdout(), "{}", console::format_history(&sessions))?;
            Ok(())
        }
    }
}

/// Run the REST server until Ctrl-C
#[instrument(skip_all)]
async fn run_server(
    config: Option<std::path::PathBuf>,
    host: Option<String>,
    port: Option<u16>,
    db: Option<String>,
) -> Result<()> {
    let config = ServerConfig::load(config.as_deref())?
        .with_host(host)
        .with_port(port)
        .with_database_path(db);

    let store = SqliteSessionStore::open(config.database_path(), *config.list_limit()).await?;
    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;

    info!(address = %config.bind_address(), "Starting knight swap server");
    server::serve(listener, Arc::new(store), server::ctrl_c()).await?;
    Ok(())
}

/// Remote store when a server URL is given, otherwise the local database
async fn open_store(args: &StoreArgs) -> Result<Arc<dyn SessionStore>> {
    if let Some(url) = &args.server_url {
        let client = ApiClient::new(url);
        client
            .health()
            .await
            .with_context(|| format!("Server at {} is not reachable", url))?;
        return Ok(Arc::new(client));
    }

    let config = ServerConfig::load(args.config.as_deref())?.with_database_path(args.db.clone());
    let store = SqliteSessionStore::open(config.database_path(), *config.list_limit()).await?;
    Ok(Arc::new(store))
}

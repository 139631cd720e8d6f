//! Command-line interface for knight_swap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Knight Swap - 3x3 knight-swap puzzle with recorded sessions
#[derive(Parser, Debug)]
#[command(name = "knight_swap")]
#[command(about = "Knight swap puzzle server, player and replayer", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Where sessions are read from and written to.
#[derive(Args, Debug, Clone)]
pub struct StoreArgs {
    /// Server URL (e.g. http://127.0.0.1:3000). Uses the local database when omitted.
    #[arg(long)]
    pub server_url: Option<String>,

    /// Local database file (overrides config and KNIGHT_SWAP_DB)
    #[arg(long, conflicts_with = "server_url")]
    pub db: Option<String>,

    /// Path to a TOML config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the REST server
    Serve {
        /// Path to a TOML config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Port to bind to
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Database file
        #[arg(long)]
        db: Option<String>,
    },

    /// Play in the terminal; enter `row col` to click a cell
    Play {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// Print the board after each move of a stored session
    Replay {
        /// Session ID
        id: String,

        #[command(flatten)]
        store: StoreArgs,

        /// Step through the moves on a timer
        #[arg(long)]
        autoplay: bool,

        /// Delay between autoplay steps
        #[arg(long, default_value = "800")]
        interval_ms: u64,
    },

    /// Print aggregate statistics
    Stats {
        #[command(flatten)]
        store: StoreArgs,
    },

    /// List recent sessions
    History {
        #[command(flatten)]
        store: StoreArgs,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_replay() {
        let cli = Cli::try_parse_from([
            "knight_swap",
            "replay",
            "abc",
            "--db",
            "games.db",
            "--autoplay",
            "--interval-ms",
            "250",
        ])
        .unwrap();
        match cli.command {
            Command::Replay {
                id,
                store,
                autoplay,
                interval_ms,
            } => {
                assert_eq!(id, "abc");
                assert_eq!(store.db.as_deref(), Some("games.db"));
                assert!(autoplay);
                assert_eq!(interval_ms, 250);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_server_url_conflicts_with_db() {
        let result = Cli::try_parse_from([
            "knight_swap",
            "stats",
            "--server-url",
            "http://localhost:3000",
            "--db",
            "x.db",
        ]);
        assert!(result.is_err());
    }
}

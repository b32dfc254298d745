pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "newswire")]
#[command(about = "Ingest and synchronize news articles from a paginated feed API", long_about = None)]
pub struct Cli {
    /// Database path override
    #[arg(long, global = true)]
    pub db: Option<std::path::PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch top headlines and save new articles
    Fetch {
        /// Article category (general, world, business, technology, ...)
        #[arg(short, long)]
        category: Option<String>,

        /// Language code (en, ar, ...)
        #[arg(short, long)]
        lang: Option<String>,

        /// Articles per page
        #[arg(short, long)]
        max: Option<u32>,
    },
    /// Reconcile stored articles against the live feed, updating changed ones
    Resync {
        /// Article category (general, world, business, technology, ...)
        #[arg(short, long)]
        category: Option<String>,

        /// Language code (en, ar, ...)
        #[arg(short, long)]
        lang: Option<String>,

        /// Articles per page
        #[arg(short, long)]
        max: Option<u32>,
    },
    /// List stored articles
    List {
        /// Number of articles to display
        #[arg(short, long, default_value_t = 10)]
        limit: u32,

        /// Offset for pagination
        #[arg(short, long, default_value_t = 0)]
        offset: u32,

        /// Filter by language
        #[arg(long)]
        language: Option<String>,

        /// Sort field (publishedAt, createdAt, updatedAt, title)
        #[arg(long, default_value = "publishedAt")]
        order_by: String,

        /// Sort ascending instead of descending
        #[arg(long)]
        asc: bool,
    },
    /// Show a single article by identifier
    Show {
        /// Article identifier
        id: String,
    },
    /// Search the live feed without persisting anything
    Search {
        /// Free-text query
        query: String,

        /// Language code
        #[arg(short, long)]
        lang: Option<String>,

        /// Results per page
        #[arg(short, long)]
        max: Option<u32>,

        /// Page number (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },
    /// Background daemon for periodic resync runs
    Daemon {
        #[command(subcommand)]
        action: DaemonAction,
    },
}

#[derive(Subcommand)]
pub enum DaemonAction {
    /// Start the background daemon
    Start {
        /// Resync interval (e.g., "1h", "30m", "6h", "1d")
        #[arg(short, long, default_value = "1h")]
        interval: String,

        /// Skip the initial resync on start
        #[arg(long)]
        no_initial_run: bool,

        /// Log file path (default: stdout)
        #[arg(short, long)]
        log: Option<std::path::PathBuf>,
    },
    /// Stop the running daemon
    Stop,
    /// Check daemon status
    Status,
}

//! Stockroom CLI - compile search queries and inspect index tasks.
//!
//! Output goes to stdout as JSON; logs go to stderr.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "stockroom")]
#[command(about = "Search query compiler and index task tool for Stockroom")]
struct Args {
    /// Index service base URL
    #[arg(long, env = "STOCKROOM_INDEX_URL", default_value = "http://127.0.0.1:7700", global = true)]
    url: String,

    /// Index service API key
    #[arg(long, env = "STOCKROOM_INDEX_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// SQLite file with custom-field definitions (in-memory if omitted)
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Prefix prepended to every index uid
    #[arg(long, default_value = "", global = true)]
    index_prefix: String,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a query against an explicit keyword list
    Compile {
        query: String,
        /// Recognized custom-field keyword (repeatable)
        #[arg(short, long = "keyword")]
        keywords: Vec<String>,
    },
    /// Search a team's indexes
    Search {
        #[arg(long)]
        team: String,
        query: String,
        #[arg(long, default_value_t = stockroom_core::config::IndexConfig::DEFAULT_SEARCH_LIMIT)]
        limit: u32,
        /// Print the compiled plan without contacting the index service
        #[arg(long)]
        plan: bool,
    },
    /// List a team's recent index tasks
    Tasks {
        #[arg(long)]
        team: String,
    },
    /// Poll a team's index tasks until interrupted
    Watch {
        #[arg(long)]
        team: String,
        #[arg(long, default_value_t = stockroom_core::config::IndexConfig::TASK_POLL_INTERVAL.as_millis() as u64)]
        interval_ms: u64,
    },
    /// Reindex a team's indexes with its current custom fields
    Rebuild {
        #[arg(long)]
        team: String,
    },
    /// List a team's custom fields
    Fields {
        #[arg(long)]
        team: String,
    },
    /// Add a custom field to a team
    AddField {
        #[arg(long)]
        team: String,
        #[arg(long)]
        name: String,
        /// string, number, boolean, date, time, datetime, currency or tag
        #[arg(long = "type", default_value = "string")]
        field_type: String,
    },
    /// Rename a custom field
    RenameField { id: String, name: String },
    /// Remove a custom field
    RemoveField { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    debug!("Index service: {}", args.url);
    commands::run(&args).await
}

use anyhow::{Context, Result};
use clap::Parser;
use lexicon_rater::app::{LogFormat, LogLevel, init_logging};
use lexicon_rater::store::{PgWordStore, populate_from_file};
use std::path::PathBuf;

/// Loads a word list into the `word` table.
#[derive(Parser)]
#[command(name = "word-store-seed", author, version, about, long_about = None)]
struct Args {
    /// Word list to load
    #[arg(short = 's', long, default_value = "funWords.txt")]
    source: PathBuf,

    /// Postgres connection string
    #[arg(long, env = "DB_URL", hide_env_values = true)]
    db_url: String,

    /// Maximum pool connections
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value = "5")]
    max_connections: u32,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: LogLevel,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level, LogFormat::Pretty, None)?;

    let store = PgWordStore::connect(&args.db_url, args.max_connections)
        .await
        .context("Failed to connect to the word store")?;

    let summary = populate_from_file(&store, &args.source)
        .await
        .with_context(|| format!("Failed to seed from {}", args.source.display()))?;

    println!(
        "inserted {} words ({} failed)",
        summary.inserted, summary.failed
    );
    Ok(())
}

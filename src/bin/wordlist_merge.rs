use anyhow::{Context, Result};
use clap::Parser;
use lexicon_rater::app::{LogFormat, LogLevel, init_logging};
use lexicon_rater::wordlist::append_words;
use std::path::PathBuf;

/// Appends the new words of one list onto another.
#[derive(Parser, Debug)]
#[command(name = "wordlist-merge", author, version, about, long_about = None)]
struct Args {
    /// List to take words from
    #[arg(short = 's', long, default_value = "new.txt")]
    source: PathBuf,

    /// List to append to (created if missing)
    #[arg(short = 'd', long, default_value = "master.txt")]
    destination: PathBuf,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: LogLevel,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_level, LogFormat::Pretty, None)?;

    let summary = append_words(&args.source, &args.destination)
        .await
        .with_context(|| {
            format!(
                "Failed to merge {} into {}",
                args.source.display(),
                args.destination.display()
            )
        })?;

    println!(
        "appended {} of {} words to {} ({} already present)",
        summary.appended,
        summary.read,
        args.destination.display(),
        summary.duplicates
    );
    Ok(())
}

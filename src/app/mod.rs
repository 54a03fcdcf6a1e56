pub mod config;
pub mod logging;
pub mod shutdown;

pub use config::{ApiKey, Config, ConfigError, LogFormat, LogLevel};
pub use logging::{LoggingError, init_logging};
pub use shutdown::{join_signal_listener, spawn_signal_listener};

use crate::classifier::GeminiClassifier;
use crate::pipeline::{Pipeline, Summary};
use crate::{sink, wordlist};
use anyhow::{Context, Result};
use clap::CommandFactory;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info, info_span};
use uuid::Uuid;

/// Runs one rating pass with `config`. The sink is closed whether or not the
/// pipeline succeeds.
pub async fn run(config: &Config, cancel: CancellationToken) -> Result<Summary> {
    let source = config
        .source
        .as_deref()
        .context("no source word list configured")?;

    let words = wordlist::read_words(source)
        .await
        .with_context(|| format!("Failed to read word list {}", source.display()))?;
    info!(path = %source.display(), words = words.len(), "loaded word list");

    let classifier = GeminiClassifier::new(config.gemini_config()?)
        .context("Failed to build generation service client")?;
    info!(url = %classifier.generate_url(), model = classifier.model(), "classifier ready");

    let sink = sink::open(config.output_mode, &config.output_dir)
        .await
        .with_context(|| format!("Failed to open output in {}", config.output_dir.display()))?;

    let pipeline = Pipeline::new(
        Arc::new(classifier),
        sink.clone(),
        config.pipeline_options(),
        cancel,
    );
    let run_id = Uuid::new_v4();
    let outcome = pipeline
        .run(&words, config.batch_size)
        .instrument(info_span!("rating_run", %run_id))
        .await;

    if let Err(e) = sink.close().await {
        error!(error = %e, "failed to close output");
        if outcome.is_ok() {
            return Err(e).context("Failed to close output");
        }
    }

    Ok(outcome?)
}

/// Entry point for the `lexicon-rater` binary.
pub async fn main() -> Result<()> {
    let config = Config::from_matches(&Config::command().get_matches())?;

    init_logging(config.log_level, config.log_format, config.log_file.as_deref())?;
    info!("Starting lexicon-rater v{}", crate::VERSION);
    info!(
        source = ?config.source,
        model = %config.model,
        batch_size = config.batch_size,
        concurrency = config.concurrency,
        output_mode = ?config.output_mode,
        output_dir = %config.output_dir.display(),
        "configuration loaded"
    );

    let cancel = CancellationToken::new();
    let listener = spawn_signal_listener(cancel.clone());

    let result = run(&config, cancel.clone()).await;
    cancel.cancel();
    join_signal_listener(listener).await;

    let summary = result?;
    println!("{summary}");
    if summary.cancelled {
        info!("run was cancelled; resume with --start-batch to continue");
    }
    Ok(())
}

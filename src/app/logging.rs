use super::config::{LogFormat, LogLevel};
use once_cell::sync::OnceCell;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, prelude::*};

static LOGGING_INIT: OnceCell<()> = OnceCell::new();

/// Dependency targets that are capped at `warn` unless `RUST_LOG` says otherwise.
const QUIET_TARGETS: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls", "sqlx"];

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter '{filter}': {message}")]
    Filter { filter: String, message: String },
    #[error("Cannot open log file {}: {source}", .path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to install tracing subscriber: {0}")]
    Init(String),
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Filter directives for `level`, with noisy dependencies held at `warn`.
pub fn build_filter_string(level: LogLevel) -> String {
    let mut parts = Vec::with_capacity(QUIET_TARGETS.len() + 1);
    parts.push(level.as_str().to_string());
    parts.extend(QUIET_TARGETS.iter().map(|target| format!("{target}=warn")));
    parts.join(",")
}

fn build_filter(level: LogLevel) -> Result<EnvFilter, LoggingError> {
    let filter = match std::env::var("RUST_LOG") {
        Ok(value) if !value.trim().is_empty() => value,
        _ => build_filter_string(level),
    };
    EnvFilter::try_new(&filter).map_err(|e| LoggingError::Filter {
        filter,
        message: e.to_string(),
    })
}

/// Installs the global subscriber: events to stderr in `format`, and in
/// plain text to `log_file` when given. Later calls are no-ops.
pub fn init_logging(
    level: LogLevel,
    format: LogFormat,
    log_file: Option<&Path>,
) -> Result<(), LoggingError> {
    LOGGING_INIT
        .get_or_try_init(|| {
            let mut layers: Vec<BoxedLayer> = Vec::with_capacity(2);

            let stderr_layer = match format {
                LogFormat::Pretty => fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .compact()
                    .boxed(),
                LogFormat::Json => fmt::layer()
                    .with_writer(std::io::stderr)
                    .json()
                    .with_current_span(false)
                    .boxed(),
            };
            layers.push(stderr_layer);

            if let Some(path) = log_file {
                let file = OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(path)
                    .map_err(|source| LoggingError::LogFile {
                        path: path.to_path_buf(),
                        source,
                    })?;
                layers.push(
                    fmt::layer()
                        .with_ansi(false)
                        .with_target(true)
                        .with_writer(Mutex::new(file))
                        .boxed(),
                );
            }

            tracing_subscriber::registry()
                .with(layers)
                .with(build_filter(level)?)
                .try_init()
                .map_err(|e| LoggingError::Init(e.to_string()))
        })
        .map(|_| ())
}

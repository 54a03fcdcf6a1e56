use crate::classifier::GeminiConfig;
use crate::classifier::gemini::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::pipeline::PipelineOptions;
use crate::reliability::RetryConfig;
use crate::sink::OutputMode;
use clap::parser::ValueSource;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("Missing credential: set GEMINI_API_KEY")]
    MissingCredential,
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable, compact
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Generation service credential. Never printed.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<String> for ApiKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(name = "lexicon-rater", author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Word list to rate, one word per line
    #[arg(short = 's', long, env = "WORD_SOURCE")]
    pub source: Option<PathBuf>,

    /// Generation service API key
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    #[serde(skip_serializing)]
    pub api_key: Option<ApiKey>,

    /// Generation service base URL
    #[arg(long, env = "GEMINI_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    /// Model name, with or without the `models/` prefix
    #[arg(long, env = "GEMINI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Maximum words per request
    #[arg(long, env = "BATCH_SIZE", default_value = "1200")]
    pub batch_size: usize,

    /// Maximum requests in flight
    #[arg(long, env = "CONCURRENCY", default_value = "1")]
    pub concurrency: usize,

    /// Sampling temperature
    #[arg(long, env = "TEMPERATURE", default_value = "0.6")]
    pub temperature: f32,

    /// Nucleus sampling probability mass
    #[arg(long, env = "TOP_P", default_value = "0.6")]
    pub top_p: f32,

    /// Per-request timeout in seconds
    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value = "120")]
    pub request_timeout_secs: u64,

    /// Attempts per batch, including the first
    #[arg(long, env = "MAX_ATTEMPTS", default_value = "3")]
    pub max_attempts: usize,

    /// Base retry backoff in milliseconds
    #[arg(long, env = "BACKOFF_BASE_MS", default_value = "500")]
    pub backoff_base_ms: u64,

    /// Retry backoff ceiling in milliseconds
    #[arg(long, env = "BACKOFF_CAP_MS", default_value = "30000")]
    pub backoff_cap_ms: u64,

    /// Output layout
    #[arg(long, env = "OUTPUT_MODE", default_value = "flat")]
    pub output_mode: OutputMode,

    /// Directory receiving the rated word files
    #[arg(long, env = "OUTPUT_DIR", default_value = "output_rated_words")]
    pub output_dir: PathBuf,

    /// First batch to process (earlier batches are skipped)
    #[arg(long, env = "START_BATCH", default_value = "0")]
    pub start_batch: usize,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", default_value = "pretty")]
    pub log_format: LogFormat,

    /// Also append logs to this file
    #[arg(long, env = "LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// TOML configuration file; flags given on the command line override it
    #[arg(long, env = "CONFIG_FILE")]
    #[serde(skip)]
    pub config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: None,
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            batch_size: 1200,
            concurrency: 1,
            temperature: 0.6,
            top_p: 0.6,
            request_timeout_secs: 120,
            max_attempts: 3,
            backoff_base_ms: 500,
            backoff_cap_ms: 30_000,
            output_mode: OutputMode::Flat,
            output_dir: PathBuf::from("output_rated_words"),
            start_batch: 0,
            log_level: LogLevel::Info,
            log_format: LogFormat::Pretty,
            log_file: None,
            config_file: None,
        }
    }
}

impl Config {
    /// Parses arguments (with environment fallbacks). See [`Config::from_matches`].
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let matches = Config::command()
            .try_get_matches_from(args)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        Self::from_matches(&matches)
    }

    /// Builds and validates the configuration. When a config file is named,
    /// it supplies the base values and any flag given on the command line
    /// overrides it; environment variables do not.
    pub fn from_matches(matches: &ArgMatches) -> Result<Self, ConfigError> {
        let args = Config::from_arg_matches(matches)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;

        let config = match args.config_file.clone() {
            Some(path) => Self::load_file(&path)?.overlay_command_line(&args, matches)?,
            None => args,
        };
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a TOML file. The credential falls back to the
    /// environment when the file does not carry one.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config = Self::load_file(path.as_ref())?;
        config.validate()?;
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.config_file = Some(path.to_path_buf());

        if config.api_key.is_none() {
            config.api_key = std::env::var(API_KEY_ENV).ok().map(ApiKey::from);
        }
        Ok(config)
    }

    /// Replaces every field whose flag was typed on the command line with
    /// the value from `args`.
    fn overlay_command_line(self, args: &Config, matches: &ArgMatches) -> Result<Self, ConfigError> {
        let from_command_line =
            |id: &str| matches.value_source(id) == Some(ValueSource::CommandLine);
        let to_value = |config: &Config| {
            serde_json::to_value(config).map_err(|e| ConfigError::InvalidConfig(e.to_string()))
        };

        let mut merged = to_value(&self)?;
        if let (Value::Object(fields), Value::Object(given)) = (&mut merged, to_value(args)?) {
            for (id, value) in given {
                if from_command_line(id.as_str()) {
                    fields.insert(id, value);
                }
            }
        }

        let mut merged: Config = serde_json::from_value(merged)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        merged.api_key = if from_command_line("api_key") {
            args.api_key.clone()
        } else {
            self.api_key
        };
        merged.config_file = self.config_file;
        Ok(merged)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match &self.api_key {
            Some(key) if !key.is_blank() => {}
            _ => return Err(ConfigError::MissingCredential),
        }

        if self.source.is_none() {
            return Err(ConfigError::InvalidConfig(
                "source word list is required (-s/--source)".to_string(),
            ));
        }

        if self.batch_size == 0 {
            return Err(ConfigError::InvalidConfig(
                "batch size must be greater than 0".to_string(),
            ));
        }

        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConfig(
                "concurrency must be greater than 0".to_string(),
            ));
        }

        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidConfig(
                "max attempts must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "request timeout must be greater than 0".to_string(),
            ));
        }

        let url = Url::parse(&self.endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("{}: {e}", self.endpoint)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl(format!(
                "unsupported scheme '{}' in {}",
                url.scheme(),
                self.endpoint
            )));
        }

        if self.model.trim().trim_start_matches("models/").is_empty() {
            return Err(ConfigError::InvalidConfig(
                "model name must not be empty".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::InvalidConfig(format!(
                "temperature must be within 0..=2, got {}",
                self.temperature
            )));
        }

        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(ConfigError::InvalidConfig(format!(
                "top_p must be within 0..=1, got {}",
                self.top_p
            )));
        }

        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(self.max_attempts, self.backoff_base_ms, self.backoff_cap_ms)
    }

    pub fn gemini_config(&self) -> Result<GeminiConfig, ConfigError> {
        let api_key = self
            .api_key
            .as_ref()
            .filter(|key| !key.is_blank())
            .ok_or(ConfigError::MissingCredential)?;

        Ok(GeminiConfig {
            endpoint: self.endpoint.clone(),
            api_key: api_key.expose().to_string(),
            model: self.model.clone(),
            temperature: self.temperature,
            top_p: self.top_p,
            timeout: self.request_timeout(),
            retry: self.retry_config(),
            ..GeminiConfig::default()
        })
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            concurrency: NonZeroUsize::new(self.concurrency).unwrap_or(NonZeroUsize::MIN),
            start_batch: self.start_batch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> Config {
        Config {
            source: Some(PathBuf::from("words.txt")),
            api_key: Some(ApiKey::from("key".to_string())),
            ..Config::default()
        }
    }

    #[test]
    fn defaults_are_valid_once_source_and_key_are_set() {
        valid().validate().unwrap();
    }

    #[test]
    fn validate_rejects_each_bad_field() {
        let cases: Vec<(&str, Config)> = vec![
            ("batch", Config { batch_size: 0, ..valid() }),
            ("concurrency", Config { concurrency: 0, ..valid() }),
            ("attempts", Config { max_attempts: 0, ..valid() }),
            ("temperature", Config { temperature: 2.5, ..valid() }),
            ("top_p", Config { top_p: -0.1, ..valid() }),
            ("source", Config { source: None, ..valid() }),
            ("model", Config { model: "models/".to_string(), ..valid() }),
        ];
        for (name, config) in cases {
            assert!(
                matches!(config.validate(), Err(ConfigError::InvalidConfig(_))),
                "{name} should be rejected"
            );
        }

        let bad_url = Config {
            endpoint: "ftp://example.test/".to_string(),
            ..valid()
        };
        assert!(matches!(bad_url.validate(), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn blank_key_is_missing_credential() {
        let config = Config {
            api_key: Some(ApiKey::from("  ".to_string())),
            ..valid()
        };
        assert!(matches!(config.validate(), Err(ConfigError::MissingCredential)));
        assert!(matches!(config.gemini_config(), Err(ConfigError::MissingCredential)));
    }

    #[test]
    fn debug_never_shows_the_key() {
        let config = Config {
            api_key: Some(ApiKey::from("super-secret".to_string())),
            ..valid()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn derived_settings_follow_fields() {
        let config = Config {
            concurrency: 4,
            start_batch: 7,
            max_attempts: 5,
            request_timeout_secs: 30,
            ..valid()
        };
        let options = config.pipeline_options();
        assert_eq!(options.concurrency.get(), 4);
        assert_eq!(options.start_batch, 7);

        let gemini = config.gemini_config().unwrap();
        assert_eq!(gemini.api_key, "key");
        assert_eq!(gemini.timeout, Duration::from_secs(30));
        assert_eq!(gemini.retry.max_attempts, 5);
    }

    #[test]
    fn log_level_converts_to_tracing_level() {
        assert_eq!(tracing::Level::from(LogLevel::Warn), tracing::Level::WARN);
        assert_eq!(LogLevel::Debug.as_str(), "debug");
    }
}

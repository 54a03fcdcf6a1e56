use lexicon_rater::app::{Config, ConfigError, LogFormat, LogLevel};
use lexicon_rater::sink::OutputMode;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

const ENV_VARS: &[&str] = &[
    "GEMINI_API_KEY",
    "GEMINI_ENDPOINT",
    "GEMINI_MODEL",
    "WORD_SOURCE",
    "BATCH_SIZE",
    "CONCURRENCY",
    "TEMPERATURE",
    "TOP_P",
    "REQUEST_TIMEOUT_SECS",
    "MAX_ATTEMPTS",
    "BACKOFF_BASE_MS",
    "BACKOFF_CAP_MS",
    "OUTPUT_MODE",
    "OUTPUT_DIR",
    "START_BATCH",
    "LOG_LEVEL",
    "LOG_FORMAT",
    "LOG_FILE",
    "CONFIG_FILE",
];

fn clean_env() {
    unsafe {
        for var in ENV_VARS {
            env::remove_var(var);
        }
    }
}

#[test]
#[serial]
fn from_args_applies_defaults() {
    clean_env();
    let config = Config::from_args(["lexicon-rater", "-s", "words.txt", "--api-key", "k"]).unwrap();

    assert_eq!(config.source, Some(PathBuf::from("words.txt")));
    assert_eq!(
        config.endpoint,
        "https://generativelanguage.googleapis.com/v1beta/"
    );
    assert_eq!(config.model, "gemini-2.0-flash");
    assert_eq!(config.batch_size, 1200);
    assert_eq!(config.concurrency, 1);
    assert!((config.temperature - 0.6).abs() < f32::EPSILON);
    assert!((config.top_p - 0.6).abs() < f32::EPSILON);
    assert_eq!(config.request_timeout_secs, 120);
    assert_eq!(config.max_attempts, 3);
    assert_eq!(config.output_mode, OutputMode::Flat);
    assert_eq!(config.output_dir, PathBuf::from("output_rated_words"));
    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(config.log_format, LogFormat::Pretty);
}

#[test]
#[serial]
fn credential_comes_from_environment() {
    clean_env();
    unsafe {
        env::set_var("GEMINI_API_KEY", "env-key");
        env::set_var("OUTPUT_MODE", "bucketed");
        env::set_var("BATCH_SIZE", "50");
    }

    let config = Config::from_args(["lexicon-rater", "--source", "words.txt"]).unwrap();

    assert_eq!(config.api_key.as_ref().map(|k| k.expose()), Some("env-key"));
    assert_eq!(config.output_mode, OutputMode::Bucketed);
    assert_eq!(config.batch_size, 50);
    clean_env();
}

#[test]
#[serial]
fn missing_credential_is_rejected() {
    clean_env();
    let err = Config::from_args(["lexicon-rater", "-s", "words.txt"]).unwrap_err();
    assert!(matches!(err, ConfigError::MissingCredential));
}

#[test]
#[serial]
fn invalid_values_are_rejected() {
    clean_env();
    let err = Config::from_args([
        "lexicon-rater",
        "-s",
        "words.txt",
        "--api-key",
        "k",
        "--batch-size",
        "0",
    ])
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidConfig(_)));

    let err = Config::from_args([
        "lexicon-rater",
        "-s",
        "words.txt",
        "--api-key",
        "k",
        "--endpoint",
        "not a url",
    ])
    .unwrap_err();
    assert!(matches!(err, ConfigError::InvalidUrl(_)));

    let err = Config::from_args(["lexicon-rater", "--output-mode", "sideways"]).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidConfig(_)));
}

#[test]
#[serial]
fn config_file_supplies_unset_arguments() {
    clean_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rater.toml");
    std::fs::write(
        &path,
        r#"
source = "funWords.txt"
api_key = "file-key"
batch_size = 300
concurrency = 2
output_mode = "bucketed"
log_format = "json"
"#,
    )
    .unwrap();

    let config = Config::from_args([
        "lexicon-rater",
        "--config-file",
        path.to_str().unwrap(),
    ])
    .unwrap();

    assert_eq!(config.source, Some(PathBuf::from("funWords.txt")));
    assert_eq!(config.api_key.as_ref().map(|k| k.expose()), Some("file-key"));
    assert_eq!(config.batch_size, 300);
    assert_eq!(config.concurrency, 2);
    assert_eq!(config.output_mode, OutputMode::Bucketed);
    assert_eq!(config.log_format, LogFormat::Json);
    // Unset fields keep their defaults.
    assert_eq!(config.model, "gemini-2.0-flash");
    assert_eq!(config.config_file, Some(path));
}

#[test]
#[serial]
fn command_line_flags_override_config_file() {
    clean_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rater.toml");
    std::fs::write(
        &path,
        r#"
source = "funWords.txt"
api_key = "file-key"
batch_size = 300
output_mode = "bucketed"
"#,
    )
    .unwrap();
    unsafe {
        env::set_var("BATCH_SIZE", "50");
    }

    let config = Config::from_args([
        "lexicon-rater",
        "--config-file",
        path.to_str().unwrap(),
        "-s",
        "rapWords.txt",
        "--output-mode",
        "flat",
        "--api-key",
        "cli-key",
    ])
    .unwrap();

    assert_eq!(config.source, Some(PathBuf::from("rapWords.txt")));
    assert_eq!(config.output_mode, OutputMode::Flat);
    assert_eq!(config.api_key.as_ref().map(|k| k.expose()), Some("cli-key"));
    // Environment values do not override the file.
    assert_eq!(config.batch_size, 300);
    assert_eq!(config.config_file, Some(path));
    clean_env();
}

#[test]
#[serial]
fn command_line_source_completes_config_file() {
    clean_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rater.toml");
    std::fs::write(&path, "api_key = \"file-key\"\nconcurrency = 3\n").unwrap();

    let config = Config::from_args([
        "lexicon-rater",
        "--config-file",
        path.to_str().unwrap(),
        "--source",
        "words.txt",
    ])
    .unwrap();

    assert_eq!(config.source, Some(PathBuf::from("words.txt")));
    assert_eq!(config.concurrency, 3);
    assert_eq!(config.api_key.as_ref().map(|k| k.expose()), Some("file-key"));
}

#[test]
#[serial]
fn config_file_falls_back_to_env_credential() {
    clean_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rater.toml");
    std::fs::write(&path, "source = \"words.txt\"\n").unwrap();

    assert!(matches!(
        Config::from_file(&path),
        Err(ConfigError::MissingCredential)
    ));

    unsafe {
        env::set_var("GEMINI_API_KEY", "env-key");
    }
    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.api_key.as_ref().map(|k| k.expose()), Some("env-key"));
    clean_env();
}

#[test]
#[serial]
fn malformed_config_file_is_a_parse_error() {
    clean_env();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("rater.toml");
    std::fs::write(&path, "batch_size = \"many\"\n").unwrap();

    assert!(matches!(
        Config::from_file(&path),
        Err(ConfigError::ParseError(_))
    ));
}

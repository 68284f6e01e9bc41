//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If the required variable is missing, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `FEEDMINDER_GOOGLE_CLIENT_ID`: OAuth client id (required)
//! - `FEEDMINDER_GOOGLE_CLIENT_SECRET`: OAuth client secret
//! - `FEEDMINDER_DB_PATH`: Database file path
//! - `FEEDMINDER_DB_POOL_SIZE`: Connection pool size
//! - `FEEDMINDER_RETRY_ATTEMPTS`: Delivery attempts per operation
//! - `FEEDMINDER_RETRY_INITIAL_DELAY_MS`: First retry delay in milliseconds
//! - `FEEDMINDER_ALARM_SWEEP_CRON`: Cron expression for the alarm sweep
//! - `FEEDMINDER_MAX_ERROR_LOG_ENTRIES`: Error log bound (`0` disables it)
//!
//! Optional variables fall back to [`Config::default`].
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./feedminder.json` or `./feedminder.toml` (current working directory)
//! 2. `./config.json` or `./config.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use feedminder_domain::{Config, FeedminderError, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the client id is
/// not set there, falls back to loading from a config file. The result is
/// validated either way.
///
/// # Errors
/// Returns `FeedminderError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Validation fails
pub fn load() -> Result<Config> {
    let config = match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            config
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)?
        }
    };

    config.validate()?;
    Ok(config)
}

/// Load configuration from environment variables
///
/// `FEEDMINDER_GOOGLE_CLIENT_ID` is required; every other variable is
/// optional and overrides the corresponding default.
///
/// # Errors
/// Returns `FeedminderError::Config` if the client id is missing or a
/// numeric variable does not parse.
pub fn load_from_env() -> Result<Config> {
    let mut config = Config::default();

    config.google.client_id = env_var("FEEDMINDER_GOOGLE_CLIENT_ID")?;
    config.google.client_secret = optional_env("FEEDMINDER_GOOGLE_CLIENT_SECRET");

    if let Some(path) = optional_env("FEEDMINDER_DB_PATH") {
        config.database.path = path;
    }
    if let Some(pool_size) = env_parse::<u32>("FEEDMINDER_DB_POOL_SIZE", "pool size")? {
        config.database.pool_size = pool_size;
    }
    if let Some(attempts) = env_parse::<u32>("FEEDMINDER_RETRY_ATTEMPTS", "retry attempts")? {
        config.delivery.retry_attempts = attempts;
    }
    if let Some(delay) =
        env_parse::<u64>("FEEDMINDER_RETRY_INITIAL_DELAY_MS", "initial retry delay")?
    {
        config.delivery.initial_retry_delay_ms = delay;
    }
    if let Some(cron) = optional_env("FEEDMINDER_ALARM_SWEEP_CRON") {
        config.alarms.sweep_cron = cron;
    }
    if let Some(limit) =
        env_parse::<usize>("FEEDMINDER_MAX_ERROR_LOG_ENTRIES", "error log bound")?
    {
        config.diagnostics.max_error_log_entries = (limit > 0).then_some(limit);
    }

    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `FeedminderError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(FeedminderError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            FeedminderError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| FeedminderError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`). Missing
/// sections and fields take their defaults.
///
/// # Errors
/// Returns `FeedminderError::Config` if format is invalid or parsing fails.
pub fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| FeedminderError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| FeedminderError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(FeedminderError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches the current working directory, its parents (up to 2 levels) and
/// the executable's directory.
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 8] = [
        "feedminder.json",
        "feedminder.toml",
        "config.json",
        "config.toml",
        "../config.json",
        "../config.toml",
        "../../config.json",
        "../../config.toml",
    ];

    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `FeedminderError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        FeedminderError::Config(format!("Missing required environment variable: {key}"))
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_env(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| FeedminderError::Config(format!("Invalid {what}: {e}")))
        })
        .transpose()
}

//! Startup configuration
//!
//! Values come from a flat JSON file (default `config.json`) with
//! environment variables overriding it. `.env` is loaded first.

use crate::completion::DEFAULT_DOBBY_API_URL;
use crate::error::WatcherError;
use crate::retry::RetryPolicy;
use crate::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_PATH_VAR: &str = "WHALE_WATCHER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.json";
pub const LOG_PATH_VAR: &str = "WHALE_WATCHER_LOG";
pub const DEFAULT_LOG_PATH: &str = "whale_watcher.log";

const WHALE_ALERT_API_KEY: &str = "WHALE_ALERT_API_KEY";
const DOBBY_API_KEY: &str = "DOBBY_API_KEY";
const TAVILY_API_KEY: &str = "TAVILY_API_KEY";

#[derive(Clone)]
pub struct Config {
    pub whale_alert_api_key: String,
    pub dobby_api_key: String,
    pub tavily_api_key: String,
    pub dobby_api_url: String,
    pub output_path: PathBuf,
    pub log_path: PathBuf,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub cache_ttl: Duration,
    pub request_timeout: Duration,
}

impl Config {
    /// Load from `.env`, the JSON config file and the process environment.
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let path = env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let file_values = read_config_file(Path::new(&path))?;

        Self::from_lookup(&path, file_values, |key| env::var(key).ok())
    }

    /// Resolve every key, preferring `env_lookup` over `file_values`.
    ///
    /// `file_values` is `None` when the config file does not exist.
    pub fn from_lookup<F>(
        config_path: &str,
        file_values: Option<HashMap<String, String>>,
        env_lookup: F,
    ) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file_found = file_values.is_some();
        let file_values = file_values.unwrap_or_default();

        let lookup = |key: &str| -> Option<String> {
            env_lookup(key)
                .or_else(|| file_values.get(key).cloned())
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let required = |key: &str| -> Result<String> {
            lookup(key).ok_or_else(|| {
                if file_found {
                    WatcherError::Config(format!("Missing key in config: {}", key))
                } else {
                    WatcherError::Config(format!(
                        "{} not found and {} is not set. Please create it with API keys.",
                        config_path, key
                    ))
                }
            })
        };

        let seconds = |key: &str, default: u64| -> Result<Duration> {
            match lookup(key) {
                Some(raw) => raw.parse::<u64>().map(Duration::from_secs).map_err(|_| {
                    WatcherError::Config(format!("{} must be a whole number of seconds, got '{}'", key, raw))
                }),
                None => Ok(Duration::from_secs(default)),
            }
        };

        let retry_attempts = match lookup("RETRY_ATTEMPTS") {
            Some(raw) => raw.parse::<u32>().ok().filter(|n| *n > 0).ok_or_else(|| {
                WatcherError::Config(format!("RETRY_ATTEMPTS must be a positive integer, got '{}'", raw))
            })?,
            None => crate::retry::DEFAULT_MAX_ATTEMPTS,
        };

        Ok(Self {
            whale_alert_api_key: required(WHALE_ALERT_API_KEY)?,
            dobby_api_key: required(DOBBY_API_KEY)?,
            tavily_api_key: required(TAVILY_API_KEY)?,
            dobby_api_url: lookup("DOBBY_API_URL").unwrap_or_else(|| DEFAULT_DOBBY_API_URL.to_string()),
            output_path: lookup("WHALE_WATCHER_OUTPUT")
                .unwrap_or_else(|| "whale_watcher_output.txt".to_string())
                .into(),
            log_path: lookup(LOG_PATH_VAR)
                .unwrap_or_else(|| DEFAULT_LOG_PATH.to_string())
                .into(),
            retry_attempts,
            retry_delay: seconds("RETRY_DELAY_SECS", 5)?,
            cache_ttl: seconds("CACHE_TTL_SECS", 300)?,
            request_timeout: seconds("REQUEST_TIMEOUT_SECS", 30)?,
        })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.retry_attempts, self.retry_delay)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("whale_alert_api_key", &"<redacted>")
            .field("dobby_api_key", &"<redacted>")
            .field("tavily_api_key", &"<redacted>")
            .field("dobby_api_url", &self.dobby_api_url)
            .field("output_path", &self.output_path)
            .field("log_path", &self.log_path)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_delay", &self.retry_delay)
            .field("cache_ttl", &self.cache_ttl)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Log file for reporting a configuration failure, before any `Config` exists.
pub fn fallback_log_path<F>(env_lookup: F) -> PathBuf
where
    F: Fn(&str) -> Option<String>,
{
    env_lookup(LOG_PATH_VAR)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_LOG_PATH.to_string())
        .into()
}

/// Flat JSON object of settings; `None` when the file is absent.
fn read_config_file(path: &Path) -> Result<Option<HashMap<String, String>>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    parse_config_json(&contents)
        .map(Some)
        .map_err(|e| WatcherError::Config(format!("{}: {}", path.display(), e)))
}

fn parse_config_json(contents: &str) -> std::result::Result<HashMap<String, String>, String> {
    let value: Value = serde_json::from_str(contents).map_err(|e| e.to_string())?;
    let object = value
        .as_object()
        .ok_or_else(|| "expected a JSON object of settings".to_string())?;

    let mut values = HashMap::with_capacity(object.len());
    for (key, value) in object {
        let text = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => continue,
            _ => return Err(format!("{} must be a string or number", key)),
        };
        values.insert(key.clone(), text);
    }

    Ok(values)
}

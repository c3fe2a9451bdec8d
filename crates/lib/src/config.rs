//! # Application Configuration
//!
//! Configuration is read once at startup from the process environment (after an
//! optional `.env` file has been loaded with `dotenvy`) and validated per command:
//! the recurring job needs a feed URL and a target store, the listing command only
//! needs the store, and every command needs the API key.

use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

pub const RSS_FEED_URL: &str = "RSS_FEED_URL";
pub const VECTOR_STORE_ID: &str = "VECTOR_STORE_ID";
pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
pub const REQUEST_TIMEOUT_SECS: &str = "FEEDVAULT_REQUEST_TIMEOUT_SECS";
pub const SCHEDULE_HOURS: &str = "FEEDVAULT_SCHEDULE_HOURS";
pub const MAX_RETRIES: &str = "FEEDVAULT_MAX_RETRIES";
pub const STORE_NAME: &str = "FEEDVAULT_STORE_NAME";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SCHEDULE_HOURS: u64 = 6;
const DEFAULT_MAX_RETRIES: usize = 3;
const DEFAULT_STORE_NAME: &str = "Publisher Content Store";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing required configuration: {0} must be set")]
    Missing(&'static str),
    #[error("Invalid value for {var}: '{value}'")]
    Invalid { var: &'static str, value: String },
}

/// Service credential. Kept opaque so it never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// The fully resolved configuration shared by all commands.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Feed to poll. Loaded from `RSS_FEED_URL`.
    pub feed_url: Option<String>,
    /// Target vector store. Loaded from `VECTOR_STORE_ID`.
    pub vector_store_id: Option<String>,
    /// Loaded from `OPENAI_API_KEY`.
    pub api_key: ApiKey,
    /// Loaded from `OPENAI_BASE_URL`, without a trailing slash.
    pub api_base_url: String,
    /// Upper bound for every remote call.
    pub request_timeout: Duration,
    /// Period between job runs.
    pub schedule_interval: Duration,
    /// Retries for transient upload/attach failures.
    pub max_retries: usize,
    /// Name used when creating a new vector store.
    pub store_name: String,
}

/// The subset of configuration the recurring job cannot run without.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobConfig {
    pub feed_url: String,
    pub vector_store_id: String,
}

impl AppConfig {
    /// Loads `.env` (if present) and reads the configuration from the environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment overrides from '{}'.", path.display());
        }
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = read(OPENAI_API_KEY)
            .map(ApiKey::new)
            .ok_or(ConfigError::Missing(OPENAI_API_KEY))?;

        let api_base_url = read(OPENAI_BASE_URL)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs = parse_var(REQUEST_TIMEOUT_SECS, read(REQUEST_TIMEOUT_SECS))?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let schedule_hours =
            parse_var(SCHEDULE_HOURS, read(SCHEDULE_HOURS))?.unwrap_or(DEFAULT_SCHEDULE_HOURS);
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: REQUEST_TIMEOUT_SECS,
                value: "0".to_string(),
            });
        }
        let schedule_secs = schedule_hours
            .checked_mul(60 * 60)
            .filter(|secs| *secs > 0)
            .ok_or_else(|| ConfigError::Invalid {
                var: SCHEDULE_HOURS,
                value: schedule_hours.to_string(),
            })?;

        Ok(Self {
            feed_url: read(RSS_FEED_URL),
            vector_store_id: read(VECTOR_STORE_ID),
            api_key,
            api_base_url,
            request_timeout: Duration::from_secs(timeout_secs),
            schedule_interval: Duration::from_secs(schedule_secs),
            max_retries: parse_var(MAX_RETRIES, read(MAX_RETRIES))?.unwrap_or(DEFAULT_MAX_RETRIES),
            store_name: read(STORE_NAME).unwrap_or_else(|| DEFAULT_STORE_NAME.to_string()),
        })
    }

    /// Validates that everything the recurring job needs is present.
    pub fn job_config(&self) -> Result<JobConfig, ConfigError> {
        Ok(JobConfig {
            feed_url: self
                .feed_url
                .clone()
                .ok_or(ConfigError::Missing(RSS_FEED_URL))?,
            vector_store_id: self.require_store_id()?.to_string(),
        })
    }

    pub fn require_store_id(&self) -> Result<&str, ConfigError> {
        self.vector_store_id
            .as_deref()
            .ok_or(ConfigError::Missing(VECTOR_STORE_ID))
    }
}

fn parse_var<T: std::str::FromStr>(
    var: &'static str,
    value: Option<String>,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|v| v.parse::<T>().map_err(|_| ConfigError::Invalid { var, value: v }))
        .transpose()
}

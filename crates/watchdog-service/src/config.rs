//! Watchdog configuration.
//!
//! Configuration is loaded from environment variables. The ingest server and
//! the checker each have their own config type because they run as separate
//! processes with different credentials. All sensitive fields are redacted in
//! Debug output.

use crate::services::scale_schedule::ScaleDownSchedule;
use secrecy::SecretString;
use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP bind address for the ingest server.
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Default staleness threshold in seconds (5 minutes).
pub const DEFAULT_STALENESS_THRESHOLD_SECONDS: u64 = 300;

/// Default Slack Web API base URL.
pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api";

/// Default maximum database connections for the ingest server.
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid staleness threshold configuration: {0}")]
    InvalidStalenessThreshold(String),

    #[error("Invalid database pool configuration: {0}")]
    InvalidDbPool(String),

    #[error("Invalid scale-down schedule configuration: {0}")]
    InvalidScaleSchedule(String),
}

/// Ingest server configuration.
#[derive(Clone)]
pub struct ServerConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Server bind address (default: "0.0.0.0:8080").
    pub bind_address: String,

    /// Shared secret expected in the `verify_token` query parameter.
    pub verify_token: SecretString,

    /// Optional environment label (e.g. "staging") for logs.
    pub environment_name: Option<String>,

    /// Maximum database pool connections (default: 10).
    pub db_max_connections: u32,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("database_url", &"[REDACTED]")
            .field("bind_address", &self.bind_address)
            .field("verify_token", &"[REDACTED]")
            .field("environment_name", &self.environment_name)
            .field("db_max_connections", &self.db_max_connections)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = required(vars, "DATABASE_URL")?;
        let verify_token = SecretString::from(required(vars, "VERIFY_TOKEN")?);

        let bind_address = vars
            .get("BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string());

        let db_max_connections = if let Some(value_str) = vars.get("DB_MAX_CONNECTIONS") {
            let value: u32 = value_str.parse().map_err(|e| {
                ConfigError::InvalidDbPool(format!(
                    "DB_MAX_CONNECTIONS must be a valid positive integer, got '{}': {}",
                    value_str, e
                ))
            })?;

            if value == 0 {
                return Err(ConfigError::InvalidDbPool(
                    "DB_MAX_CONNECTIONS must be greater than 0".to_string(),
                ));
            }

            value
        } else {
            DEFAULT_DB_MAX_CONNECTIONS
        };

        Ok(ServerConfig {
            database_url,
            bind_address,
            verify_token,
            environment_name: optional(vars, "ENVIRONMENT_NAME"),
            db_max_connections,
        })
    }
}

/// Staleness checker configuration.
#[derive(Clone)]
pub struct CheckerConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,

    /// Slack bot token used to post messages.
    pub slack_token: SecretString,

    /// Slack channel receiving alert and recovery messages.
    pub slack_channel: String,

    /// Slack Web API base URL (overridable for tests).
    pub slack_api_url: String,

    /// Silence longer than this marks a cluster stale.
    pub staleness_threshold: Duration,

    /// Optional environment label appended to message titles.
    pub environment_name: Option<String>,

    /// Clusters that are expected to be silent during scheduled scale-down.
    pub scale_down: Option<ScaleDownSchedule>,
}

impl fmt::Debug for CheckerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckerConfig")
            .field("database_url", &"[REDACTED]")
            .field("slack_token", &"[REDACTED]")
            .field("slack_channel", &self.slack_channel)
            .field("slack_api_url", &self.slack_api_url)
            .field("staleness_threshold", &self.staleness_threshold)
            .field("environment_name", &self.environment_name)
            .field("scale_down", &self.scale_down)
            .finish()
    }
}

impl CheckerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let database_url = required(vars, "DATABASE_URL")?;
        let slack_token = SecretString::from(required(vars, "SLACK_TOKEN")?);
        let slack_channel = required(vars, "SLACK_CHANNEL")?;

        let slack_api_url = vars
            .get("SLACK_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_SLACK_API_URL.to_string());

        let staleness_threshold_seconds =
            if let Some(value_str) = vars.get("STALENESS_THRESHOLD_SECONDS") {
                let value: u64 = value_str.parse().map_err(|e| {
                    ConfigError::InvalidStalenessThreshold(format!(
                        "STALENESS_THRESHOLD_SECONDS must be a valid positive integer, got '{}': {}",
                        value_str, e
                    ))
                })?;

                if value == 0 {
                    return Err(ConfigError::InvalidStalenessThreshold(
                        "STALENESS_THRESHOLD_SECONDS must be greater than 0".to_string(),
                    ));
                }

                value
            } else {
                DEFAULT_STALENESS_THRESHOLD_SECONDS
            };

        let scale_down = parse_scale_down(vars)?;

        Ok(CheckerConfig {
            database_url,
            slack_token,
            slack_channel,
            slack_api_url,
            staleness_threshold: Duration::from_secs(staleness_threshold_seconds),
            environment_name: optional(vars, "ENVIRONMENT_NAME"),
            scale_down,
        })
    }
}

/// Parse the optional scale-down window.
///
/// Both cron expressions become mandatory once any cluster is listed.
fn parse_scale_down(
    vars: &HashMap<String, String>,
) -> Result<Option<ScaleDownSchedule>, ConfigError> {
    let clusters: Vec<String> = vars
        .get("SCALE_DOWN_CLUSTERS")
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    if clusters.is_empty() {
        return Ok(None);
    }

    let down_expr = vars.get("SCALE_DOWN_CRON").ok_or_else(|| {
        ConfigError::InvalidScaleSchedule(
            "SCALE_DOWN_CRON is required when SCALE_DOWN_CLUSTERS is set".to_string(),
        )
    })?;
    let up_expr = vars.get("SCALE_UP_CRON").ok_or_else(|| {
        ConfigError::InvalidScaleSchedule(
            "SCALE_UP_CRON is required when SCALE_DOWN_CLUSTERS is set".to_string(),
        )
    })?;

    ScaleDownSchedule::new(clusters, down_expr, up_expr)
        .map(Some)
        .map_err(ConfigError::InvalidScaleSchedule)
}

fn required(vars: &HashMap<String, String>, name: &str) -> Result<String, ConfigError> {
    vars.get(name)
        .filter(|value| !value.trim().is_empty())
        .cloned()
        .ok_or_else(|| ConfigError::MissingEnvVar(name.to_string()))
}

fn optional(vars: &HashMap<String, String>, name: &str) -> Option<String> {
    vars.get(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

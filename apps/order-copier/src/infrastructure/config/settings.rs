//! Copier Configuration Settings
//!
//! Configuration types for the copier, loaded from environment variables.
//! Credentials for both accounts are required; everything else has a
//! default, and malformed optional values fall back to it.

use std::time::Duration;

use crate::infrastructure::alpaca::{Credentials, HeartbeatConfig};

/// Trading environment (paper vs live).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Paper trading environment (simulated).
    #[default]
    Paper,
    /// Live trading environment (real money).
    Live,
}

impl Environment {
    /// Parse environment from string. Anything but `LIVE` is paper.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "LIVE" => Self::Live,
            _ => Self::Paper,
        }
    }

    /// Check if this is the live environment.
    #[must_use]
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    /// Get the environment name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Paper => "paper",
            Self::Live => "live",
        }
    }

    /// Trading REST API base URL.
    #[must_use]
    pub const fn trading_api_url(&self) -> &'static str {
        match self {
            Self::Paper => "https://paper-api.alpaca.markets",
            Self::Live => "https://api.alpaca.markets",
        }
    }

    /// Trade updates WebSocket URL.
    #[must_use]
    pub const fn trade_updates_url(&self) -> &'static str {
        match self {
            Self::Paper => "wss://paper-api.alpaca.markets/stream",
            Self::Live => "wss://api.alpaca.markets/stream",
        }
    }
}

/// One account's credentials and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountSettings {
    /// API credentials.
    pub credentials: Credentials,
    /// Paper or live.
    pub environment: Environment,
}

/// Runtime tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeSettings {
    /// Bound of the stream-to-orchestrator channel.
    pub event_channel_capacity: usize,
    /// Heartbeat ping interval.
    pub heartbeat_interval: Duration,
    /// Heartbeat pong timeout.
    pub heartbeat_timeout: Duration,
    /// REST request timeout.
    pub http_timeout: Duration,
    /// Prometheus listener port (0 = listener disabled).
    pub metrics_port: u16,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            event_channel_capacity: 256,
            heartbeat_interval: Duration::from_secs(20),
            heartbeat_timeout: Duration::from_secs(20),
            http_timeout: Duration::from_secs(30),
            metrics_port: 9090,
        }
    }
}

impl RuntimeSettings {
    /// Heartbeat configuration for the stream adapter.
    #[must_use]
    pub const fn heartbeat(&self) -> HeartbeatConfig {
        HeartbeatConfig::new(self.heartbeat_interval, self.heartbeat_timeout)
    }
}

/// Complete copier configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopierConfig {
    /// Account whose orders are observed.
    pub source: AccountSettings,
    /// Account on which orders are placed.
    pub destination: AccountSettings,
    /// Runtime tuning.
    pub runtime: RuntimeSettings,
}

impl CopierConfig {
    /// Create configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing or empty credential.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first missing or empty credential, or
    /// an invalid channel capacity.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let source = AccountSettings {
            credentials: credentials(&lookup, "SOURCE_API_KEY", "SOURCE_SECRET_KEY")?,
            environment: environment(&lookup, "SOURCE_ENV"),
        };
        let destination = AccountSettings {
            credentials: credentials(&lookup, "DEST_API_KEY", "DEST_SECRET_KEY")?,
            environment: environment(&lookup, "DEST_ENV"),
        };

        let defaults = RuntimeSettings::default();
        let event_channel_capacity = parse_or(
            &lookup,
            "COPIER_EVENT_CHANNEL_CAPACITY",
            defaults.event_channel_capacity,
        );
        if event_channel_capacity == 0 {
            return Err(must_be_positive("COPIER_EVENT_CHANNEL_CAPACITY"));
        }

        let runtime = RuntimeSettings {
            event_channel_capacity,
            heartbeat_interval: positive_secs_or(
                &lookup,
                "COPIER_HEARTBEAT_INTERVAL_SECS",
                defaults.heartbeat_interval,
            )?,
            heartbeat_timeout: positive_secs_or(
                &lookup,
                "COPIER_HEARTBEAT_TIMEOUT_SECS",
                defaults.heartbeat_timeout,
            )?,
            http_timeout: positive_secs_or(
                &lookup,
                "COPIER_HTTP_TIMEOUT_SECS",
                defaults.http_timeout,
            )?,
            metrics_port: parse_or(&lookup, "COPIER_METRICS_PORT", defaults.metrics_port),
        };

        Ok(Self {
            source,
            destination,
            runtime,
        })
    }

    /// Log the parsed configuration. Secrets are never logged.
    pub fn log_summary(&self) {
        tracing::info!(
            source_env = self.source.environment.as_str(),
            source_key = %self.source.credentials.key(),
            dest_env = self.destination.environment.as_str(),
            dest_key = %self.destination.credentials.key(),
            event_channel_capacity = self.runtime.event_channel_capacity,
            metrics_port = self.runtime.metrics_port,
            "Configuration loaded"
        );
        tracing::debug!(
            trade_updates_url = self.source.environment.trade_updates_url(),
            trading_api_url = self.destination.environment.trading_api_url(),
            heartbeat_interval_secs = self.runtime.heartbeat_interval.as_secs(),
            heartbeat_timeout_secs = self.runtime.heartbeat_timeout.as_secs(),
            http_timeout_secs = self.runtime.http_timeout.as_secs(),
            "Endpoints"
        );
    }
}

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable has an unusable value.
    #[error("environment variable {key} is invalid: {reason}")]
    InvalidValue {
        /// Variable name
        key: String,
        /// What is wrong with it
        reason: String,
    },
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))?;
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyValue(key.to_string()));
    }
    Ok(value)
}

fn credentials<F>(lookup: &F, key_var: &str, secret_var: &str) -> Result<Credentials, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let key = required(lookup, key_var)?;
    let secret = required(lookup, secret_var)?;
    Credentials::new(key, secret).map_err(|e| ConfigError::InvalidValue {
        key: key_var.to_string(),
        reason: e.to_string(),
    })
}

fn environment<F>(lookup: &F, key: &str) -> Environment
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|s| Environment::from_str_case_insensitive(&s))
        .unwrap_or_default()
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Whole seconds, defaulting when unset or malformed. Zero is rejected.
fn positive_secs_or<F>(lookup: &F, key: &str, default: Duration) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = lookup(key)
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(default, Duration::from_secs);
    if secs.is_zero() {
        return Err(must_be_positive(key));
    }
    Ok(secs)
}

fn must_be_positive(key: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        reason: "must be greater than zero".to_string(),
    }
}

use std::str::FromStr;

use campus_events::EmailConfig;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::Invalid {
                var: "LOG_FORMAT",
                value: s.to_string(),
                expected: "text or json",
            }),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} must be {expected}, got '{value}'")]
    Invalid {
        var: &'static str,
        value: String,
        expected: &'static str,
    },
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins, parsed from the comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    pub request_timeout_secs: u64,
    /// How long to wait for background tasks after the server stops.
    pub shutdown_timeout_secs: u64,
    /// Polling interval of the digest scheduler.
    pub digest_check_interval_secs: u64,
    /// Interval of the expired-notification cleanup job.
    pub notification_retention_interval_secs: u64,
    pub log_format: LogFormat,
    pub email: EmailConfig,
}

fn parse_var<T: FromStr>(
    var: &'static str,
    default: &str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    let value = std::env::var(var).unwrap_or_else(|_| default.to_string());
    value
        .parse()
        .map_err(|_| ConfigError::Invalid {
            var,
            value,
            expected,
        })
}

/// Interval settings must be at least one second.
fn positive_secs(var: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .ok()
        .filter(|secs| *secs > 0)
        .ok_or_else(|| ConfigError::Invalid {
            var,
            value: value.to_string(),
            expected: "a positive integer",
        })
}

fn positive_secs_var(var: &'static str, default: &str) -> Result<u64, ConfigError> {
    let value = std::env::var(var).unwrap_or_else(|_| default.to_string());
    positive_secs(var, &value)
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                                | Default                 |
    /// |----------------------------------------|-------------------------|
    /// | `HOST`                                 | `0.0.0.0`               |
    /// | `PORT`                                 | `3000`                  |
    /// | `CORS_ORIGINS`                         | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`                 | `30`                    |
    /// | `SHUTDOWN_TIMEOUT_SECS`                | `30`                    |
    /// | `DIGEST_CHECK_INTERVAL_SECS`           | `300`                   |
    /// | `NOTIFICATION_RETENTION_INTERVAL_SECS` | `3600`                  |
    /// | `LOG_FORMAT`                           | `text`                  |
    ///
    /// Email settings are read by [`EmailConfig::from_env`].
    pub fn from_env() -> Result<Self, ConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port: parse_var("PORT", "3000", "a valid u16")?,
            cors_origins,
            request_timeout_secs: parse_var("REQUEST_TIMEOUT_SECS", "30", "a valid u64")?,
            shutdown_timeout_secs: parse_var("SHUTDOWN_TIMEOUT_SECS", "30", "a valid u64")?,
            digest_check_interval_secs: positive_secs_var("DIGEST_CHECK_INTERVAL_SECS", "300")?,
            notification_retention_interval_secs: positive_secs_var(
                "NOTIFICATION_RETENTION_INTERVAL_SECS",
                "3600",
            )?,
            log_format: parse_var("LOG_FORMAT", "text", "text or json")?,
            email: EmailConfig::from_env(),
        })
    }
}

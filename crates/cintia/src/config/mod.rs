use std::env;
use std::fmt;
use std::time::Duration;

const DEFAULT_OPERATION_TIMEOUT_MS: u64 = 5_000;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub lifecycle: LifecycleConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let operation_timeout = match env::var("CINTIA_OPERATION_TIMEOUT_MS") {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => Some(Duration::from_millis(DEFAULT_OPERATION_TIMEOUT_MS)),
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            lifecycle: LifecycleConfig { operation_timeout },
        })
    }
}

/// `0` turns the deadline off.
fn parse_timeout(raw: &str) -> Result<Option<Duration>, ConfigError> {
    let millis = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidTimeout {
            value: raw.to_string(),
        })?;
    Ok((millis > 0).then_some(Duration::from_millis(millis)))
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Limits applied to every lifecycle operation.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    pub operation_timeout: Option<Duration>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            operation_timeout: Some(Duration::from_millis(DEFAULT_OPERATION_TIMEOUT_MS)),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidTimeout { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidTimeout { value } => write!(
                f,
                "CINTIA_OPERATION_TIMEOUT_MS must be a whole number of milliseconds (got '{value}')"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

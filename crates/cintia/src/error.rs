use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::applications::{ApplicationServiceError, ErrorKind};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Lifecycle(ApplicationServiceError),
}

impl AppError {
    /// Classification of lifecycle failures; startup failures count as infrastructure.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Lifecycle(err) => err.kind(),
            AppError::Config(_) | AppError::Telemetry(_) => ErrorKind::Infrastructure,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Lifecycle(err) => write!(f, "application lifecycle error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Lifecycle(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<ApplicationServiceError> for AppError {
    fn from(value: ApplicationServiceError) -> Self {
        Self::Lifecycle(value)
    }
}

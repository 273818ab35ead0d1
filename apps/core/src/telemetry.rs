//! Tracing subscriber setup.
//!
//! `RUST_LOG` selects the filter (default `info`), `LOG_FORMAT` the output:
//! `pretty` (default), `json`, or `bunyan`.

use std::env;
use std::str::FromStr;

use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use crate::error::AppError;

const SERVICE_NAME: &str = "soulbuddy-core";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Bunyan,
}

impl FromStr for LogFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "pretty" | "text" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "bunyan" => Ok(LogFormat::Bunyan),
            other => Err(AppError::Config(format!("Unknown LOG_FORMAT '{}'", other))),
        }
    }
}

impl LogFormat {
    pub fn from_env() -> Result<Self, AppError> {
        env::var("LOG_FORMAT")
            .map(|raw| raw.parse())
            .unwrap_or(Ok(LogFormat::Pretty))
    }
}

/// Installs the global subscriber. Also bridges `log` records (actix access
/// logs) into tracing.
pub fn init_tracing(format: LogFormat) -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let result = match format {
        LogFormat::Pretty => Registry::default()
            .with(filter)
            .with(fmt::layer().with_target(true))
            .try_init(),
        LogFormat::Json => Registry::default()
            .with(filter)
            .with(fmt::layer().json().with_current_span(true))
            .try_init(),
        LogFormat::Bunyan => Registry::default()
            .with(filter)
            .with(JsonStorageLayer)
            .with(BunyanFormattingLayer::new(SERVICE_NAME.to_string(), std::io::stdout))
            .try_init(),
    };

    result.map_err(|e| AppError::Internal(format!("Failed to install tracing subscriber: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("json".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!(" Bunyan ".parse::<LogFormat>().unwrap(), LogFormat::Bunyan);
        assert_eq!("".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_log_format_from_env() {
        temp_env::with_var("LOG_FORMAT", Some("json"), || {
            assert_eq!(LogFormat::from_env().unwrap(), LogFormat::Json);
        });
        temp_env::with_var_unset("LOG_FORMAT", || {
            assert_eq!(LogFormat::from_env().unwrap(), LogFormat::Pretty);
        });
    }
}

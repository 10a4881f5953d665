use crate::{
    Config,
    model::{AlertRecord, Coordinates, FallbackReason, ForecastBundle, WeatherSnapshot},
    provider::weatherapi::WeatherApiProvider,
};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::fmt::Debug;

pub mod weatherapi;

/// Failure talking to or decoding the upstream provider.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("weather API key is not configured")]
    NotConfigured,

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{endpoint} request failed with status {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("failed to parse {endpoint} response: {message}")]
    Malformed {
        endpoint: &'static str,
        message: String,
    },
}

impl ProviderError {
    pub fn fallback_reason(&self) -> FallbackReason {
        match self {
            ProviderError::NotConfigured => FallbackReason::NotConfigured,
            ProviderError::Transport { source, .. } => FallbackReason::Transport(source.to_string()),
            ProviderError::Status { status, .. } => FallbackReason::Status(status.as_u16()),
            ProviderError::Malformed { message, .. } => FallbackReason::Malformed(message.clone()),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Upstream weather source. Implementations normalize their own wire format.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Whether credentials look usable. Unconfigured providers are expected
    /// to fail every fetch with [`ProviderError::NotConfigured`].
    fn is_configured(&self) -> bool {
        true
    }

    async fn fetch_current(&self, coords: Coordinates) -> ProviderResult<WeatherSnapshot>;

    async fn fetch_forecast(&self, coords: Coordinates) -> ProviderResult<ForecastBundle>;

    async fn fetch_alerts(&self, coords: Coordinates) -> ProviderResult<Vec<AlertRecord>>;
}

/// Construct the configured provider.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let provider = WeatherApiProvider::from_config(config)?;
    Ok(Box::new(provider))
}

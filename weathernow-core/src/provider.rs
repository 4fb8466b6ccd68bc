use crate::{
    Config,
    model::{Coordinates, ForecastPoint, WeatherSnapshot},
    provider::weathernow::WeatherNowProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod weathernow;

/// Failure of a single weather API request.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Upstream reported no match (status {status})")]
    NotFound { status: u16 },
    #[error("Request timed out")]
    Timeout,
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid API base URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    /// Classify a transport-level failure, keeping timeouts distinct.
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() { ApiError::Timeout } else { ApiError::Network(err) }
    }
}

/// Read-only access to the weather API. No retries, no caching.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for a city name.
    async fn fetch_by_city(&self, city: &str) -> Result<WeatherSnapshot, ApiError>;

    /// Current conditions at a position; used by the startup geolocation path.
    async fn fetch_by_coordinates(&self, coords: Coordinates) -> Result<WeatherSnapshot, ApiError>;

    /// Forecast series for a city name. A non-success response yields an empty
    /// series; only transport and parse failures are errors.
    async fn fetch_forecast(&self, city: &str) -> Result<Vec<ForecastPoint>, ApiError>;
}

/// Construct the HTTP provider from config.
pub fn provider_from_config(config: &Config) -> Result<Box<dyn WeatherProvider>, ApiError> {
    let provider = WeatherNowProvider::new(&config.api_base, config.timeout())?;
    Ok(Box::new(provider))
}

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::model::{Coordinates, ForecastEnvelope, ForecastPoint, WeatherSnapshot};

use super::{ApiError, WeatherProvider};

/// HTTP client for the WeatherNow API (`/api/weather/...`).
#[derive(Debug, Clone)]
pub struct WeatherNowProvider {
    base: Url,
    http: Client,
}

impl WeatherNowProvider {
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base =
            Url::parse(api_base).map_err(|e| ApiError::InvalidUrl(format!("{api_base}: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(api_base.to_string()));
        }

        let http = Client::builder().timeout(timeout).build().map_err(ApiError::from_transport)?;

        Ok(Self { base, http })
    }

    /// Base URL extended with percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<(StatusCode, String), ApiError> {
        tracing::debug!(%url, "GET");

        let res = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(ApiError::from_transport)?;

        let status = res.status();
        let body = res.text().await.map_err(ApiError::from_transport)?;

        Ok((status, body))
    }

    async fn fetch_snapshot(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<WeatherSnapshot, ApiError> {
        let (status, body) = self.get(url, query).await?;

        if !status.is_success() {
            tracing::debug!(%status, body = %truncate_body(&body), "weather lookup failed");
            return Err(ApiError::NotFound {
                status: status.as_u16(),
            });
        }

        parse(&body)
    }
}

#[async_trait]
impl WeatherProvider for WeatherNowProvider {
    async fn fetch_by_city(&self, city: &str) -> Result<WeatherSnapshot, ApiError> {
        let url = self.endpoint(&["api", "weather", city])?;
        self.fetch_snapshot(url, &[]).await
    }

    async fn fetch_by_coordinates(&self, coords: Coordinates) -> Result<WeatherSnapshot, ApiError> {
        let url = self.endpoint(&["api", "weather", "coords"])?;
        let query = [("lat", coords.latitude.to_string()), ("lon", coords.longitude.to_string())];
        self.fetch_snapshot(url, &query).await
    }

    async fn fetch_forecast(&self, city: &str) -> Result<Vec<ForecastPoint>, ApiError> {
        let url = self.endpoint(&["api", "weather", "forecast", city])?;
        let (status, body) = self.get(url, &[]).await?;

        if !status.is_success() {
            tracing::debug!(%status, "forecast unavailable, using empty series");
            return Ok(Vec::new());
        }

        let envelope: ForecastEnvelope = parse(&body)?;
        Ok(envelope.list)
    }
}

fn parse<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

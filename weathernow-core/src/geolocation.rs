//! One-shot "where am I" lookup used on startup.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{fmt::Debug, time::Duration};

use crate::{Config, model::Coordinates};

#[derive(Debug, thiserror::Error)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    Denied,
    #[error("Location service unavailable")]
    Unavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

#[async_trait]
pub trait Geolocator: Send + Sync + Debug {
    /// Whether a position can be requested at all.
    fn is_available(&self) -> bool;

    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// No location capability.
#[derive(Debug, Clone, Default)]
pub struct NoGeolocation;

#[async_trait]
impl Geolocator for NoGeolocation {
    fn is_available(&self) -> bool {
        false
    }

    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::Unavailable)
    }
}

/// Position configured by the user.
#[derive(Debug, Clone)]
pub struct FixedLocation {
    coords: Coordinates,
}

impl FixedLocation {
    pub fn new(coords: Coordinates) -> Self {
        Self { coords }
    }
}

#[async_trait]
impl Geolocator for FixedLocation {
    fn is_available(&self) -> bool {
        true
    }

    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.coords)
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: Option<String>,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Approximate position from the public IP address.
#[derive(Debug, Clone)]
pub struct IpGeolocator {
    url: String,
    http: Client,
}

impl IpGeolocator {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, GeolocationError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GeolocationError::Other(e.to_string()))?;
        Ok(Self {
            url: url.into(),
            http,
        })
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    fn is_available(&self) -> bool {
        true
    }

    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        let response = self.http.get(&self.url).send().await.map_err(|e| {
            if e.is_timeout() {
                GeolocationError::Timeout
            } else {
                tracing::debug!("IP lookup request failed: {e}");
                GeolocationError::Unavailable
            }
        })?;

        if !response.status().is_success() {
            tracing::debug!("IP lookup returned status {}", response.status());
            return Err(GeolocationError::Unavailable);
        }

        let body: IpLookupResponse =
            response.json().await.map_err(|e| GeolocationError::Other(e.to_string()))?;

        if body.status.as_deref().is_some_and(|s| s != "success") {
            tracing::debug!("IP lookup refused: {:?}", body.message);
            return Err(GeolocationError::Unavailable);
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => Ok(Coordinates::new(lat, lon)),
            _ => Err(GeolocationError::Other("IP lookup response has no coordinates".into())),
        }
    }
}

/// Pick the startup geolocator: fixed position, then IP lookup, else none.
pub fn geolocator_from_config(config: &Config) -> Box<dyn Geolocator> {
    if let Some(coords) = config.location.fixed() {
        return Box::new(FixedLocation::new(coords));
    }

    if config.location.ip_lookup {
        match IpGeolocator::new(config.location.ip_lookup_url.clone(), config.timeout()) {
            Ok(geo) => return Box::new(geo),
            Err(e) => tracing::warn!("IP geolocation disabled: {e}"),
        }
    }

    Box::new(NoGeolocation)
}

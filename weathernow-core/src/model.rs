use serde::{Deserialize, Serialize};

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Current conditions for one location at one instant.
///
/// Field names follow the upstream JSON payload. Every numeric field is optional
/// so a partial payload deserializes instead of failing; consumers decide how to
/// treat an absent value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub feels_like: Option<f64>,
    #[serde(default)]
    pub temp_min: Option<f64>,
    #[serde(default)]
    pub temp_max: Option<f64>,
    #[serde(default)]
    pub humidity: Option<u8>,
    #[serde(default)]
    pub pressure: Option<u32>,
    #[serde(default)]
    pub wind_speed: Option<f64>,
    #[serde(default)]
    pub wind_deg: Option<u16>,
    #[serde(default)]
    pub cloudiness: Option<u8>,
    #[serde(default, rename = "rain1h")]
    pub rain_1h: Option<f64>,
    #[serde(default, rename = "rain3h")]
    pub rain_3h: Option<f64>,
    #[serde(default, rename = "snow1h")]
    pub snow_1h: Option<f64>,
    #[serde(default, rename = "snow3h")]
    pub snow_3h: Option<f64>,
    #[serde(default)]
    pub sunrise: Option<i64>,
    #[serde(default)]
    pub sunset: Option<i64>,
}

/// One entry of the multi-day forecast series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastPoint {
    pub dt: i64,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub humidity: u8,
    #[serde(default)]
    pub wind_speed: f64,
    #[serde(default)]
    pub cloudiness: u8,
    #[serde(default, rename = "rain3h")]
    pub rain_3h: Option<f64>,
    #[serde(default)]
    pub icon: Option<String>,
}

/// Envelope of the forecast endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ForecastEnvelope {
    #[serde(default)]
    pub list: Vec<ForecastPoint>,
}

/// URL of the condition icon image at the given pixel scale (`2` or `4` in practice).
pub fn icon_url(icon: &str, scale: u8) -> String {
    format!("https://openweathermap.org/img/wn/{icon}@{scale}x.png")
}

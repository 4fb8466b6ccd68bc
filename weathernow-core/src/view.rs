//! Pure projections of session state into what the dashboard draws.

use chrono::TimeZone;
use serde::Serialize;
use std::fmt::Display;

use crate::model::{ForecastPoint, WeatherSnapshot, icon_url};

pub mod cards;
pub mod series;
pub mod theme;

pub use cards::{MetricCard, MetricKind, metric_cards};
pub use series::{
    ForecastSeries, HOURLY_STRIP_LEN, HourlyEntry, PrecipitationBucket, forecast_series,
    hourly_strip, precipitation_series,
};
pub use theme::{Animation, THEME_RULES, Theme, ThemeRule, theme_for};

/// Main temperature block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub city: String,
    pub description: String,
    /// Rounded, e.g. `"18°C"`; absent when upstream sent no temperature.
    pub temperature: Option<String>,
    pub icon_url: Option<String>,
}

impl Headline {
    pub fn from_snapshot(snapshot: &WeatherSnapshot) -> Self {
        Self {
            city: snapshot.city.clone(),
            description: snapshot.description.clone(),
            temperature: snapshot.temperature.map(|t| format!("{t:.0}°C")),
            icon_url: snapshot.icon.as_deref().map(|icon| icon_url(icon, 4)),
        }
    }
}

/// Everything the presentation layer reads, recomputed on every render.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub theme: Theme,
    pub animation: Option<Animation>,
    pub headline: Option<Headline>,
    pub cards: Vec<MetricCard>,
    /// Present whenever a snapshot is.
    pub precipitation: Option<[PrecipitationBucket; 4]>,
    pub forecast: ForecastSeries,
    pub hourly: Vec<HourlyEntry>,
}

pub fn build_dashboard<Tz>(
    snapshot: Option<&WeatherSnapshot>,
    forecast: &[ForecastPoint],
    tz: &Tz,
) -> DashboardView
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let theme = theme_for(snapshot);
    DashboardView {
        theme,
        animation: theme.animation(),
        headline: snapshot.map(Headline::from_snapshot),
        cards: snapshot.map(|s| metric_cards(s, tz)).unwrap_or_default(),
        precipitation: snapshot.map(precipitation_series),
        forecast: forecast_series(forecast, tz),
        hourly: hourly_strip(forecast, tz, HOURLY_STRIP_LEN),
    }
}

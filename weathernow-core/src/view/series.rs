use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::fmt::Display;

use crate::model::{ForecastPoint, WeatherSnapshot};

pub const HOURLY_STRIP_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecipitationBucket {
    pub label: &'static str,
    pub value: f64,
}

/// Rain/snow accumulation for the bar chart. Always four buckets; absent values read as 0.
pub fn precipitation_series(snapshot: &WeatherSnapshot) -> [PrecipitationBucket; 4] {
    let bucket = |label: &'static str, value: Option<f64>| PrecipitationBucket {
        label,
        value: value.unwrap_or(0.0),
    };
    [
        bucket("Rain 1h", snapshot.rain_1h),
        bucket("Rain 3h", snapshot.rain_3h),
        bucket("Snow 1h", snapshot.snow_1h),
        bucket("Snow 3h", snapshot.snow_3h),
    ]
}

/// Parallel chart series over the forecast, in input order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ForecastSeries {
    /// Hour of day, e.g. `"15h"`.
    pub labels: Vec<String>,
    /// Day of the point, e.g. `"Tue 14"`.
    pub days: Vec<String>,
    pub temperature: Vec<f64>,
    pub humidity: Vec<u8>,
    pub wind: Vec<f64>,
    pub clouds: Vec<u8>,
    pub rain: Vec<f64>,
    pub icons: Vec<Option<String>>,
}

impl ForecastSeries {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

pub fn forecast_series<Tz>(points: &[ForecastPoint], tz: &Tz) -> ForecastSeries
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let mut series = ForecastSeries::default();
    for point in points {
        series.labels.push(format_at(point.dt, tz, "%Hh"));
        series.days.push(format_at(point.dt, tz, "%a %d"));
        series.temperature.push(point.temperature);
        series.humidity.push(point.humidity);
        series.wind.push(point.wind_speed);
        series.clouds.push(point.cloudiness);
        series.rain.push(point.rain_3h.unwrap_or(0.0));
        series.icons.push(point.icon.clone());
    }
    series
}

/// Compact "next hours" entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyEntry {
    pub label: String,
    pub temperature: i64,
    pub icon: Option<String>,
}

pub fn hourly_strip<Tz>(points: &[ForecastPoint], tz: &Tz, len: usize) -> Vec<HourlyEntry>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    points
        .iter()
        .take(len)
        .map(|p| HourlyEntry {
            label: format_at(p.dt, tz, "%Hh"),
            temperature: p.temperature.round() as i64,
            icon: p.icon.clone(),
        })
        .collect()
}

fn format_at<Tz>(ts: i64, tz: &Tz, fmt: &str) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match DateTime::from_timestamp(ts, 0) {
        Some(dt) => dt.with_timezone(tz).format(fmt).to_string(),
        None => "?".to_string(),
    }
}

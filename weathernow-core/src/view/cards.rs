use chrono::{DateTime, TimeZone};
use serde::Serialize;
use std::fmt::Display;

use crate::model::WeatherSnapshot;

/// Card slots in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Humidity,
    Wind,
    Cloudiness,
    Rain1h,
    Rain3h,
    Snow1h,
    Snow3h,
    Pressure,
    FeelsLike,
    MinMax,
    Sunrise,
    Sunset,
}

impl MetricKind {
    pub const ALL: [MetricKind; 12] = [
        MetricKind::Humidity,
        MetricKind::Wind,
        MetricKind::Cloudiness,
        MetricKind::Rain1h,
        MetricKind::Rain3h,
        MetricKind::Snow1h,
        MetricKind::Snow3h,
        MetricKind::Pressure,
        MetricKind::FeelsLike,
        MetricKind::MinMax,
        MetricKind::Sunrise,
        MetricKind::Sunset,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::Humidity => "Humidity",
            MetricKind::Wind => "Wind",
            MetricKind::Cloudiness => "Cloudiness",
            MetricKind::Rain1h => "Rain 1h",
            MetricKind::Rain3h => "Rain 3h",
            MetricKind::Snow1h => "Snow 1h",
            MetricKind::Snow3h => "Snow 3h",
            MetricKind::Pressure => "Pressure",
            MetricKind::FeelsLike => "Feels like",
            MetricKind::MinMax => "Min/Max",
            MetricKind::Sunrise => "Sunrise",
            MetricKind::Sunset => "Sunset",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricCard {
    pub kind: MetricKind,
    pub label: &'static str,
    pub value: String,
}

/// Summary cards for `snapshot`. Absent source values omit their card.
pub fn metric_cards<Tz>(snapshot: &WeatherSnapshot, tz: &Tz) -> Vec<MetricCard>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    MetricKind::ALL
        .iter()
        .filter_map(|&kind| {
            card_value(kind, snapshot, tz).map(|value| MetricCard {
                kind,
                label: kind.label(),
                value,
            })
        })
        .collect()
}

fn card_value<Tz>(kind: MetricKind, s: &WeatherSnapshot, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match kind {
        MetricKind::Humidity => s.humidity.map(|h| format!("{h}%")),
        MetricKind::Wind => s.wind_speed.map(|w| match s.wind_deg {
            Some(deg) => format!("{w} m/s {}", compass_point(deg)),
            None => format!("{w} m/s"),
        }),
        MetricKind::Cloudiness => s.cloudiness.map(|c| format!("{c}%")),
        MetricKind::Rain1h => s.rain_1h.map(millimeters),
        MetricKind::Rain3h => s.rain_3h.map(millimeters),
        MetricKind::Snow1h => s.snow_1h.map(millimeters),
        MetricKind::Snow3h => s.snow_3h.map(millimeters),
        MetricKind::Pressure => s.pressure.map(|p| format!("{p} hPa")),
        MetricKind::FeelsLike => s.feels_like.map(|t| format!("{t:.1}°C")),
        MetricKind::MinMax => match (s.temp_min, s.temp_max) {
            (Some(min), Some(max)) => Some(format!("{min:.1}° / {max:.1}°")),
            _ => None,
        },
        MetricKind::Sunrise => s.sunrise.and_then(|ts| clock_time(ts, tz)),
        MetricKind::Sunset => s.sunset.and_then(|ts| clock_time(ts, tz)),
    }
}

fn millimeters(v: f64) -> String {
    format!("{v} mm")
}

fn clock_time<Tz>(ts: i64, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    DateTime::from_timestamp(ts, 0).map(|dt| dt.with_timezone(tz).format("%H:%M:%S").to_string())
}

/// Eight-point compass name for a bearing in degrees.
pub fn compass_point(deg: u16) -> &'static str {
    const POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
    let idx = ((f64::from(deg % 360) / 45.0).round() as usize) % POINTS.len();
    POINTS[idx]
}

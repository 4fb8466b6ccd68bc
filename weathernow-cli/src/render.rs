//! Plain-text rendering of the dashboard.

use std::fmt::Write;

use weathernow_core::{DashboardView, SessionState, view::ForecastSeries};

/// Rows of the forecast table shown below the charts' data.
const FORECAST_ROWS: usize = 16;

pub fn render(state: &SessionState, view: &DashboardView) -> String {
    let mut out = String::new();

    if state.loading {
        let _ = writeln!(out, "Loading…");
        return out;
    }

    if let Some(error) = &state.error {
        let _ = writeln!(out, "{error}");
        return out;
    }

    let Some(headline) = &view.headline else {
        let _ = writeln!(out, "Search for a city to see its weather.");
        return out;
    };

    let _ = writeln!(out, "== {} [{}] ==", headline.city, view.theme);
    let _ = writeln!(
        out,
        "{}  {}",
        headline.temperature.as_deref().unwrap_or("--"),
        headline.description
    );

    if !view.hourly.is_empty() {
        let strip: Vec<String> =
            view.hourly.iter().map(|h| format!("{} {}°", h.label, h.temperature)).collect();
        let _ = writeln!(out, "{}", strip.join(" | "));
    }

    if !view.cards.is_empty() {
        let _ = writeln!(out);
        for card in &view.cards {
            let _ = writeln!(out, "  {:<11} {}", card.label, card.value);
        }
    }

    if let Some(buckets) = &view.precipitation {
        let _ = writeln!(out);
        let _ = writeln!(out, "Precipitation (mm)");
        for bucket in buckets {
            let _ = writeln!(
                out,
                "  {:<8} {:>5.1} {}",
                bucket.label,
                bucket.value,
                bar(bucket.value)
            );
        }
    }

    if !view.forecast.is_empty() {
        let _ = writeln!(out);
        render_forecast(&mut out, &view.forecast);
    }

    out
}

fn render_forecast(out: &mut String, series: &ForecastSeries) {
    let _ = writeln!(out, "Forecast");
    let _ = writeln!(
        out,
        "  {:<7} {:<4} {:>6} {:>4} {:>6} {:>4} {:>6}",
        "day", "hour", "°C", "hum", "wind", "cld", "rain"
    );
    for i in 0..series.len().min(FORECAST_ROWS) {
        let _ = writeln!(
            out,
            "  {:<7} {:<4} {:>6.1} {:>3}% {:>6.1} {:>3}% {:>6.1}",
            series.days[i],
            series.labels[i],
            series.temperature[i],
            series.humidity[i],
            series.wind[i],
            series.clouds[i],
            series.rain[i],
        );
    }
    if series.len() > FORECAST_ROWS {
        let _ = writeln!(out, "  … {} more", series.len() - FORECAST_ROWS);
    }
}

/// Two cells per millimeter, capped.
fn bar(mm: f64) -> String {
    let cells = (mm * 2.0).round().clamp(0.0, 40.0) as usize;
    "█".repeat(cells)
}

//! Session controller: owns the dashboard state and sequences geolocation,
//! city search, forecast retrieval and history.
//!
//! Every request is tied to a [`Ticket`]. Starting a new search or location
//! lookup bumps the session generation, so a response that arrives for an
//! older ticket is dropped instead of overwriting newer data. The async
//! drivers ([`SessionController::start`], [`SessionController::search`])
//! run one flow to completion; an external event loop that interleaves
//! requests uses the `begin_*` / `complete_*` steps directly.

use chrono::{Local, TimeZone};
use serde::Serialize;
use std::fmt::Display;

use crate::{
    geolocation::{GeolocationError, Geolocator},
    history::SearchHistory,
    model::{ForecastPoint, WeatherSnapshot},
    provider::{ApiError, WeatherProvider},
    view::{DashboardView, build_dashboard},
};

pub const NOT_FOUND_MESSAGE: &str = "City not found.";
pub const TIMEOUT_MESSAGE: &str = "The weather service took too long to respond.";
pub const LOCATION_FAILED_MESSAGE: &str = "Could not get the weather for your location.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Loading,
    Ready,
    Failed,
}

/// Read surface handed to the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionState {
    pub query: String,
    pub snapshot: Option<WeatherSnapshot>,
    pub forecast: Vec<ForecastPoint>,
    pub loading: bool,
    pub error: Option<String>,
}

impl SessionState {
    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.snapshot.is_some() {
            Phase::Ready
        } else if self.error.is_some() {
            Phase::Failed
        } else {
            Phase::Idle
        }
    }

    fn clear_results(&mut self) {
        self.snapshot = None;
        self.forecast.clear();
        self.error = None;
    }
}

/// Identifies one in-flight search or location lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
    query: String,
}

impl Ticket {
    /// City searched for; empty for a location lookup.
    pub fn query(&self) -> &str {
        &self.query
    }
}

/// User-facing text for a failed weather lookup.
pub fn failure_message(err: &ApiError) -> &'static str {
    match err {
        ApiError::Timeout => TIMEOUT_MESSAGE,
        _ => NOT_FOUND_MESSAGE,
    }
}

#[derive(Debug)]
pub struct SessionController {
    provider: Box<dyn WeatherProvider>,
    geolocator: Box<dyn Geolocator>,
    history: SearchHistory,
    state: SessionState,
    generation: u64,
}

impl SessionController {
    pub fn new(
        provider: Box<dyn WeatherProvider>,
        geolocator: Box<dyn Geolocator>,
        history: SearchHistory,
    ) -> Self {
        Self {
            provider,
            geolocator,
            history,
            state: SessionState::default(),
            generation: 0,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    /// Edit the query text without searching.
    pub fn set_query(&mut self, text: impl Into<String>) {
        self.state.query = text.into();
    }

    /// Past searches, most recent first.
    pub fn history(&mut self) -> Vec<String> {
        self.history.list()
    }

    pub fn view_in<Tz>(&self, tz: &Tz) -> DashboardView
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        build_dashboard(self.state.snapshot.as_ref(), &self.state.forecast, tz)
    }

    /// Derived view in the local time zone.
    pub fn view(&self) -> DashboardView {
        self.view_in(&Local)
    }

    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.generation == self.generation
    }

    fn next_ticket(&mut self, query: String) -> Ticket {
        self.generation += 1;
        Ticket {
            generation: self.generation,
            query,
        }
    }

    // ---- startup location flow ----

    /// Enter `Loading` for the startup lookup. `None` when no location capability exists.
    pub fn begin_geolocation(&mut self) -> Option<Ticket> {
        if !self.geolocator.is_available() {
            tracing::debug!("no geolocation capability, staying idle");
            return None;
        }

        let ticket = self.next_ticket(String::new());
        self.state.loading = true;
        Some(ticket)
    }

    /// The position could not be obtained. Silent: back to `Idle`, nothing shown.
    pub fn geolocation_failed(&mut self, ticket: &Ticket, err: &GeolocationError) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!("discarding stale geolocation failure: {err}");
            return false;
        }

        tracing::warn!("geolocation failed: {err}");
        self.state.loading = false;
        true
    }

    /// Apply the weather fetched for the current position.
    pub fn complete_geolocation(
        &mut self,
        ticket: &Ticket,
        result: Result<WeatherSnapshot, ApiError>,
    ) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!("discarding stale location weather");
            return false;
        }

        self.state.loading = false;
        match result {
            Ok(snapshot) => {
                self.state.query = snapshot.city.clone();
                self.state.snapshot = Some(snapshot);
            }
            Err(e) => {
                tracing::warn!("weather for current position failed: {e}");
                self.state.error = Some(LOCATION_FAILED_MESSAGE.to_string());
            }
        }
        true
    }

    // ---- explicit search flow ----

    /// Enter `Loading` for `query` (or the current query text), clearing any
    /// previous snapshot, forecast and error. Blank queries are a no-op.
    pub fn begin_search(&mut self, query: Option<&str>) -> Option<Ticket> {
        let query = query.unwrap_or(&self.state.query).trim().to_string();
        if query.is_empty() {
            return None;
        }

        tracing::debug!(%query, "search started");
        let ticket = self.next_ticket(query.clone());
        self.state.query = query;
        self.state.clear_results();
        self.state.loading = true;
        Some(ticket)
    }

    /// Apply the city weather result. On success the query is added to history.
    pub fn complete_weather(
        &mut self,
        ticket: &Ticket,
        result: Result<WeatherSnapshot, ApiError>,
    ) -> bool {
        if !self.is_current(ticket) {
            tracing::debug!(query = %ticket.query, "discarding stale weather response");
            return false;
        }

        self.state.loading = false;
        match result {
            Ok(snapshot) => {
                self.state.snapshot = Some(snapshot);
                self.history.record(&ticket.query);
            }
            Err(e) => {
                tracing::warn!(query = %ticket.query, "weather lookup failed: {e}");
                self.state.error = Some(failure_message(&e).to_string());
            }
        }
        true
    }

    /// Apply the forecast. Failures leave the forecast empty and never fail the session.
    pub fn complete_forecast(
        &mut self,
        ticket: &Ticket,
        result: Result<Vec<ForecastPoint>, ApiError>,
    ) -> bool {
        if !self.is_current(ticket) || self.state.snapshot.is_none() {
            tracing::debug!(query = %ticket.query, "discarding stale forecast response");
            return false;
        }

        match result {
            Ok(points) => self.state.forecast = points,
            Err(e) => tracing::warn!(query = %ticket.query, "forecast unavailable: {e}"),
        }
        true
    }

    // ---- drivers ----

    /// Startup: look up the current position and load its weather. No forecast.
    pub async fn start(&mut self) -> Phase {
        let Some(ticket) = self.begin_geolocation() else {
            return self.phase();
        };

        match self.geolocator.current_position().await {
            Ok(coords) => {
                let result = self.provider.fetch_by_coordinates(coords).await;
                self.complete_geolocation(&ticket, result);
            }
            Err(e) => {
                self.geolocation_failed(&ticket, &e);
            }
        }
        self.phase()
    }

    /// Search for the current query text.
    pub async fn search(&mut self) -> Phase {
        self.run_search(None).await
    }

    /// Search for `city`, e.g. when a history entry is picked.
    pub async fn search_for(&mut self, city: &str) -> Phase {
        self.run_search(Some(city)).await
    }

    async fn run_search(&mut self, query: Option<&str>) -> Phase {
        let Some(ticket) = self.begin_search(query) else {
            return self.phase();
        };

        let weather = self.provider.fetch_by_city(ticket.query()).await;
        let found = weather.is_ok();
        self.complete_weather(&ticket, weather);

        if found {
            let forecast = self.provider.fetch_forecast(ticket.query()).await;
            self.complete_forecast(&ticket, forecast);
        }
        self.phase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        geolocation::NoGeolocation,
        history::MAX_ENTRIES,
        model::Coordinates,
        view::Theme,
    };
    use async_trait::async_trait;
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    #[derive(Debug, Default)]
    struct FakeProvider {
        cities: HashMap<String, WeatherSnapshot>,
        /// Missing entry means the forecast request fails.
        forecasts: HashMap<String, Vec<ForecastPoint>>,
        at_position: Option<WeatherSnapshot>,
        timeouts: bool,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl FakeProvider {
        fn with_city(mut self, snapshot: WeatherSnapshot) -> Self {
            self.cities.insert(snapshot.city.clone(), snapshot);
            self
        }

        fn with_forecast(mut self, city: &str, points: Vec<ForecastPoint>) -> Self {
            self.forecasts.insert(city.to_string(), points);
            self
        }

        fn log(&self, call: String) {
            self.calls.lock().expect("lock").push(call);
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        async fn fetch_by_city(&self, city: &str) -> Result<WeatherSnapshot, ApiError> {
            self.log(format!("city:{city}"));
            if self.timeouts {
                return Err(ApiError::Timeout);
            }
            self.cities.get(city).cloned().ok_or(ApiError::NotFound { status: 404 })
        }

        async fn fetch_by_coordinates(
            &self,
            coords: Coordinates,
        ) -> Result<WeatherSnapshot, ApiError> {
            self.log(format!("coords:{},{}", coords.latitude, coords.longitude));
            self.at_position.clone().ok_or(ApiError::NotFound { status: 500 })
        }

        async fn fetch_forecast(&self, city: &str) -> Result<Vec<ForecastPoint>, ApiError> {
            self.log(format!("forecast:{city}"));
            self.forecasts
                .get(city)
                .cloned()
                .ok_or_else(|| ApiError::Parse("connection reset".into()))
        }
    }

    #[derive(Debug)]
    enum FakeGeolocator {
        At(Coordinates),
        Denied,
    }

    #[async_trait]
    impl Geolocator for FakeGeolocator {
        fn is_available(&self) -> bool {
            true
        }

        async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
            match self {
                FakeGeolocator::At(coords) => Ok(*coords),
                FakeGeolocator::Denied => Err(GeolocationError::Denied),
            }
        }
    }

    fn snapshot(city: &str, description: &str, temperature: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            city: city.into(),
            description: description.into(),
            temperature: Some(temperature),
            ..WeatherSnapshot::default()
        }
    }

    fn forecast_point(dt: i64) -> ForecastPoint {
        ForecastPoint {
            dt,
            temperature: 15.0,
            ..ForecastPoint::default()
        }
    }

    fn controller(provider: FakeProvider) -> SessionController {
        SessionController::new(
            Box::new(provider),
            Box::new(NoGeolocation),
            SearchHistory::in_memory(),
        )
    }

    fn controller_with_geo(provider: FakeProvider, geo: FakeGeolocator) -> SessionController {
        SessionController::new(Box::new(provider), Box::new(geo), SearchHistory::in_memory())
    }

    #[test]
    fn initial_state_is_idle() {
        let session = controller(FakeProvider::default());
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.view_in(&chrono::Utc).theme, Theme::DefaultBlue);
    }

    #[tokio::test]
    async fn search_success_with_failed_forecast_is_ready() {
        let provider = FakeProvider::default().with_city(snapshot("Paris", "light rain", 18.4));
        let mut session = controller(provider);

        session.set_query("Paris");
        assert_eq!(session.search().await, Phase::Ready);

        let state = session.state();
        assert_eq!(state.snapshot.as_ref().map(|s| s.city.as_str()), Some("Paris"));
        assert!(state.forecast.is_empty());
        assert!(state.error.is_none());
        assert!(!state.loading);
        assert_eq!(session.history()[0], "Paris");
        assert_eq!(session.view_in(&chrono::Utc).theme, Theme::StormDark);
    }

    #[tokio::test]
    async fn search_success_applies_forecast() {
        let provider = FakeProvider::default()
            .with_city(snapshot("Lisbon", "clear sky", 24.0))
            .with_forecast("Lisbon", vec![forecast_point(100), forecast_point(200)]);
        let mut session = controller(provider);

        assert_eq!(session.search_for("Lisbon").await, Phase::Ready);
        assert_eq!(session.state().forecast.len(), 2);
        assert_eq!(session.state().query, "Lisbon");
    }

    #[tokio::test]
    async fn not_found_fails_without_touching_history() {
        let provider = FakeProvider::default().with_city(snapshot("Paris", "clear sky", 20.0));
        let mut session = controller(provider);
        session.search_for("Paris").await;

        assert_eq!(session.search_for("Xyzzy123").await, Phase::Failed);

        let state = session.state();
        assert_eq!(state.error.as_deref(), Some(NOT_FOUND_MESSAGE));
        assert!(state.snapshot.is_none());
        assert!(state.forecast.is_empty());
        assert_eq!(session.history(), vec!["Paris"]);
    }

    #[tokio::test]
    async fn failed_lookup_does_not_request_forecast() {
        let provider = FakeProvider::default();
        let calls = provider.calls.clone();
        let mut session = controller(provider);

        session.search_for("Nowhere").await;
        assert_eq!(*calls.lock().expect("lock"), vec!["city:Nowhere"]);
    }

    #[tokio::test]
    async fn timeout_has_its_own_message() {
        let provider = FakeProvider {
            timeouts: true,
            ..FakeProvider::default()
        };
        let mut session = controller(provider);

        assert_eq!(session.search_for("Paris").await, Phase::Failed);
        assert_eq!(session.state().error.as_deref(), Some(TIMEOUT_MESSAGE));
    }

    #[tokio::test]
    async fn blank_query_is_a_no_op() {
        let provider = FakeProvider::default();
        let calls = provider.calls.clone();
        let mut session = controller(provider);

        session.set_query("   ");
        assert_eq!(session.search().await, Phase::Idle);
        assert!(calls.lock().expect("lock").is_empty());
        assert_eq!(session.state().query, "   ");
    }

    #[tokio::test]
    async fn query_is_trimmed_before_lookup_and_history() {
        let provider = FakeProvider::default().with_city(snapshot("Paris", "clear sky", 20.0));
        let mut session = controller(provider);

        session.set_query("  Paris ");
        assert_eq!(session.search().await, Phase::Ready);
        assert_eq!(session.history(), vec!["Paris"]);
    }

    #[tokio::test]
    async fn new_search_clears_previous_result_first() {
        let provider = FakeProvider::default()
            .with_city(snapshot("Paris", "clear sky", 20.0))
            .with_forecast("Paris", vec![forecast_point(1)]);
        let mut session = controller(provider);
        session.search_for("Paris").await;
        assert_eq!(session.phase(), Phase::Ready);

        let ticket = session.begin_search(Some("Oslo")).expect("ticket");
        let state = session.state();
        assert_eq!(session.phase(), Phase::Loading);
        assert!(state.snapshot.is_none());
        assert!(state.forecast.is_empty());
        assert!(state.error.is_none());
        assert_eq!(ticket.query(), "Oslo");
    }

    #[tokio::test]
    async fn search_after_failure_clears_error() {
        let mut session = controller(FakeProvider::default());
        session.search_for("Xyzzy123").await;
        assert_eq!(session.phase(), Phase::Failed);

        session.begin_search(Some("Paris")).expect("ticket");
        assert!(session.state().error.is_none());
        assert_eq!(session.phase(), Phase::Loading);
    }

    #[test]
    fn stale_forecast_is_discarded() {
        let mut session = controller(FakeProvider::default());

        let paris = session.begin_search(Some("Paris")).expect("ticket");
        assert!(session.complete_weather(&paris, Ok(snapshot("Paris", "rain", 12.0))));

        let oslo = session.begin_search(Some("Oslo")).expect("ticket");
        assert!(!session.complete_forecast(&paris, Ok(vec![forecast_point(1)])));
        assert!(session.state().forecast.is_empty());

        assert!(session.complete_weather(&oslo, Ok(snapshot("Oslo", "snow", -2.0))));
        assert!(session.complete_forecast(&oslo, Ok(vec![forecast_point(5), forecast_point(6)])));
        assert_eq!(session.state().forecast.len(), 2);
        assert_eq!(session.state().snapshot.as_ref().map(|s| s.city.as_str()), Some("Oslo"));
    }

    #[test]
    fn stale_weather_is_discarded() {
        let mut session = controller(FakeProvider::default());

        let first = session.begin_search(Some("Paris")).expect("ticket");
        let _second = session.begin_search(Some("Oslo")).expect("ticket");

        assert!(!session.complete_weather(&first, Ok(snapshot("Paris", "rain", 12.0))));
        assert_eq!(session.phase(), Phase::Loading);
        assert!(session.history().is_empty());
    }

    #[test]
    fn forecast_failure_never_reverts_to_failed() {
        let mut session = controller(FakeProvider::default());

        let ticket = session.begin_search(Some("Paris")).expect("ticket");
        session.complete_weather(&ticket, Ok(snapshot("Paris", "rain", 12.0)));
        session.complete_forecast(&ticket, Err(ApiError::Timeout));

        assert_eq!(session.phase(), Phase::Ready);
        assert!(session.state().error.is_none());
    }

    #[tokio::test]
    async fn repeated_searches_keep_history_bounded_and_distinct() {
        let mut provider = FakeProvider::default();
        for i in 0..12 {
            provider = provider.with_city(snapshot(&format!("City {i}"), "clear", 10.0));
        }
        let mut session = controller(provider);

        for i in 0..12 {
            session.search_for(&format!("City {i}")).await;
        }
        session.search_for("City 5").await;

        let history = session.history();
        assert_eq!(history.len(), MAX_ENTRIES);
        assert_eq!(history[0], "City 5");
        assert_eq!(history.iter().filter(|c| *c == "City 5").count(), 1);
    }

    #[tokio::test]
    async fn startup_without_capability_stays_idle() {
        let provider = FakeProvider::default();
        let calls = provider.calls.clone();
        let mut session = controller(provider);

        assert_eq!(session.start().await, Phase::Idle);
        assert!(calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn startup_geolocation_success_sets_snapshot_and_query() {
        let provider = FakeProvider {
            at_position: Some(snapshot("Recife", "scattered clouds", 29.0)),
            ..FakeProvider::default()
        };
        let calls = provider.calls.clone();
        let mut session =
            controller_with_geo(provider, FakeGeolocator::At(Coordinates::new(-8.05, -34.9)));

        assert_eq!(session.start().await, Phase::Ready);
        assert_eq!(session.state().query, "Recife");
        assert!(session.state().forecast.is_empty());
        assert!(session.history().is_empty());
        assert_eq!(*calls.lock().expect("lock"), vec!["coords:-8.05,-34.9"]);
    }

    #[tokio::test]
    async fn startup_geolocation_denied_is_silent() {
        let mut session = controller_with_geo(FakeProvider::default(), FakeGeolocator::Denied);

        assert_eq!(session.start().await, Phase::Idle);
        let state = session.state();
        assert!(state.error.is_none());
        assert!(state.snapshot.is_none());
        assert!(!state.loading);
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn startup_location_weather_failure_is_reported() {
        let mut session = controller_with_geo(
            FakeProvider::default(),
            FakeGeolocator::At(Coordinates::new(0.0, 0.0)),
        );

        assert_eq!(session.start().await, Phase::Failed);
        assert_eq!(session.state().error.as_deref(), Some(LOCATION_FAILED_MESSAGE));
    }

    /// Collects formatted log output for the duration of a test.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().expect("lock").extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().expect("lock")).into_owned()
        }
    }

    fn capture_warnings<F: FnOnce()>(f: F) -> String {
        let buffer = LogBuffer::default();
        let writer = buffer.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        buffer.contents()
    }

    #[test]
    fn stale_geolocation_failure_is_not_warned() {
        let mut session = controller_with_geo(FakeProvider::default(), FakeGeolocator::Denied);

        let geo = session.begin_geolocation().expect("ticket");
        let _search = session.begin_search(Some("Paris")).expect("ticket");

        let logs = capture_warnings(|| {
            assert!(!session.geolocation_failed(&geo, &GeolocationError::Denied));
        });
        assert!(!logs.contains("geolocation failed"), "unexpected warning: {logs}");
        assert_eq!(session.phase(), Phase::Loading);
    }

    #[test]
    fn current_geolocation_failure_is_warned() {
        let mut session = controller_with_geo(FakeProvider::default(), FakeGeolocator::Denied);
        let geo = session.begin_geolocation().expect("ticket");

        let logs = capture_warnings(|| {
            assert!(session.geolocation_failed(&geo, &GeolocationError::Denied));
        });
        assert!(logs.contains("geolocation failed"));
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn search_during_geolocation_wins() {
        let mut session = controller_with_geo(
            FakeProvider::default(),
            FakeGeolocator::At(Coordinates::new(0.0, 0.0)),
        );

        let geo = session.begin_geolocation().expect("ticket");
        let search = session.begin_search(Some("Paris")).expect("ticket");

        assert!(!session.complete_geolocation(&geo, Ok(snapshot("Null Island", "clear", 25.0))));
        assert!(!session.geolocation_failed(&geo, &GeolocationError::Timeout));
        assert_eq!(session.phase(), Phase::Loading);

        session.complete_weather(&search, Ok(snapshot("Paris", "clear", 20.0)));
        assert_eq!(session.state().query, "Paris");
    }
}

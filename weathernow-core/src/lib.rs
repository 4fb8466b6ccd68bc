//! Core library for the `weathernow` dashboard.
//!
//! This crate defines:
//! - Configuration handling
//! - The weather API client and its domain models
//! - Durable search history over a pluggable key-value store
//! - Startup geolocation
//! - Derived dashboard views (theme, metric cards, chart series)
//! - The session controller tying them together
//!
//! It is used by `weathernow-cli`, but has no terminal or rendering dependencies.

pub mod config;
pub mod geolocation;
pub mod history;
pub mod model;
pub mod provider;
pub mod session;
pub mod storage;
pub mod view;

pub use config::Config;
pub use geolocation::{Geolocator, geolocator_from_config};
pub use history::SearchHistory;
pub use model::{Coordinates, ForecastPoint, WeatherSnapshot};
pub use provider::{ApiError, WeatherProvider, provider_from_config};
pub use session::{Phase, SessionController, SessionState};
pub use storage::{FileStore, KeyValueStore, MemoryStore};
pub use view::DashboardView;

/// Build a session from config: HTTP provider, configured geolocator, file-backed history.
pub fn session_from_config(config: &Config) -> anyhow::Result<SessionController> {
    let provider = provider_from_config(config)?;
    let geolocator = geolocator_from_config(config);
    let history = SearchHistory::new(Box::new(FileStore::new(config.storage_file_path()?)));

    Ok(SessionController::new(provider, geolocator, history))
}

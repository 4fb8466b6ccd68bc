use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::model::Coordinates;

pub const DEFAULT_API_BASE: &str = "https://weathernow-api-crhf.onrender.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_IP_LOOKUP_URL: &str = "http://ip-api.com/json";

/// How the startup position is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Fixed position; both coordinates must be set to be used.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Resolve the position from the public IP address when no fixed position is set.
    #[serde(default)]
    pub ip_lookup: bool,

    #[serde(default = "default_ip_lookup_url")]
    pub ip_lookup_url: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            ip_lookup: false,
            ip_lookup_url: default_ip_lookup_url(),
        }
    }
}

impl LocationConfig {
    pub fn fixed(&self) -> Option<Coordinates> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// api_base = "https://weathernow-api-crhf.onrender.com"
/// timeout_secs = 10
///
/// [location]
/// latitude = 48.85
/// longitude = 2.35
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Overrides the platform data directory for the history file.
    #[serde(default)]
    pub history_file: Option<PathBuf>,

    #[serde(default)]
    pub location: LocationConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
            history_file: None,
            location: LocationConfig::default(),
        }
    }
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_ip_lookup_url() -> String {
    DEFAULT_IP_LOOKUP_URL.to_string()
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn set_fixed_location(&mut self, latitude: f64, longitude: f64) {
        self.location.latitude = Some(latitude);
        self.location.longitude = Some(longitude);
    }

    pub fn clear_location(&mut self) {
        self.location.latitude = None;
        self.location.longitude = None;
        self.location.ip_lookup = false;
    }

    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, return defaults.
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(project_dirs()?.config_dir().join("config.toml"))
    }

    /// Path to the durable key-value file holding the search history.
    pub fn storage_file_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.history_file {
            return Ok(path.clone());
        }
        Ok(project_dirs()?.data_dir().join("storage.json"))
    }
}

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("dev", "weathernow", "weathernow")
        .ok_or_else(|| anyhow!("Could not determine platform config directory"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_yields_defaults() {
        let cfg: Config = toml::from_str("").expect("empty config parses");
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.timeout(), Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        assert!(cfg.location.fixed().is_none());
    }

    #[test]
    fn partial_location_is_not_a_fixed_position() {
        let cfg: Config = toml::from_str("[location]\nlatitude = 48.85\n").expect("parses");
        assert!(cfg.location.fixed().is_none());
        assert_eq!(cfg.location.ip_lookup_url, DEFAULT_IP_LOOKUP_URL);
    }

    #[test]
    fn zero_timeout_is_clamped() {
        let cfg = Config {
            timeout_secs: 0,
            ..Config::default()
        };
        assert_eq!(cfg.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn fixed_location_roundtrips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_fixed_location(-23.55, -46.63);
        cfg.history_file = Some(dir.path().join("history.json"));
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded, cfg);
        assert_eq!(loaded.location.fixed(), Some(Coordinates::new(-23.55, -46.63)));
        assert_eq!(
            loaded.storage_file_path().expect("path"),
            dir.path().join("history.json")
        );
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from(&dir.path().join("absent.toml")).expect("load");
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn clear_location_disables_every_source() {
        let mut cfg = Config::default();
        cfg.set_fixed_location(1.0, 2.0);
        cfg.location.ip_lookup = true;

        cfg.clear_location();
        assert!(cfg.location.fixed().is_none());
        assert!(!cfg.location.ip_lookup);
    }
}

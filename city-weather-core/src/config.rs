use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{
    http::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT},
    provider::{DEFAULT_FORECAST_URL, DEFAULT_GEOCODING_URL, GeocodingClient, WeatherClient},
    service::WeatherService,
};

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// user_agent = "my-weather-app/0.1 you@example.com"
/// timeout_secs = 5
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sent as `User-Agent` to both services; should name the app and a contact.
    pub user_agent: String,

    /// Per-request timeout.
    pub timeout_secs: u64,

    /// Nominatim search endpoint.
    pub geocoding_url: String,

    /// Root of the MET Locationforecast API.
    pub forecast_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            geocoding_url: DEFAULT_GEOCODING_URL.to_string(),
            forecast_url: DEFAULT_FORECAST_URL.to_string(),
        }
    }
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            // First run: no config file, use defaults.
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
        let path = Self::config_file_path()?;
        self.save_to(&path)
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
        let dirs = ProjectDirs::from("dev", "city-weather", "city-weather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn geocoding_client(&self) -> GeocodingClient {
        GeocodingClient::new(self.user_agent.as_str())
            .with_base_url(self.geocoding_url.as_str())
            .with_timeout(self.timeout())
    }

    pub fn weather_client(&self) -> WeatherClient {
        WeatherClient::new(self.user_agent.as_str())
            .with_base_url(self.forecast_url.as_str())
            .with_timeout(self.timeout())
    }

    /// Both clients wired up from this config, sharing one connection pool.
    pub fn weather_service(&self) -> WeatherService {
        let http = Client::new();
        WeatherService::new(
            self.geocoding_client().with_http_client(http.clone()),
            self.weather_client().with_http_client(http),
        )
    }
}

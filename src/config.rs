//! Application-level configuration loading: sport categories, the city
//! geocoding table, map view settings and development sessions.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::dao::{identity::Identity, models::Coordinates};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "ARENA_BACK_CONFIG_PATH";
/// Environment variable carrying the map widget access token.
const MAP_TOKEN_ENV: &str = "MAPBOX_TOKEN";
const DEFAULT_MAP_STYLE: &str = "mapbox://styles/mapbox/dark-v11";
const DEFAULT_MAP_ZOOM: f64 = 11.0;
/// San Francisco, used when neither the game nor the caller provide a position.
const DEFAULT_CENTER: Coordinates = Coordinates {
    lat: 37.7749,
    lng: -122.4194,
};

/// Settings handed to the map widget.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    pub access_token: Option<String>,
    pub style: String,
    pub center: Coordinates,
    pub zoom: f64,
}

impl Default for MapSettings {
    fn default() -> Self {
        Self {
            access_token: None,
            style: DEFAULT_MAP_STYLE.into(),
            center: DEFAULT_CENTER,
            zoom: DEFAULT_MAP_ZOOM,
        }
    }
}

/// Pre-registered session accepted by the in-memory identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevUser {
    pub token: String,
    pub identity: Identity,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    sports: Vec<String>,
    cities: IndexMap<String, Coordinates>,
    map: MapSettings,
    dev_users: Vec<DevUser>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        let config = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let app_config: Self = raw.into();
                    info!(
                        path = %path.display(),
                        sports = app_config.sports.len(),
                        cities = app_config.cities.len(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        };

        config.with_map_token(env::var(MAP_TOKEN_ENV).ok().filter(|token| !token.is_empty()))
    }

    fn with_map_token(mut self, token: Option<String>) -> Self {
        if token.is_some() {
            self.map.access_token = token;
        }
        self
    }

    /// Sport categories offered on games and profiles.
    pub fn sports(&self) -> &[String] {
        &self.sports
    }

    /// Whether `sport` is one of the configured categories.
    pub fn is_known_sport(&self, sport: &str) -> bool {
        self.sports.iter().any(|known| known == sport)
    }

    /// Position of a location label, looked up in the city table.
    ///
    /// Matches the full label first, then its last comma-separated segment so
    /// that "USA, California, San Francisco" resolves like "San Francisco".
    pub fn city_coordinates(&self, location: &str) -> Option<Coordinates> {
        let trimmed = location.trim();
        self.cities.get(trimmed).copied().or_else(|| {
            trimmed
                .rsplit(',')
                .next()
                .map(str::trim)
                .and_then(|city| self.cities.get(city).copied())
        })
    }

    /// Map widget settings, including the access token from the environment.
    pub fn map(&self) -> &MapSettings {
        &self.map
    }

    /// Sessions seeded into the in-memory identity provider.
    pub fn dev_users(&self) -> &[DevUser] {
        &self.dev_users
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            sports: default_sports(),
            cities: default_cities(),
            map: MapSettings::default(),
            dev_users: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    sports: Option<Vec<String>>,
    cities: Option<IndexMap<String, RawCoordinates>>,
    map: Option<RawMap>,
    #[serde(default)]
    dev_users: Vec<RawDevUser>,
}

#[derive(Debug, Deserialize)]
struct RawCoordinates {
    lat: f64,
    lng: f64,
}

impl From<RawCoordinates> for Coordinates {
    fn from(value: RawCoordinates) -> Self {
        Self {
            lat: value.lat,
            lng: value.lng,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawMap {
    style: Option<String>,
    center: Option<RawCoordinates>,
    zoom: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawDevUser {
    token: String,
    id: Uuid,
    email: Option<String>,
    display_name: Option<String>,
    avatar_url: Option<String>,
}

impl From<RawDevUser> for DevUser {
    fn from(value: RawDevUser) -> Self {
        Self {
            token: value.token,
            identity: Identity {
                id: value.id,
                email: value.email,
                display_name: value.display_name,
                avatar_url: value.avatar_url,
            },
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = MapSettings::default();
        let map = match value.map {
            Some(raw) => MapSettings {
                access_token: None,
                style: raw.style.unwrap_or(defaults.style),
                center: raw.center.map(Into::into).unwrap_or(defaults.center),
                zoom: raw.zoom.unwrap_or(defaults.zoom),
            },
            None => defaults,
        };

        Self {
            sports: value.sports.unwrap_or_else(default_sports),
            cities: value
                .cities
                .map(|cities| {
                    cities
                        .into_iter()
                        .map(|(name, coords)| (name, coords.into()))
                        .collect()
                })
                .unwrap_or_else(default_cities),
            map,
            dev_users: value.dev_users.into_iter().map(Into::into).collect(),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

fn default_sports() -> Vec<String> {
    [
        "Basketball",
        "Soccer",
        "Tennis",
        "Volleyball",
        "Badminton",
        "Cricket",
        "Baseball",
        "Football",
        "Hockey",
        "Table Tennis",
        "Running",
        "Cycling",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

/// Built-in geocoding table shipped with the binary.
fn default_cities() -> IndexMap<String, Coordinates> {
    [
        ("San Francisco", 37.7749, -122.4194),
        ("Los Angeles", 34.0522, -118.2437),
        ("New York City", 40.7128, -74.0060),
        ("Buffalo", 42.8864, -78.8784),
        ("Houston", 29.7604, -95.3698),
        ("Austin", 30.2672, -97.7431),
        ("Mumbai", 19.0760, 72.8777),
        ("Pune", 18.5204, 73.8567),
        ("New Delhi", 28.6139, 77.2090),
        ("North West Delhi", 28.7041, 77.1025),
        ("Bangalore", 12.9716, 77.5946),
        ("Mysore", 12.2958, 76.6394),
    ]
    .into_iter()
    .map(|(name, lat, lng)| (name.to_string(), Coordinates { lat, lng }))
    .collect()
}

//! Application configuration loaded from environment variables.

use crate::services::tracker::DEFAULT_DISTANCE_FILTER_METERS;
use std::env;
use std::path::PathBuf;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Firebase Web API key used by the identity provider
    pub firebase_api_key: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// SQLite file for the on-device store
    pub local_db_path: PathBuf,
    /// Minimum distance between delivered fixes, in meters
    pub distance_filter_meters: f64,
    /// Firebase Auth emulator `host:port`, if set
    pub auth_emulator_host: Option<String>,
    /// GeoJSON track replayed by the headless driver
    pub track_replay_path: Option<PathBuf>,
}

impl Default for Config {
    /// Default config for testing only.
    fn default() -> Self {
        Self {
            firebase_api_key: "test_api_key".to_string(),
            gcp_project_id: "test-project".to_string(),
            local_db_path: PathBuf::from(":memory:"),
            distance_filter_meters: DEFAULT_DISTANCE_FILTER_METERS,
            auth_emulator_host: None,
            track_replay_path: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let distance_filter_meters = match env::var("DISTANCE_FILTER_METERS") {
            Ok(raw) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|d| d.is_finite() && *d >= 0.0)
                .ok_or(ConfigError::Invalid("DISTANCE_FILTER_METERS", raw))?,
            Err(_) => DEFAULT_DISTANCE_FILTER_METERS,
        };

        Ok(Self {
            firebase_api_key: env::var("FIREBASE_API_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("FIREBASE_API_KEY"))?,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            local_db_path: env::var("LOCAL_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("location_sync.db")),
            distance_filter_meters,
            auth_emulator_host: env::var("FIREBASE_AUTH_EMULATOR_HOST").ok(),
            track_replay_path: env::var("TRACK_REPLAY_PATH").ok().map(PathBuf::from),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

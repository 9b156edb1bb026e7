//! Server configuration — environment-driven with defaults matching
//! the original dashboard deployment.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::grid::GridConfig;

pub const APP_NAME: &str = "Clinboard";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get the application data directory (~/Clinboard on all platforms)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Clinboard")
}

/// Default tracing filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    "info,clinboard=debug".to_string()
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub shards_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub grid: GridConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: app_data_dir().join("clinic.db"),
            shards_dir: app_data_dir().join("blobs"),
            // The original dashboard served on port 5000
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            grid: GridConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Build the config from `CLINBOARD_*` environment variables,
    /// falling back to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(path) = std::env::var("CLINBOARD_DB") {
            config.db_path = PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("CLINBOARD_SHARDS") {
            config.shards_dir = PathBuf::from(path);
        }
        if let Some(addr) = env_parse::<SocketAddr>("CLINBOARD_ADDR") {
            config.bind_addr = addr;
        }
        if let Some(hour) = env_parse::<u32>("CLINBOARD_HOUR_START") {
            config.grid.hour_start = hour;
        }
        if let Some(hour) = env_parse::<u32>("CLINBOARD_HOUR_END") {
            config.grid.hour_end = hour;
        }
        if let Some(px) = env_parse::<u32>("CLINBOARD_PIXELS_PER_HOUR") {
            config.grid.pixels_per_hour = px;
        }

        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

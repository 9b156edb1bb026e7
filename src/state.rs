//! Shared server state.
//!
//! Connections are acquired per request via `open_db` and dropped on
//! every exit path; no connection handle is held across requests.
//! Migrations run once at startup, not here.

use std::path::PathBuf;

use rusqlite::Connection;

use crate::config::ServerConfig;
use crate::db::{self, StoreError};
use crate::grid::GridConfig;

pub struct AppState {
    pub db_path: PathBuf,
    pub shards_dir: PathBuf,
    pub grid: GridConfig,
}

impl AppState {
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            db_path: config.db_path.clone(),
            shards_dir: config.shards_dir.clone(),
            grid: config.grid,
        }
    }

    /// Open a scoped connection for the current request.
    pub fn open_db(&self) -> Result<Connection, StoreError> {
        db::open_connection(&self.db_path)
    }
}

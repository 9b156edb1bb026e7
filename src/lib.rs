pub mod agenda;
pub mod api;
pub mod config;
pub mod db;
pub mod documents;
pub mod grid;
pub mod ledger;
pub mod period;
pub mod state;
pub mod status;

use tracing_subscriber::EnvFilter;

/// Initialize tracing from RUST_LOG, with a sensible default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

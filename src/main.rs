use std::sync::Arc;

use clinboard::api::router::build_router;
use clinboard::config::{self, ServerConfig};
use clinboard::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    clinboard::init_tracing();

    let server_config = ServerConfig::from_env();
    tracing::info!(
        "{} starting v{} — store at {}",
        config::APP_NAME,
        config::APP_VERSION,
        server_config.db_path.display()
    );

    if let Some(parent) = server_config.db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    // Migrations run once at startup; requests open their own scoped
    // connections afterwards.
    clinboard::db::open_database(&server_config.db_path)?;

    let state = Arc::new(AppState::new(&server_config));
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(server_config.bind_addr).await?;
    tracing::info!("Listening on http://{}", server_config.bind_addr);
    axum::serve(listener, router).await?;

    Ok(())
}

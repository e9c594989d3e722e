use anyhow::Context;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, fmt};

use event_slices::shell::config::Settings;
use event_slices::shell::http::router;
use event_slices::shell::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let settings = Settings::from_env()?;

    // In-memory state store for now
    let state = AppState::in_memory(settings.event_store_config());

    let app = router(state).layer(TraceLayer::new_for_http());

    tracing::info!(
        addr = %settings.bind_addr,
        mode = %settings.mode,
        store = %settings.store_name,
        "event store listening"
    );
    let listener = tokio::net::TcpListener::bind(settings.bind_addr)
        .await
        .with_context(|| format!("binding {}", settings.bind_addr))?;
    axum::serve(listener, app).await?;
    Ok(())
}

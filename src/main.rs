use anyhow::Context;
use nihongo_core::api::{app_router, ApiState};
use nihongo_core::app::App;
use nihongo_core::config::Config;
use nihongo_core::db::Db;
use std::sync::Arc;
use tokio::sync::Mutex;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env().context("Invalid configuration")?;
    log::info!(
        "Starting with database {} (adaptive intervals: {})",
        config.database_url,
        config.adaptive_intervals
    );

    let db = Db::new(&config.database_url)
        .await
        .context("Failed to open progress database")?;
    let store = db.load_all().await?;
    let app = App::new(store, &config);

    let state = ApiState {
        app: Arc::new(Mutex::new(app)),
        db: db.clone(),
    };

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    log::info!("Listening on http://{}", config.bind_addr);

    axum::serve(listener, app_router(state)).await?;
    db.close().await;

    Ok(())
}

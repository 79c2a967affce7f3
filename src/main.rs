use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;

use spaced_review::{
    config::AppConfig,
    data::{
        db::{build_pool, run_schema},
        repositories::SqliteReviewRepository,
    },
    features::scheduler::ReviewScheduler,
    handlers::{app_router, AppState},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    // Database configuration
    let pool = build_pool(&config.database_url, config.pool_size)
        .with_context(|| format!("Failed to create DB pool for {}", config.database_url))?;
    run_schema(&pool).context("Failed to prepare database schema")?;

    let scheduler = ReviewScheduler::new(Arc::new(SqliteReviewRepository::new(pool)));
    let profile = scheduler
        .register_spacing_profile(&config.default_profile)
        .context("Failed to register default spacing profile")?;
    log::info!(
        "Default spacing profile {} (id {}): {:?}h, ease {}",
        profile.name,
        profile.id,
        profile.intervals,
        profile.ease_factor
    );

    let app = app_router(AppState { scheduler }, config.session_expiry());

    // Start server
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to address {}", config.bind_addr))?;

    log::info!("Server running on http://{}", config.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

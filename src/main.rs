use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

mod app;
mod auth;
mod cache;
mod config;
mod error;
mod state;
mod users;

use crate::{cache::RedisProfileCache, config::AppConfig, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "accounts=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = Arc::new(AppConfig::from_env()?);
    if config.jwt.uses_fallback_secret() {
        tracing::warn!("SECRET_KEY is not set; signing tokens with the built-in fallback secret");
    }
    tracing::info!(ttl_days = config.jwt.ttl_days, "session token lifetime");

    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run migrations")?;

    let cache = RedisProfileCache::connect(&config.redis_url()).await?;

    let state = AppState::from_parts(config.clone(), db.clone(), Arc::new(cache));
    let router = app::build_app(state);

    app::serve(router, &config.host, config.port).await?;

    db.close().await;
    tracing::info!("shut down cleanly");
    Ok(())
}

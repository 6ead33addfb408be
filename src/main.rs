use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use news_api_rust::app::{app, AppState};
use news_api_rust::auth::MemoryConfirmationCodes;
use news_api_rust::config::AppConfig;
use news_api_rust::database::{CredentialStore, DatabaseManager, MemoryCredentialStore, PgCredentialStore};
use news_api_rust::mail;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, SECRET_KEY, etc.
    let _ = dotenvy::dotenv();

    let config = AppConfig::from_env();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    config.validate().context("invalid configuration")?;
    tracing::info!("Starting News API in {:?} mode", config.environment);

    let store = credential_store(&config).await?;
    let mailer = mail::from_config(&config.mail).context("configuring mail transport")?;
    let codes = Arc::new(MemoryConfirmationCodes::new());

    let port = config.server.port;
    let state = AppState::new(config, store, codes, mailer).context("configuring token issuer")?;

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!("News API listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

/// Postgres when `DATABASE_URL` is set; the in-memory store only in development.
async fn credential_store(config: &AppConfig) -> anyhow::Result<Arc<dyn CredentialStore>> {
    if config.database.url.is_none() && config.is_development() {
        tracing::warn!("DATABASE_URL not set, using in-memory credential store");
        return Ok(Arc::new(MemoryCredentialStore::new()));
    }

    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("connecting to database")?;
    let store = PgCredentialStore::new(pool);
    store.ensure_schema().await.context("creating schema")?;
    Ok(Arc::new(store))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    tracing::info!("Shutdown signal received");
}

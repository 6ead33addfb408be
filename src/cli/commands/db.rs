use anyhow::Context;
use chrono::Utc;
use serde_json::json;

use crate::cli::{utils::output_success, OutputFormat};
use crate::config::AppConfig;
use crate::database::{CredentialStore, DatabaseManager, PgCredentialStore};

async fn connect(config: &AppConfig) -> anyhow::Result<PgCredentialStore> {
    let pool = DatabaseManager::connect(&config.database)
        .await
        .context("connecting to DATABASE_URL")?;
    Ok(PgCredentialStore::new(pool))
}

pub async fn schema(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = connect(config).await?;
    store.ensure_schema().await.context("creating tables")?;
    output_success(output_format, "Schema is up to date", None)
}

pub async fn reap_sessions(config: &AppConfig, output_format: OutputFormat) -> anyhow::Result<()> {
    let store = connect(config).await?;
    let removed = store
        .delete_expired_sessions(Utc::now())
        .await
        .context("deleting expired sessions")?;
    output_success(
        output_format,
        &format!("Removed {removed} expired session(s)"),
        Some(json!({ "removed": removed })),
    )
}

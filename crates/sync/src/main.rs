//! Bulk grant sync.
//!
//! Reconciles every active user's grants against the configured screen
//! registry and role templates, then prints the summary as JSON.
//!
//! Flags: `--migrate` applies the schema migrations first.

use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use screengate_core::UserId;
use screengate_infra::{
    EngineConfig, PermissionService, PostgresPermissionStore, PostgresUserDirectory,
    TracingAuditSink,
};

/// Actor recorded on audit entries produced by this tool.
const ACTOR_ENV: &str = "SCREENGATE_SYNC_ACTOR";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    screengate_observability::init();

    let config = EngineConfig::from_env()?;
    let registry = Arc::new(config.load_registry()?);
    let templates = Arc::new(config.load_templates(&registry)?);
    let actor = match std::env::var(ACTOR_ENV) {
        Ok(raw) => raw
            .parse::<UserId>()
            .with_context(|| format!("{ACTOR_ENV} is not a valid user id"))?,
        Err(_) => UserId::from_uuid(uuid::Uuid::nil()),
    };

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(config.require_database_url()?)
        .await
        .context("failed to connect to Postgres")?;

    let store = PostgresPermissionStore::new(pool.clone());
    if std::env::args().any(|arg| arg == "--migrate") {
        store.migrate().await?;
        tracing::info!("migrations applied");
    }

    tracing::info!(
        screens = registry.len(),
        templates = templates.len(),
        actor = %actor,
        "starting bulk sync"
    );

    let service = PermissionService::new(
        store,
        TracingAuditSink,
        PostgresUserDirectory::new(pool),
        registry,
        templates,
    );
    let summary = tokio::task::spawn_blocking(move || service.sync_all_users(actor))
        .await
        .context("sync task panicked")??;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    if !summary.failed.is_empty() {
        anyhow::bail!("{} user(s) failed to sync", summary.failed.len());
    }
    Ok(())
}

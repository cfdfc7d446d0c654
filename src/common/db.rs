use anyhow::{Context, Result};
use diesel::{Connection, PgConnection};
use diesel_async::{
    AsyncPgConnection,
    pooled_connection::{AsyncDieselConnectionManager, bb8},
};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness};

use crate::common::config::DatabaseConfig;

pub type DbPool = bb8::Pool<AsyncPgConnection>;

pub async fn create_pool(config: &DatabaseConfig) -> Result<DbPool> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.url);
    bb8::Pool::builder()
        .max_size(config.max_connections)
        .build(manager)
        .await
        .context("Failed to build the DB connection pool")
}

/// Runs pending migrations on a blocking thread, since the migration harness
/// needs a synchronous connection. Returns how many migrations were applied.
pub async fn run_migrations_blocking(
    migrations: EmbeddedMigrations,
    database_url: &str,
) -> Result<usize> {
    let database_url = database_url.to_string();
    tokio::task::spawn_blocking(move || {
        let mut conn = PgConnection::establish(&database_url)
            .context("Failed to connect for migrations")?;
        let applied = conn
            .run_pending_migrations(migrations)
            .map_err(|err| anyhow::anyhow!(err))
            .context("Failed to run migrations")?;
        Ok(applied.len())
    })
    .await
    .context("Migration task panicked")?
}

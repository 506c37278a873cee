use std::sync::Arc;

use anyhow::Result;
use bitsync_types::DbPool;
use diesel::{Connection, PgConnection};
use diesel_async::pooled_connection::bb8::Pool;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::AsyncPgConnection;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../../migrations");

const DEFAULT_POOL_SIZE: u32 = 10;

pub async fn new_db_pool(database_url: &str, pool_size: Option<u32>) -> Result<Arc<DbPool>> {
    let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
    let pool =
        Pool::builder().max_size(pool_size.unwrap_or(DEFAULT_POOL_SIZE)).build(manager).await?;
    Ok(Arc::new(pool))
}

/// Bring the schema up to date before the first cycle. Runs over a plain
/// libpq connection; migrations are a startup-only concern.
pub fn run_pending_migrations(database_url: &str) -> Result<()> {
    tracing::info!("running pending migrations");
    let mut conn = PgConnection::establish(database_url)?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|err| anyhow::anyhow!("migrations failed: {err}"))?;
    Ok(())
}
